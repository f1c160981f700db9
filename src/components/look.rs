//! Avatar appearance selection.

use serde::{Deserialize, Serialize};

use crate::pipeline::catalog::{HEAD_IMAGE, TORSO_IMAGE};

/// Which catalog entry each customizable slot shows.
///
/// Indices wrap through the catalog, so any integer is a valid choice.
/// `None` means "leave the slot as it is".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarLook {
    #[serde(default, alias = "headTex", skip_serializing_if = "Option::is_none")]
    pub head_index: Option<i64>,
    #[serde(default, alias = "torsoTex", skip_serializing_if = "Option::is_none")]
    pub torso_index: Option<i64>,
}

impl AvatarLook {
    pub fn head(index: i64) -> Self {
        Self {
            head_index: Some(index),
            torso_index: None,
        }
    }

    pub fn torso(index: i64) -> Self {
        Self {
            head_index: None,
            torso_index: Some(index),
        }
    }

    pub fn with_torso(mut self, index: i64) -> Self {
        self.torso_index = Some(index);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.head_index.is_none() && self.torso_index.is_none()
    }

    /// Overwrite the fields `other` specifies, keep the rest.
    pub fn merge(&mut self, other: &AvatarLook) {
        if let Some(h) = other.head_index {
            self.head_index = Some(h);
        }
        if let Some(t) = other.torso_index {
            self.torso_index = Some(t);
        }
    }

    /// Image property bindings in application order: head, then torso.
    pub fn bindings(&self) -> impl Iterator<Item = (&'static str, i64)> {
        self.head_index
            .map(|i| (HEAD_IMAGE, i))
            .into_iter()
            .chain(self.torso_index.map(|i| (TORSO_IMAGE, i)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_unspecified_fields() {
        let mut look = AvatarLook::head(2);
        look.merge(&AvatarLook::torso(1));
        assert_eq!(look, AvatarLook::head(2).with_torso(1));

        look.merge(&AvatarLook::head(5));
        assert_eq!(look, AvatarLook::head(5).with_torso(1));

        look.merge(&AvatarLook::default());
        assert_eq!(look, AvatarLook::head(5).with_torso(1));
    }

    #[test]
    fn test_bindings_order() {
        let look = AvatarLook::head(3).with_torso(-1);
        let b: Vec<_> = look.bindings().collect();
        assert_eq!(b, vec![(HEAD_IMAGE, 3), (TORSO_IMAGE, -1)]);
        assert_eq!(AvatarLook::default().bindings().count(), 0);
        assert!(AvatarLook::default().is_empty());
    }

    #[test]
    fn test_deserialize_accepts_both_key_styles() {
        let a: AvatarLook = serde_json::from_str(r#"{"headIndex":1,"torsoIndex":2}"#).unwrap();
        let b: AvatarLook = serde_json::from_str(r#"{"headTex":1,"torsoTex":2}"#).unwrap();
        assert_eq!(a, b);
        let c: AvatarLook = serde_json::from_str(r#"{"torsoTex":4}"#).unwrap();
        assert_eq!(c, AvatarLook::torso(4));
    }
}
