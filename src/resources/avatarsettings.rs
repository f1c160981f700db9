use bevy_ecs::prelude::Resource;

use crate::components::overlay::ImageRequestPolicy;
use crate::resources::gameconfig::GameConfig;
use crate::runtime::AnimationSource;

/// What every newly spawned avatar loads and how it sequences image requests.
#[derive(Resource, Debug, Clone, Default)]
pub struct AvatarSettings {
    pub source: AnimationSource,
    pub policy: ImageRequestPolicy,
}

impl AvatarSettings {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            source: config.animation.clone(),
            policy: if config.latest_request_wins {
                ImageRequestPolicy::LatestRequestWins
            } else {
                ImageRequestPolicy::LastCompletionWins
            },
        }
    }
}
