use std::time::Duration;

use serde::{Deserialize, Serialize};

use multicluster_types::defaults::MAPPER_RECHECK_WINDOW_SECS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapperConfig {
    /// minimum time a failed lookup suppresses queries to the source
    #[serde(with = "humantime_serde")]
    pub recheck_window: Duration,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            recheck_window: Duration::from_secs(MAPPER_RECHECK_WINDOW_SECS),
        }
    }
}

impl MapperConfig {
    pub fn with_recheck_window(recheck_window: Duration) -> Self {
        Self { recheck_window }
    }
}
