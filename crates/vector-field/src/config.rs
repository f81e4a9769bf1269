//! Configuration for the field builder.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::OVERLAY_ALPHA;

/// Time slicing and overlay settings for [`build_field`](crate::build_field).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BuilderConfig {
    /// Work budget per batch of columns before the builder yields.
    pub max_task_time_ms: u64,

    /// Pause between batches.
    pub min_sleep_time_ms: u64,

    /// Alpha of the overlay colors written into the mask.
    pub overlay_alpha: u8,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            max_task_time_ms: 100,
            min_sleep_time_ms: 25,
            overlay_alpha: OVERLAY_ALPHA,
        }
    }
}

impl BuilderConfig {
    pub fn max_task_time(&self) -> Duration {
        Duration::from_millis(self.max_task_time_ms)
    }

    pub fn min_sleep_time(&self) -> Duration {
        Duration::from_millis(self.min_sleep_time_ms)
    }
}
