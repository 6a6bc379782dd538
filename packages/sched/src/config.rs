//! Scheduler configuration.

use serde::{Deserialize, Serialize};

/// Configuration for a [`MainScheduler`](crate::MainScheduler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MainSchedulerConfig {
    /// Name given to the worker thread.
    pub thread_name: String,

    /// Stack size of the worker thread in bytes. `None` keeps the platform default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_size: Option<usize>,
}

impl Default for MainSchedulerConfig {
    fn default() -> Self {
        Self {
            thread_name: "strand-main".to_string(),
            stack_size: None,
        }
    }
}

/// Configuration for a [`BackgroundScheduler`](crate::BackgroundScheduler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundSchedulerConfig {
    /// Name given to every task thread.
    pub thread_name: String,

    /// Stack size of each task thread in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_size: Option<usize>,
}

impl Default for BackgroundSchedulerConfig {
    fn default() -> Self {
        Self {
            thread_name: "strand-bg".to_string(),
            stack_size: None,
        }
    }
}

pub(crate) fn thread_builder(name: &str, stack_size: Option<usize>) -> std::thread::Builder {
    let builder = std::thread::Builder::new().name(name.to_string());
    match stack_size {
        Some(size) => builder.stack_size(size),
        None => builder,
    }
}
