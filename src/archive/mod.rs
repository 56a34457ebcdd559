//! 冷热分区归档
//!
//! 周期性地把超过保留期的点击从热分区移动到冷分区。

mod task;

pub use task::{ArchivalTask, ArchiveReport};
