//! Core download orchestration

pub mod batch;
pub mod formats;
pub mod item;
pub mod playlist;
pub mod process;
pub mod progress;
pub mod retry;

#[cfg(all(test, unix))]
pub(crate) mod fake_tool;
