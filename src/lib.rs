//! yt-batch library
//!
//! Core functionality for the yt-batch CLI.

pub mod core;
pub mod error;
pub mod storage;
pub mod types;
pub mod ui;
pub mod utils;
