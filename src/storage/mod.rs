//! Storage modules: config and manifests

pub mod config;
pub mod manifest;
