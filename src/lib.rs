//! Resize Gateway - an image-resize request service
//!
//! Accepts an image plus target dimensions, deduplicates identical requests
//! through a content-addressed cache, enforces a per-client request budget,
//! and returns the resized image.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod gateway;
pub mod imaging;
pub mod models;
pub mod ratelimit;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use gateway::{ResizeGateway, ResizeRequest};
pub use tasks::spawn_cleanup_task;
