//! API Module
//!
//! HTTP handlers and routing for the resize gateway.
//!
//! # Endpoints
//! - `POST /api/resize` - Resize an image, served from cache when possible
//! - `GET /stats` - Cache statistics and gateway counters
//! - `GET /health` - Health check endpoint

pub mod client;
pub mod handlers;
pub mod routes;

pub use client::ClientId;
pub use handlers::*;
pub use routes::create_router;
