//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers, one module per operation family
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! - `POST /generate`: text-to-image, result saved to the output directory
//! - `POST /inpaint`: masked image editing, result saved to the output directory
//! - `POST /judge`: image classification of a raw binary body
//! - `POST /summarize`: text summarization
//!
//! OpenAPI documentation is served at `/docs` when the server is running.

pub mod handlers;
pub mod models;
