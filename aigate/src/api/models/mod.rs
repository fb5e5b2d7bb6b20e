//! Request and response bodies of the public HTTP API.

pub mod classification;
pub mod images;
pub mod summaries;
