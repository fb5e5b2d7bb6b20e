//! HTTP request handlers for all API endpoints.
//!
//! Each handler walks the same linear pipeline: resolve assets (inpaint only), build the
//! upstream request, send it, persist image results, then respond. The first failing stage
//! short-circuits the rest and is rendered through [`crate::errors::Error`]'s `IntoResponse`.
//!
//! # Handler Modules
//!
//! - [`classification`]: `POST /judge`
//! - [`images`]: `POST /generate` and `POST /inpaint`
//! - [`summaries`]: `POST /summarize`

pub mod classification;
pub mod images;
pub mod summaries;

use axum::{Json, extract::rejection::JsonRejection};

use crate::errors::Error;

/// Unwraps a JSON body, reporting malformed payloads as invalid parameters.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Error> {
    payload.map(|Json(body)| body).map_err(|rejection| Error::invalid_params(rejection.body_text()))
}
