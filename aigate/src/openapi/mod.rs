//! OpenAPI documentation for the public API.
//!
//! The document is served as JSON at `/openapi.json` and rendered with Scalar at `/docs`.

use utoipa::OpenApi;

use crate::api::{handlers, models};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "aigate",
        description = "Image generation, inpainting, classification and summarization backed by a hosted inference API."
    ),
    paths(
        handlers::images::generate,
        handlers::images::inpaint,
        handlers::classification::judge,
        handlers::summaries::summarize,
    ),
    components(schemas(
        models::images::GenerateRequest,
        models::images::InpaintRequest,
        models::images::ImageResponse,
        models::classification::Classification,
        models::classification::ClassificationResponse,
        models::summaries::SummarizeRequest,
        models::summaries::SummaryResponse,
    )),
    tags(
        (name = "images", description = "Text-to-image generation and inpainting"),
        (name = "classification", description = "Image classification"),
        (name = "text", description = "Text summarization"),
    )
)]
pub struct ApiDoc;
