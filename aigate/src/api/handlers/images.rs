//! HTTP handlers for image-producing operations.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::info;

use super::json_body;
use crate::{
    AppState,
    api::models::images::{GenerateRequest, ImageResponse, InpaintRequest},
    codec::to_base64,
    errors::Result,
    operations::{GenerateParams, Operation, require_prompt},
};

#[utoipa::path(
    post,
    path = "/generate",
    tag = "images",
    summary = "Generate image",
    description = "Generate an image from a text prompt. The result is saved as a PNG in the output directory and its path is returned.",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Image generated and saved", body = ImageResponse),
        (status = 400, description = "Missing prompt or malformed request"),
        (status = 500, description = "Inference API failure or image could not be saved"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn generate(
    State(state): State<AppState>,
    payload: std::result::Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<ImageResponse>> {
    let request = json_body(payload)?;
    let operation = Operation::Generate(GenerateParams::from(&request));

    let upstream_request = state.request_builder.build(&operation)?;
    let response = state.upstream.send(upstream_request).await?;
    let artifact = state.artifacts.persist(operation.kind(), &response.body).await?;
    info!("Generated image {}", artifact.filename);

    Ok(Json(ImageResponse {
        success: true,
        path: artifact.path.display().to_string(),
        image_b64: request.include_image.then(|| to_base64(&response.body)),
    }))
}

#[utoipa::path(
    post,
    path = "/inpaint",
    tag = "images",
    summary = "Inpaint image",
    description = "Repaint the masked area of an image according to a prompt. When `image_b64` or `mask_b64` are omitted, \
the configured default assets are used. The result is saved as a PNG in the output directory.",
    request_body = InpaintRequest,
    responses(
        (status = 200, description = "Image inpainted and saved", body = ImageResponse),
        (status = 400, description = "Missing prompt, invalid base64 or unavailable default asset"),
        (status = 500, description = "Inference API failure or image could not be saved"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn inpaint(
    State(state): State<AppState>,
    payload: std::result::Result<Json<InpaintRequest>, JsonRejection>,
) -> Result<Json<ImageResponse>> {
    let request = json_body(payload)?;

    // Reject before touching the filesystem or network for default assets
    require_prompt(request.prompt.as_deref())?;

    let assets = &state.config.assets;
    let image = state.assets.resolve_default(request.image_b64.as_deref(), &assets.image).await?;
    let mask = state.assets.resolve_default(request.mask_b64.as_deref(), &assets.mask).await?;

    let operation = Operation::Inpaint(request.into_params(image, mask));
    let upstream_request = state.request_builder.build(&operation)?;
    let response = state.upstream.send(upstream_request).await?;
    let artifact = state.artifacts.persist(operation.kind(), &response.body).await?;
    info!("Inpainted image {}", artifact.filename);

    Ok(Json(ImageResponse {
        success: true,
        path: artifact.path.display().to_string(),
        image_b64: None,
    }))
}
