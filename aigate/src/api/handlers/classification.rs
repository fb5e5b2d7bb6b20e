//! HTTP handler for image classification.

use axum::{Json, body::Bytes, extract::State};

use crate::{
    AppState,
    api::models::classification::{ClassificationResponse, UpstreamClassification},
    errors::Result,
    operations::Operation,
};

#[utoipa::path(
    post,
    path = "/judge",
    tag = "classification",
    summary = "Classify image",
    description = "Classify the raw binary image sent as the request body. Returns the predicted labels with their scores.",
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Image classified", body = ClassificationResponse),
        (status = 400, description = "Empty request body"),
        (status = 500, description = "Inference API failure"),
    )
)]
#[tracing::instrument(skip_all, fields(size = body.len()))]
pub async fn judge(State(state): State<AppState>, body: Bytes) -> Result<Json<ClassificationResponse>> {
    let upstream_request = state.request_builder.build(&Operation::Classify(body))?;
    let response = state.upstream.send(upstream_request).await?;
    let classification: UpstreamClassification = response.json()?;

    Ok(Json(ClassificationResponse {
        success: true,
        result: classification.result,
    }))
}
