//! HTTP handler for text summarization.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use super::json_body;
use crate::{
    AppState,
    api::models::summaries::{SummarizeRequest, SummaryResponse, UpstreamSummary, clean_summary},
    errors::BareError,
    operations::Operation,
};

#[utoipa::path(
    post,
    path = "/summarize",
    tag = "text",
    summary = "Summarize text",
    description = "Summarize the given text. Newlines in the summary are replaced with spaces.",
    request_body = SummarizeRequest,
    responses(
        (status = 200, description = "Text summarized", body = SummaryResponse),
        (status = 400, description = "Missing text"),
        (status = 500, description = "Inference API failure"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn summarize(
    State(state): State<AppState>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<SummaryResponse>, BareError> {
    let request = json_body(payload)?;

    let upstream_request = state.request_builder.build(&Operation::Summarize(request.into()))?;
    let response = state.upstream.send(upstream_request).await?;
    let summary: UpstreamSummary = response.json()?;

    Ok(Json(SummaryResponse {
        summary: clean_summary(&summary.result.summary),
    }))
}
