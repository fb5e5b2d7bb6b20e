use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::operations::SummarizeParams;

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeRequest {
    /// Text to summarize
    pub text: Option<String>,
    /// Maximum summary length in tokens (default 1024)
    pub max_length: Option<u32>,
}

impl From<SummarizeRequest> for SummarizeParams {
    fn from(req: SummarizeRequest) -> Self {
        SummarizeParams {
            text: req.text,
            max_length: req.max_length,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamSummary {
    pub result: UpstreamSummaryResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamSummaryResult {
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SummaryResponse {
    pub summary: String,
}

/// Flattens a summary onto one line: newlines become spaces and the ends are trimmed.
pub fn clean_summary(summary: &str) -> String {
    summary.replace('\n', " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_summary() {
        assert_eq!(clean_summary("A\nB"), "A B");
        assert_eq!(clean_summary("\n  First.\nSecond.\n"), "First. Second.");
        assert_eq!(clean_summary(""), "");
    }
}
