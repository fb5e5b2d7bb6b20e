use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single label predicted for an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Classification {
    pub label: String,
    /// Confidence between 0 and 1
    pub score: f64,
}

/// Shape of the inference API's classification response.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamClassification {
    pub result: Vec<Classification>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClassificationResponse {
    pub success: bool,
    pub result: Vec<Classification>,
}
