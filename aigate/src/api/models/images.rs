use bytes::Bytes;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::operations::{GenerateParams, InpaintParams};

/// Request payload for text-to-image generation.
///
/// Only `prompt` is required; every other field falls back to the server's configured default.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Description of the image to generate
    pub prompt: Option<String>,
    /// Things the image should avoid
    pub negative_prompt: Option<String>,
    pub height: Option<u32>,
    pub width: Option<u32>,
    /// Number of diffusion steps
    pub num_steps: Option<u32>,
    /// How closely the image follows the prompt
    pub guidance: Option<f32>,
    /// Also return the generated image as base64 in `image_b64`
    #[serde(default)]
    pub include_image: bool,
}

impl From<&GenerateRequest> for GenerateParams {
    fn from(req: &GenerateRequest) -> Self {
        GenerateParams {
            prompt: req.prompt.clone(),
            negative_prompt: req.negative_prompt.clone(),
            height: req.height,
            width: req.width,
            num_steps: req.num_steps,
            guidance: req.guidance,
        }
    }
}

/// Request payload for inpainting.
///
/// `image_b64` and `mask_b64` are optional; when omitted the configured default assets are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InpaintRequest {
    /// Description of what to paint into the masked area
    pub prompt: Option<String>,
    /// Source image, base64 encoded
    #[serde(rename = "image_b64")]
    pub image_b64: Option<String>,
    /// Mask image, base64 encoded. White areas are repainted.
    #[serde(rename = "mask_b64")]
    pub mask_b64: Option<String>,
    pub height: Option<u32>,
    pub width: Option<u32>,
    pub num_steps: Option<u32>,
    pub guidance: Option<f32>,
    /// How strongly the masked area is transformed (0.0 - 1.0)
    pub strength: Option<f32>,
    /// Random seed for reproducible output
    pub seed: Option<u64>,
}

impl InpaintRequest {
    /// Combine the request with already-resolved image and mask bytes.
    pub fn into_params(self, image: Bytes, mask: Bytes) -> InpaintParams {
        InpaintParams {
            prompt: self.prompt,
            image,
            mask,
            height: self.height,
            width: self.width,
            num_steps: self.num_steps,
            guidance: self.guidance,
            strength: self.strength,
            seed: self.seed,
        }
    }
}

/// Successful image operation: where the result was saved.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImageResponse {
    pub success: bool,
    /// Path of the saved PNG file
    pub path: String,
    /// Base64 encoded image, only present when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_b64: Option<String>,
}
