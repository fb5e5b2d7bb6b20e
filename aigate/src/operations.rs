//! Translation of inbound operations into inference API requests.
//!
//! An [`Operation`] describes one of the four supported AI operations together with the
//! parameters the caller supplied. [`RequestBuilder::build`] turns it into an
//! [`UpstreamRequest`] using the configured model endpoints and parameter defaults. Building is
//! a pure transformation: it performs no I/O, and required fields are validated before anything
//! is constructed.

use bytes::Bytes;
use serde::Serialize;
use std::fmt;

use crate::config::{GenerationDefaults, ModelsConfig};
use crate::errors::{Error, Result};

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Generate,
    Classify,
    Summarize,
    Inpaint,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Generate => "generate",
            OperationKind::Classify => "classify",
            OperationKind::Summarize => "summarize",
            OperationKind::Inpaint => "inpaint",
        }
    }

    /// Filename prefix for artifacts produced by this kind of operation, `None` for kinds
    /// whose result is returned inline and never saved.
    pub fn artifact_prefix(&self) -> Option<&'static str> {
        match self {
            OperationKind::Generate => Some("generated"),
            OperationKind::Inpaint => Some("inpainted"),
            OperationKind::Classify | OperationKind::Summarize => None,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied text-to-image parameters. Unset fields fall back to configured defaults.
#[derive(Debug, Clone, Default)]
pub struct GenerateParams {
    pub prompt: Option<String>,
    pub negative_prompt: Option<String>,
    pub height: Option<u32>,
    pub width: Option<u32>,
    pub num_steps: Option<u32>,
    pub guidance: Option<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct SummarizeParams {
    pub text: Option<String>,
    pub max_length: Option<u32>,
}

/// Inpainting parameters. `image` and `mask` are already resolved to raw bytes.
#[derive(Debug, Clone, Default)]
pub struct InpaintParams {
    pub prompt: Option<String>,
    pub image: Bytes,
    pub mask: Bytes,
    pub height: Option<u32>,
    pub width: Option<u32>,
    pub num_steps: Option<u32>,
    pub guidance: Option<f32>,
    pub strength: Option<f32>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone)]
pub enum Operation {
    Generate(GenerateParams),
    Classify(Bytes),
    Summarize(SummarizeParams),
    Inpaint(InpaintParams),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Generate(_) => OperationKind::Generate,
            Operation::Classify(_) => OperationKind::Classify,
            Operation::Summarize(_) => OperationKind::Summarize,
            Operation::Inpaint(_) => OperationKind::Inpaint,
        }
    }
}

/// Body of an inference API call. The content type follows from the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamBody {
    Json(serde_json::Value),
    Binary(Bytes),
}

impl UpstreamBody {
    pub fn content_type(&self) -> &'static str {
        match self {
            UpstreamBody::Json(_) => CONTENT_TYPE_JSON,
            UpstreamBody::Binary(_) => CONTENT_TYPE_OCTET_STREAM,
        }
    }

    pub fn into_bytes(self) -> Result<Bytes> {
        match self {
            UpstreamBody::Json(value) => Ok(Bytes::from(serde_json::to_vec(&value).map_err(anyhow::Error::from)?)),
            UpstreamBody::Binary(bytes) => Ok(bytes),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    pub kind: OperationKind,
    /// Model path appended to the base URL, e.g. `/@cf/microsoft/resnet-50`
    pub endpoint: String,
    pub body: UpstreamBody,
}

impl UpstreamRequest {
    pub fn content_type(&self) -> &'static str {
        self.body.content_type()
    }
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    prompt: &'a str,
    negative_prompt: &'a str,
    height: u32,
    width: u32,
    num_steps: u32,
    guidance: f32,
}

#[derive(Serialize)]
struct SummarizeBody<'a> {
    input_text: &'a str,
    max_length: u32,
}

#[derive(Serialize)]
struct InpaintBody<'a> {
    prompt: &'a str,
    image: &'a [u8],
    mask: &'a [u8],
    height: u32,
    width: u32,
    num_steps: u32,
    guidance: f32,
    strength: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

/// Returns a required text field as sent, or `InvalidParams` naming it when missing or blank.
pub fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::invalid_params(format!("{name} is required"))),
    }
}

pub fn require_prompt(prompt: Option<&str>) -> Result<&str> {
    required(prompt, "Prompt")
}

/// Builds inference API requests from operations.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    models: ModelsConfig,
    defaults: GenerationDefaults,
}

impl RequestBuilder {
    pub fn new(models: ModelsConfig, defaults: GenerationDefaults) -> Self {
        Self { models, defaults }
    }

    pub fn build(&self, operation: &Operation) -> Result<UpstreamRequest> {
        let kind = operation.kind();
        let (endpoint, body) = match operation {
            Operation::Generate(params) => (&self.models.generate, self.generate_body(params)?),
            Operation::Classify(image) => {
                if image.is_empty() {
                    return Err(Error::invalid_params("Image data is required"));
                }
                (&self.models.classify, UpstreamBody::Binary(image.clone()))
            }
            Operation::Summarize(params) => (&self.models.summarize, self.summarize_body(params)?),
            Operation::Inpaint(params) => (&self.models.inpaint, self.inpaint_body(params)?),
        };

        Ok(UpstreamRequest {
            kind,
            endpoint: endpoint.clone(),
            body,
        })
    }

    fn generate_body(&self, params: &GenerateParams) -> Result<UpstreamBody> {
        let prompt = require_prompt(params.prompt.as_deref())?;
        let body = GenerateBody {
            prompt,
            negative_prompt: params.negative_prompt.as_deref().unwrap_or(&self.defaults.negative_prompt),
            height: params.height.unwrap_or(self.defaults.height),
            width: params.width.unwrap_or(self.defaults.width),
            num_steps: params.num_steps.unwrap_or(self.defaults.num_steps),
            guidance: params.guidance.unwrap_or(self.defaults.guidance),
        };
        to_json(&body)
    }

    fn summarize_body(&self, params: &SummarizeParams) -> Result<UpstreamBody> {
        let input_text = required(params.text.as_deref(), "Text")?;
        let body = SummarizeBody {
            input_text,
            max_length: params.max_length.filter(|n| *n > 0).unwrap_or(self.defaults.summary_max_length),
        };
        to_json(&body)
    }

    fn inpaint_body(&self, params: &InpaintParams) -> Result<UpstreamBody> {
        let prompt = require_prompt(params.prompt.as_deref())?;
        if params.image.is_empty() || params.mask.is_empty() {
            return Err(Error::invalid_params("Image and mask are required"));
        }
        let body = InpaintBody {
            prompt,
            image: &params.image,
            mask: &params.mask,
            height: params.height.unwrap_or(self.defaults.height),
            width: params.width.unwrap_or(self.defaults.width),
            num_steps: params.num_steps.unwrap_or(self.defaults.num_steps),
            guidance: params.guidance.unwrap_or(self.defaults.guidance),
            strength: params.strength.unwrap_or(self.defaults.strength),
            seed: params.seed,
        };
        to_json(&body)
    }
}

fn to_json<T: Serialize>(body: &T) -> Result<UpstreamBody> {
    Ok(UpstreamBody::Json(serde_json::to_value(body).map_err(anyhow::Error::from)?))
}
