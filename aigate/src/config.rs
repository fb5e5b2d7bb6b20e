//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `AIGATE_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `AIGATE_` override YAML values
//! 3. **Account variables** - `CLOUDFLARE_ACCOUNT_ID`, `CLOUDFLARE_API_TOKEN` and `OUTPUT_DIRECTORY`
//!    override `upstream.account_id`, `upstream.api_token` and `output_dir` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `AIGATE_DEFAULTS__GUIDANCE=9.0` sets the `defaults.guidance` field.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use aigate::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}:{}", config.host, config.port);
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Credentials for the inference API
//! CLOUDFLARE_ACCOUNT_ID=0123456789abcdef
//! CLOUDFLARE_API_TOKEN=secret
//!
//! # Where generated images are written
//! OUTPUT_DIRECTORY=/var/lib/aigate/images
//!
//! # Override nested values
//! AIGATE_PORT=8080
//! AIGATE_DEFAULTS__NUM_STEPS=8
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use url::Url;

use crate::errors::Error;

/// Placeholder in `upstream.base_url` that is replaced with the account id.
pub const ACCOUNT_ID_PLACEHOLDER: &str = "{account_id}";

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "AIGATE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// Loaded once at startup and treated as read-only for the lifetime of the process.
/// All fields have defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Directory generated images are written to. Created on demand.
    pub output_dir: PathBuf,
    /// Inference API location and credentials
    pub upstream: UpstreamConfig,
    /// Model endpoint paths, relative to the upstream base URL
    pub models: ModelsConfig,
    /// Parameter defaults applied when a caller leaves them unset
    pub defaults: GenerationDefaults,
    /// Fallback sources for inpainting inputs
    pub assets: AssetsConfig,
    /// Request size limits
    pub limits: LimitsConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Enable Prometheus metrics endpoint at `/internal/metrics`
    pub enable_metrics: bool,
}

/// Location and credentials of the hosted inference API.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Base URL template. `{account_id}` is replaced with `account_id`.
    pub base_url: String,
    /// Account the inference API is scoped to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Bearer token sent with every inference call
    #[serde(skip_serializing)]
    pub api_token: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: format!("https://api.cloudflare.com/client/v4/accounts/{ACCOUNT_ID_PLACEHOLDER}/ai/run"),
            account_id: None,
            api_token: None,
        }
    }
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("account_id", &self.account_id)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl UpstreamConfig {
    /// The base URL with the account id substituted in.
    pub fn resolved_base_url(&self) -> Result<String, Error> {
        if !self.base_url.contains(ACCOUNT_ID_PLACEHOLDER) {
            return Ok(self.base_url.trim_end_matches('/').to_string());
        }
        match self.account_id.as_deref().filter(|id| !id.is_empty()) {
            Some(account_id) => Ok(self
                .base_url
                .replace(ACCOUNT_ID_PLACEHOLDER, account_id)
                .trim_end_matches('/')
                .to_string()),
            None => Err(Error::InvalidConfig {
                message: format!(
                    "upstream.base_url contains {ACCOUNT_ID_PLACEHOLDER} but no account id is configured. \
                     Set CLOUDFLARE_ACCOUNT_ID or upstream.account_id."
                ),
            }),
        }
    }
}

/// Endpoint path of each model, appended verbatim to the base URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelsConfig {
    pub generate: String,
    pub classify: String,
    pub summarize: String,
    pub inpaint: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            generate: "/@cf/lykon/dreamshaper-8-lcm".to_string(),
            classify: "/@cf/microsoft/resnet-50".to_string(),
            summarize: "/@cf/facebook/bart-large-cnn".to_string(),
            inpaint: "/@cf/runwayml/stable-diffusion-v1-5-inpainting".to_string(),
        }
    }
}

/// Values used when a request leaves a generation parameter unset.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationDefaults {
    pub negative_prompt: String,
    pub height: u32,
    pub width: u32,
    pub num_steps: u32,
    pub guidance: f32,
    /// Inpainting only: how strongly the masked area is transformed (0.0 - 1.0)
    pub strength: f32,
    /// Summaries: maximum length in tokens
    pub summary_max_length: u32,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            negative_prompt: "blurry, low quality".to_string(),
            height: 512,
            width: 512,
            num_steps: 20,
            guidance: 7.5,
            strength: 1.0,
            summary_max_length: 1024,
        }
    }
}

/// Where an asset comes from when the caller does not send one inline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AssetSource {
    /// Local file tried before the remote URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Remote fallback, fetched when neither inline data nor the local file is available
    pub url: Url,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    pub image: AssetSource,
    pub mask: AssetSource,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            image: AssetSource {
                path: None,
                url: Url::parse(
                    "https://raw.githubusercontent.com/CompVis/stable-diffusion/main/data/inpainting_examples/overture-creations-5sI6fQgYIuo.png",
                )
                .expect("default image URL is valid"),
            },
            mask: AssetSource {
                path: None,
                url: Url::parse(
                    "https://raw.githubusercontent.com/CompVis/stable-diffusion/main/data/inpainting_examples/overture-creations-5sI6fQgYIuo_mask.png",
                )
                .expect("default mask URL is valid"),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum accepted request body, in bytes
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// CORS origin, either `*` or an explicit URL.
#[derive(Debug, Clone, PartialEq)]
pub enum CorsOrigin {
    Wildcard,
    Url(Url),
}

impl Serialize for CorsOrigin {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CorsOrigin::Wildcard => serializer.serialize_str("*"),
            CorsOrigin::Url(url) => serializer.serialize_str(url.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for CorsOrigin {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        if value == "*" {
            return Ok(CorsOrigin::Wildcard);
        }
        Url::parse(&value).map(CorsOrigin::Url).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    pub allowed_origins: Vec<CorsOrigin>,
    pub allow_credentials: bool,
    /// Preflight cache duration in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![CorsOrigin::Wildcard],
            allow_credentials: false,
            max_age: Some(3600),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            output_dir: PathBuf::from("./generated_images"),
            upstream: UpstreamConfig::default(),
            models: ModelsConfig::default(),
            defaults: GenerationDefaults::default(),
            assets: AssetsConfig::default(),
            limits: LimitsConfig::default(),
            cors: CorsConfig::default(),
            enable_metrics: false,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |message: String| Err(Error::InvalidConfig { message });

        if self.upstream.api_token.as_deref().is_none_or(str::is_empty) {
            return invalid(
                "No API token configured. Set CLOUDFLARE_API_TOKEN or upstream.api_token in the config file.".to_string(),
            );
        }

        let base_url = self.upstream.resolved_base_url()?;
        if let Err(e) = Url::parse(&base_url) {
            return invalid(format!("upstream.base_url '{base_url}' is not a valid URL: {e}"));
        }

        for (name, path) in [
            ("generate", &self.models.generate),
            ("classify", &self.models.classify),
            ("summarize", &self.models.summarize),
            ("inpaint", &self.models.inpaint),
        ] {
            if !path.starts_with('/') {
                return invalid(format!("models.{name} must start with '/', got '{path}'"));
            }
        }

        let defaults = &self.defaults;
        if defaults.height == 0 || defaults.width == 0 {
            return invalid("defaults.height and defaults.width must be positive".to_string());
        }
        if defaults.num_steps == 0 {
            return invalid("defaults.num_steps must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&defaults.strength) {
            return invalid(format!("defaults.strength must be between 0.0 and 1.0, got {}", defaults.strength));
        }
        if defaults.summary_max_length == 0 {
            return invalid("defaults.summary_max_length must be positive".to_string());
        }

        if self.limits.max_body_bytes == 0 {
            return invalid("limits.max_body_bytes must be positive".to_string());
        }

        if self.cors.allowed_origins.is_empty() {
            return invalid("CORS allowed_origins cannot be empty. Add at least one allowed origin.".to_string());
        }
        let has_wildcard = self.cors.allowed_origins.iter().any(|origin| matches!(origin, CorsOrigin::Wildcard));
        if has_wildcard && self.cors.allow_credentials {
            return invalid("CORS cannot use wildcard origin '*' with allow_credentials=true. Specify explicit origins.".to_string());
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("AIGATE_").split("__").ignore(&["config"]))
            // Account-level variables shared with other tooling for the same account
            .merge(
                Env::raw()
                    .only(&["CLOUDFLARE_ACCOUNT_ID", "CLOUDFLARE_API_TOKEN", "OUTPUT_DIRECTORY"])
                    .map(|key| {
                        if key == "CLOUDFLARE_ACCOUNT_ID" {
                            "upstream.account_id".into()
                        } else if key == "CLOUDFLARE_API_TOKEN" {
                            "upstream.api_token".into()
                        } else {
                            "output_dir".into()
                        }
                    }),
            )
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
