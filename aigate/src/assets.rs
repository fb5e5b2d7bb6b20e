//! Materializes binary inputs (inpainting image and mask) from whichever source is available.
//!
//! Sources are tried in a fixed order: inline base64 supplied by the caller, then a local file,
//! then a remote URL. At most one of the local read and the network fetch happens per call.

use bytes::Bytes;
use reqwest::Client;
use std::path::Path;
use tracing::{debug, instrument};
use url::Url;

use crate::codec::from_base64;
use crate::config::AssetSource;
use crate::errors::{Error, Result};

#[derive(Debug, Clone)]
pub struct AssetResolver {
    client: Client,
}

impl AssetResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Resolve an asset, preferring `inline`, then `local_path`, then `remote_url`.
    #[instrument(skip(self, inline), fields(inline = inline.is_some()))]
    pub async fn resolve(&self, inline: Option<&str>, local_path: Option<&Path>, remote_url: &Url) -> Result<Bytes> {
        if let Some(encoded) = inline {
            debug!("Using inline asset");
            return Ok(Bytes::from(from_base64(encoded)?));
        }

        if let Some(path) = local_path {
            match tokio::fs::metadata(path).await {
                Ok(meta) if meta.is_file() => {
                    debug!("Reading asset from {}", path.display());
                    let content = tokio::fs::read(path).await.map_err(|e| Error::AssetUnavailable {
                        url: path.display().to_string(),
                        reason: e.to_string(),
                    })?;
                    return Ok(Bytes::from(content));
                }
                _ => debug!("Local asset {} not found, falling back to remote", path.display()),
            }
        }

        self.fetch(remote_url).await
    }

    /// Resolve against a configured `{path, url}` source.
    pub async fn resolve_default(&self, inline: Option<&str>, source: &AssetSource) -> Result<Bytes> {
        self.resolve(inline, source.path.as_deref(), &source.url).await
    }

    async fn fetch(&self, url: &Url) -> Result<Bytes> {
        debug!("Fetching asset from {}", url);
        let unavailable = |reason: String| Error::AssetUnavailable {
            url: url.to_string(),
            reason,
        };

        let response = self.client.get(url.clone()).send().await.map_err(|e| unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(unavailable(format!("HTTP {}", response.status())));
        }

        response.bytes().await.map_err(|e| unavailable(e.to_string()))
    }
}
