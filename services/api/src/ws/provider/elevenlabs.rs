//! Signed session URLs from the ElevenLabs conversational AI API.

use super::SignedUrlSource;
use crate::error::SignedUrlUnavailable;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument};

#[derive(Deserialize)]
struct SignedUrlResponse {
    signed_url: Option<String>,
}

/// Fetches a signed conversation URL for one agent.
///
/// Each call performs exactly one `GET`; there is no caching and no retry.
pub struct ElevenLabsSignedUrl {
    http: reqwest::Client,
    api_base: String,
    agent_id: String,
    api_key: SecretString,
}

impl ElevenLabsSignedUrl {
    pub fn new(
        http: reqwest::Client,
        api_base: impl Into<String>,
        agent_id: impl Into<String>,
        api_key: SecretString,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            agent_id: agent_id.into(),
            api_key,
        }
    }
}

#[async_trait]
impl SignedUrlSource for ElevenLabsSignedUrl {
    #[instrument(skip_all, fields(agent_id = %self.agent_id))]
    async fn signed_url(&self) -> Result<String, SignedUrlUnavailable> {
        let endpoint = format!("{}/v1/convai/conversation/get_signed_url", self.api_base);
        let response = self
            .http
            .get(endpoint)
            .query(&[("agent_id", self.agent_id.as_str())])
            .header("xi-api-key", self.api_key.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SignedUrlUnavailable::Status(status));
        }

        let body: SignedUrlResponse = response
            .json()
            .await
            .map_err(|e| SignedUrlUnavailable::Malformed(e.to_string()))?;
        let url = body
            .signed_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| SignedUrlUnavailable::Malformed("missing `signed_url`".to_string()))?;
        debug!("Obtained signed conversation URL.");
        Ok(url)
    }
}
