//! Minimal client for placing outbound calls through the Twilio REST API.

use crate::config::TwilioConfig;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{info, instrument};

pub const TWILIO_API_BASE: &str = "https://api.twilio.com";

#[derive(Debug, thiserror::Error)]
pub enum TwilioError {
    #[error("call request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("call request rejected with {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}

#[derive(Deserialize)]
struct CreatedCall {
    sid: String,
}

pub struct TwilioClient {
    http: reqwest::Client,
    api_base: String,
    config: TwilioConfig,
}

impl TwilioClient {
    pub fn new(http: reqwest::Client, api_base: impl Into<String>, config: TwilioConfig) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            config,
        }
    }

    /// Places a call to `to` from the configured number. Once answered, the
    /// provider fetches its call-control document from `twiml_url`.
    ///
    /// Returns the new call's SID.
    #[instrument(skip_all, fields(to = %to))]
    pub async fn create_call(&self, to: &str, twiml_url: &str) -> Result<String, TwilioError> {
        let endpoint = format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.api_base, self.config.account_sid
        );
        let response = self
            .http
            .post(endpoint)
            .basic_auth(
                &self.config.account_sid,
                Some(self.config.auth_token.expose_secret()),
            )
            .form(&[
                ("To", to),
                ("From", self.config.phone_number.as_str()),
                ("Url", twiml_url),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TwilioError::Rejected { status, body });
        }

        let call: CreatedCall = response.json().await?;
        info!(call_sid = %call.sid, "Outbound call created.");
        Ok(call.sid)
    }
}
