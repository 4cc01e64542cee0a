//! LibreTranslate, self-hosted or public.

use super::{status_error, BackendKind, TranslationBackend};
use crate::error::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub struct LibreBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl LibreBackend {
    pub fn new(client: reqwest::Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[derive(Debug, Serialize)]
struct Request<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
    error: Option<String>,
}

#[async_trait]
impl TranslationBackend for LibreBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Libre
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, BackendError> {
        let body = Request {
            q: text,
            source,
            target,
            format: "text",
            api_key: self.api_key.as_deref().filter(|k| !k.is_empty()),
        };

        let response = self
            .client
            .post(format!("{}/translate", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(BackendKind::Libre, response).await);
        }

        let raw = response
            .text()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;
        parse_response(&raw)
    }
}

fn parse_response(raw: &str) -> Result<String, BackendError> {
    let parsed: Response =
        serde_json::from_str(raw).map_err(|e| BackendError::Parse(e.to_string()))?;

    match (parsed.translated_text, parsed.error) {
        (Some(text), _) => Ok(text),
        (None, Some(err)) => Err(BackendError::Request(err)),
        (None, None) => Err(BackendError::Parse("missing translatedText".into())),
    }
}
