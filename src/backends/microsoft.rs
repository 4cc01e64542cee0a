//! Azure AI Translator (REST v3).
//!
//! Authentication uses the `Ocp-Apim-Subscription-Key` header; multi-service
//! and regional resources also need `Ocp-Apim-Subscription-Region`.

use super::{status_error, BackendKind, TranslationBackend};
use crate::error::BackendError;
use async_trait::async_trait;
use serde::Deserialize;

const ENDPOINT: &str = "https://api.cognitive.microsofttranslator.com/translate";

pub struct MicrosoftBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    region: Option<String>,
}

impl MicrosoftBackend {
    pub fn new(client: reqwest::Client, api_key: String, region: Option<String>) -> Self {
        Self {
            client,
            endpoint: ENDPOINT.to_string(),
            api_key,
            region,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResponseItem {
    translations: Vec<TranslationItem>,
}

#[derive(Debug, Deserialize)]
struct TranslationItem {
    text: String,
}

#[async_trait]
impl TranslationBackend for MicrosoftBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Microsoft
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, BackendError> {
        let mut req = self
            .client
            .post(&self.endpoint)
            .query(&[("api-version", "3.0"), ("from", source), ("to", target)])
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .json(&serde_json::json!([{ "Text": text }]));

        if let Some(region) = self.region.as_deref().filter(|r| !r.is_empty()) {
            req = req.header("Ocp-Apim-Subscription-Region", region);
        }

        let response = req.send().await?;
        if !response.status().is_success() {
            return Err(status_error(BackendKind::Microsoft, response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;
        parse_response(&body)
    }
}

fn parse_response(body: &str) -> Result<String, BackendError> {
    let items: Vec<ResponseItem> =
        serde_json::from_str(body).map_err(|e| BackendError::Parse(e.to_string()))?;

    items
        .into_iter()
        .next()
        .and_then(|item| item.translations.into_iter().next())
        .map(|t| t.text)
        .ok_or_else(|| BackendError::Parse("response contained no translations".into()))
}
