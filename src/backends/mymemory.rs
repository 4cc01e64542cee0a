//! MyMemory translation memory API.
//!
//! The service reports failures inside a 200 response through
//! `responseStatus`, which is sometimes a number and sometimes a string.

use super::{status_error, BackendKind, TranslationBackend};
use crate::error::BackendError;
use async_trait::async_trait;
use serde_json::Value;

const ENDPOINT: &str = "https://api.mymemory.translated.net/get";

pub struct MyMemoryBackend {
    client: reqwest::Client,
    endpoint: String,
    email: Option<String>,
}

impl MyMemoryBackend {
    pub fn new(client: reqwest::Client, email: Option<String>) -> Self {
        Self {
            client,
            endpoint: ENDPOINT.to_string(),
            email,
        }
    }
}

#[async_trait]
impl TranslationBackend for MyMemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::MyMemory
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, BackendError> {
        let langpair = format!("{source}|{target}");
        let mut query: Vec<(&str, &str)> = vec![("q", text), ("langpair", &langpair)];
        // A contact address raises the anonymous daily quota.
        if let Some(email) = self.email.as_deref().filter(|e| !e.is_empty()) {
            query.push(("de", email));
        }

        let response = self.client.get(&self.endpoint).query(&query).send().await?;
        if !response.status().is_success() {
            return Err(status_error(BackendKind::MyMemory, response).await);
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;
        parse_response(&json)
    }
}

fn parse_response(json: &Value) -> Result<String, BackendError> {
    let status = match json.get("responseStatus") {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    };

    if status != 200 {
        let details = json
            .get("responseDetails")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        if status == 429 {
            return Err(BackendError::RateLimited {
                backend: BackendKind::MyMemory,
            });
        }
        return Err(BackendError::Http {
            status: status as u16,
            body: details.to_string(),
        });
    }

    json.pointer("/responseData/translatedText")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| BackendError::Parse("missing responseData.translatedText".into()))
}
