//! Google Translate through the keyless `translate_a/single` endpoint.
//!
//! The endpoint answers with a nested JSON array whose first element lists
//! translated segments: `[[["Hola","Hello",null,null,10], …], null, "en", …]`.
//! Long inputs are split into sentences by the service, so the segments are
//! concatenated back together.

use super::{status_error, BackendKind, TranslationBackend};
use crate::error::BackendError;
use async_trait::async_trait;
use serde_json::Value;

const ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

pub struct GoogleBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleBackend {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: ENDPOINT.to_string(),
        }
    }
}

#[async_trait]
impl TranslationBackend for GoogleBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Google
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, BackendError> {
        // The text goes in the form body; a 5000-char chunk does not fit a URL.
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
            ])
            .form(&[("q", text)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(BackendKind::Google, response).await);
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;
        parse_response(&json)
    }
}

/// Concatenate the translated segments of a `translate_a/single` response.
fn parse_response(json: &Value) -> Result<String, BackendError> {
    let segments = json
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| BackendError::Parse("missing segment list".into()))?;

    Ok(segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(Value::as_str))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joins_segments() {
        let body = json!([
            [["Hola. ", "Hello. ", null, null, 10], ["Adiós", "Bye", null, null, 10]],
            null,
            "en"
        ]);
        assert_eq!(parse_response(&body).unwrap(), "Hola. Adiós");
    }

    #[test]
    fn rejects_unexpected_shape() {
        let err = parse_response(&json!({"error": "nope"})).unwrap_err();
        assert!(matches!(err, BackendError::Parse(_)));
    }

    #[test]
    fn empty_segment_list_is_empty_translation() {
        assert_eq!(parse_response(&json!([[], null, "en"])).unwrap(), "");
    }
}
