//! HTTP translator against the unauthenticated Google translate endpoint.
//!
//! Same endpoint the original deployment's translation library used; one
//! request per segment, failures tolerated by the caller.

use super::Translator;
use anyhow::{Context, Result};
use async_trait::async_trait;

const ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

pub struct HttpTranslator {
    client: reqwest::Client,
    source_lang: String,
    target_lang: String,
}

impl HttpTranslator {
    pub fn new(client: reqwest::Client, source_lang: String, target_lang: String) -> Self {
        Self {
            client,
            source_lang,
            target_lang,
        }
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        let response = self
            .client
            .get(ENDPOINT)
            .query(&[
                ("client", "gtx"),
                ("sl", self.source_lang.as_str()),
                ("tl", self.target_lang.as_str()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .context("Translation request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("translation endpoint returned {}", response.status());
        }

        let value: serde_json::Value = response
            .json()
            .await
            .context("Unparsable translation response")?;

        parse_translation(&value)
    }
}

/// The endpoint answers a nested array; the translation is the first element
/// of each chunk under `value[0]`.
fn parse_translation(value: &serde_json::Value) -> Result<String> {
    let chunks = value
        .get(0)
        .and_then(|v| v.as_array())
        .context("Unexpected translation response shape")?;

    let mut out = String::new();
    for chunk in chunks {
        if let Some(text) = chunk.get(0).and_then(|v| v.as_str()) {
            out.push_str(text);
        }
    }

    if out.is_empty() {
        anyhow::bail!("translation response contained no text");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_chunked_response() {
        let value = json!([[["Bonjour ", "Hello ", null], ["le monde", "world", null]], null, "en"]);
        assert_eq!(parse_translation(&value).unwrap(), "Bonjour le monde");
    }

    #[test]
    fn rejects_empty_response() {
        assert!(parse_translation(&json!([[]])).is_err());
        assert!(parse_translation(&json!(null)).is_err());
    }
}
