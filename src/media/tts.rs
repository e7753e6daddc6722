//! HTTP speech synthesizer against the Google TTS endpoint.
//!
//! The endpoint caps input at roughly 200 characters per request, so longer
//! text is split on whitespace and the MP3 responses appended in order (the
//! frames are self-contained, which is how the original's TTS library built
//! combined files too). The endpoint offers no voice-gender control; the
//! requested gender is carried in [`VoiceProfile`] for synthesizers that do.

use super::{Synthesizer, VoiceProfile};
use anyhow::{Context, Result};
use async_trait::async_trait;

const ENDPOINT: &str = "https://translate.google.com/translate_tts";
const MAX_CHUNK_CHARS: usize = 200;

pub struct HttpSynthesizer {
    client: reqwest::Client,
}

impl HttpSynthesizer {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch_chunk(&self, text: &str, lang: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(ENDPOINT)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", lang),
                ("q", text),
            ])
            .send()
            .await
            .context("Speech synthesis request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("synthesis endpoint returned {}", response.status());
        }

        let bytes = response
            .bytes()
            .await
            .context("Failed to read synthesized audio")?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Synthesizer for HttpSynthesizer {
    async fn synthesize(&self, text: &str, voice: &VoiceProfile) -> Result<Vec<u8>> {
        let text = text.trim();
        if text.is_empty() {
            anyhow::bail!("nothing to synthesize");
        }

        let mut audio = Vec::new();
        for chunk in split_text(text, MAX_CHUNK_CHARS) {
            let bytes = self.fetch_chunk(&chunk, &voice.lang).await?;
            audio.extend_from_slice(&bytes);
        }
        Ok(audio)
    }
}

/// Split on whitespace into chunks of at most `max_chars`, keeping words
/// whole. A single over-long word becomes its own chunk.
fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_text("bonjour le monde", 200), vec!["bonjour le monde"]);
    }

    #[test]
    fn long_text_splits_on_word_boundaries() {
        let text = "aaaa bbbb cccc dddd";
        let chunks = split_text(text, 9);
        assert_eq!(chunks, vec!["aaaa bbbb", "cccc dddd"]);
    }

    #[test]
    fn oversized_word_becomes_own_chunk() {
        let chunks = split_text("tiny incomprehensibilities end", 10);
        assert_eq!(chunks, vec!["tiny", "incomprehensibilities", "end"]);
    }
}
