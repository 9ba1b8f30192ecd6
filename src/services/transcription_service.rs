use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use tracing::warn;

use crate::config::Config;

/// Plafond de taille décodée accepté par le fournisseur (25MB)
pub const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct ProviderTranscription {
    text: String,
}

pub struct TranscriptionService;

impl TranscriptionService {
    /// Valide et décode le payload audio base64.
    /// Rejets (avant tout appel réseau): base64 invalide, payload vide,
    /// taille décodée au-dessus du plafond.
    pub fn decode_audio(audio_b64: &str) -> Result<Vec<u8>, String> {
        Self::decode_with_limit(audio_b64, MAX_AUDIO_BYTES)
    }

    fn decode_with_limit(audio_b64: &str, max_bytes: usize) -> Result<Vec<u8>, String> {
        let bytes = STANDARD
            .decode(audio_b64.trim())
            .map_err(|_| "Invalid base64 audio payload".to_string())?;

        if bytes.is_empty() {
            return Err("Empty audio payload".to_string());
        }

        if bytes.len() > max_bytes {
            return Err(format!(
                "Audio exceeds the {}MB limit ({} bytes decoded)",
                max_bytes / (1024 * 1024),
                bytes.len()
            ));
        }

        Ok(bytes)
    }

    /// Envoie l'audio décodé au fournisseur speech-to-text.
    /// Erreur amont => texte vide substitué, jamais d'exception brute.
    pub async fn transcribe(client: &reqwest::Client, config: &Config, audio: Vec<u8>) -> String {
        match Self::call_provider(client, config, audio).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Transcription failed: {} (substituting empty text)", e);
                String::new()
            }
        }
    }

    async fn call_provider(
        client: &reqwest::Client,
        config: &Config,
        audio: Vec<u8>,
    ) -> Result<String, String> {
        let part = reqwest::multipart::Part::bytes(audio)
            .file_name("audio.webm")
            .mime_str("audio/webm")
            .map_err(|e| format!("Invalid audio part: {}", e))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", "whisper-1");

        let response = client
            .post(&config.transcribe_api_url)
            .bearer_auth(&config.transcribe_api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Provider returned {}", response.status()));
        }

        let transcription: ProviderTranscription = response
            .json()
            .await
            .map_err(|e| format!("Malformed provider response: {}", e))?;

        Ok(transcription.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_base64_is_decoded() {
        let encoded = STANDARD.encode(b"fake audio bytes");
        let decoded = TranscriptionService::decode_audio(&encoded).unwrap();
        assert_eq!(decoded, b"fake audio bytes");
    }

    #[test]
    fn test_non_base64_payload_is_rejected() {
        let result = TranscriptionService::decode_audio("this is !!! not base64 ???");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("base64"));
    }

    #[test]
    fn test_empty_payload_is_rejected() {
        assert!(TranscriptionService::decode_audio("").is_err());
    }

    #[test]
    fn test_decoded_size_ceiling_is_enforced() {
        let encoded = STANDARD.encode(vec![0u8; 32]);

        // Sous la limite: accepté
        assert!(TranscriptionService::decode_with_limit(&encoded, 32).is_ok());
        // Au-dessus: rejeté avant tout appel réseau
        let result = TranscriptionService::decode_with_limit(&encoded, 31);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("limit"));
    }
}
