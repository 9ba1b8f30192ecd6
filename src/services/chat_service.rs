use actix_web::web::Bytes;
use futures::stream::BoxStream;
use futures::{stream, StreamExt};
use serde_json::{json, Value};
use tracing::warn;

use crate::config::Config;
use crate::models::dto::ChatRequest;

/// Message de repli substitué à toute erreur amont
pub const FALLBACK_MESSAGE: &str =
    "Sorry, I'm having trouble reaching the assistant right now. Please try again in a moment.";

pub struct ChatService;

impl ChatService {
    /// Réponse non-streamée: relaie le prompt + l'historique, retourne le texte.
    /// Erreur amont => message de repli, jamais d'exception brute.
    pub async fn reply(client: &reqwest::Client, config: &Config, request: &ChatRequest) -> String {
        match Self::call_model(client, config, request).await {
            Ok(message) => message,
            Err(e) => {
                warn!("AI chat failed: {} (substituting fallback message)", e);
                FALLBACK_MESSAGE.to_string()
            }
        }
    }

    async fn call_model(
        client: &reqwest::Client,
        config: &Config,
        request: &ChatRequest,
    ) -> Result<String, String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            config.llm_api_url, config.llm_model, config.llm_api_key
        );

        let response = client
            .post(&url)
            .json(&Self::build_body(request))
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Provider returned {}", response.status()));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| format!("Malformed provider response: {}", e))?;

        json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| "No text candidate in provider response".to_string())
    }

    /// Réponse streamée: relaie le flux SSE du fournisseur en événements
    /// `data: {"content": ...}` terminés par un marqueur `data: {"done": true}`
    pub async fn stream_reply(
        client: &reqwest::Client,
        config: &Config,
        request: &ChatRequest,
    ) -> Result<BoxStream<'static, Result<Bytes, actix_web::Error>>, String> {
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse&key={}",
            config.llm_api_url, config.llm_model, config.llm_api_key
        );

        let response = client
            .post(&url)
            .json(&Self::build_body(request))
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Provider returned {}", response.status()));
        }

        // Les chunks HTTP ne tombent pas forcément sur des frontières de lignes:
        // on bufferise et on ne traite que les lignes complètes
        let mut buffer = String::new();
        let relay = response.bytes_stream().map(move |chunk| -> Result<Bytes, actix_web::Error> {
            match chunk {
                Ok(bytes) => {
                    buffer.push_str(&String::from_utf8_lossy(&bytes));
                    let mut out = String::new();

                    while let Some(newline) = buffer.find('\n') {
                        let line = buffer[..newline].trim().to_string();
                        buffer.drain(..=newline);

                        if let Some(payload) = line.strip_prefix("data: ") {
                            if let Some(text) = Self::extract_chunk_text(payload) {
                                out.push_str(&Self::sse_event(&json!({ "content": text })));
                            }
                        }
                    }

                    Ok(Bytes::from(out))
                }
                Err(e) => {
                    warn!("AI chat stream interrupted: {}", e);
                    Ok(Bytes::from(Self::sse_event(&json!({ "content": FALLBACK_MESSAGE }))))
                }
            }
        });

        let done_marker =
            stream::once(async { Ok(Bytes::from(Self::sse_event(&json!({ "done": true })))) });

        Ok(relay.chain(done_marker).boxed())
    }

    /// Corps de requête fournisseur: l'historique puis le message courant.
    /// Le rôle "assistant" du widget devient "model" côté fournisseur.
    fn build_body(request: &ChatRequest) -> Value {
        let mut contents: Vec<Value> = request
            .conversation_history
            .iter()
            .map(|message| {
                let role = if message.role == "assistant" { "model" } else { "user" };
                json!({ "role": role, "parts": [{ "text": message.content }] })
            })
            .collect();

        contents.push(json!({ "role": "user", "parts": [{ "text": request.message }] }));

        json!({ "contents": contents })
    }

    /// Extrait le texte incrémental d'un payload SSE du fournisseur
    pub fn extract_chunk_text(payload: &str) -> Option<String> {
        if payload == "[DONE]" {
            return None;
        }

        let value: Value = serde_json::from_str(payload).ok()?;
        let parts = value["candidates"][0]["content"]["parts"].as_array()?;

        let text: String = parts
            .iter()
            .filter_map(|part| part["text"].as_str())
            .collect();

        if text.is_empty() { None } else { Some(text) }
    }

    /// Formate un événement SSE
    pub fn sse_event(value: &Value) -> String {
        format!("data: {}\n\n", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dto::ChatMessage;

    #[test]
    fn test_extract_chunk_text() {
        let payload = r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"there"}]}}]}"#;
        assert_eq!(ChatService::extract_chunk_text(payload), Some("Hello there".to_string()));

        assert_eq!(ChatService::extract_chunk_text("[DONE]"), None);
        assert_eq!(ChatService::extract_chunk_text("not json"), None);
        assert_eq!(ChatService::extract_chunk_text(r#"{"candidates":[]}"#), None);
    }

    #[test]
    fn test_build_body_maps_roles_and_appends_message() {
        let request = ChatRequest {
            message: "What about TSLA?".to_string(),
            conversation_history: vec![
                ChatMessage { role: "user".to_string(), content: "Hi".to_string() },
                ChatMessage { role: "assistant".to_string(), content: "Hello!".to_string() },
            ],
            stream: None,
        };

        let body = ChatService::build_body(&request);
        let contents = body["contents"].as_array().unwrap();

        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["role"], "user");
        assert_eq!(contents[2]["parts"][0]["text"], "What about TSLA?");
    }

    #[test]
    fn test_sse_event_format() {
        let event = ChatService::sse_event(&json!({ "done": true }));
        assert!(event.starts_with("data: "));
        assert!(event.ends_with("\n\n"));
    }
}
