use serde_json::Value;
use tracing::warn;

use crate::config::Config;
use crate::models::dto::{Indicator, PredictionRequest, PredictionResponse};

/// Bornes de confiance du contrat API
const MIN_CONFIDENCE: u8 = 60;
const MAX_CONFIDENCE: u8 = 95;

const FALLBACK_MODEL: &str = "fallback";

pub struct PredictionService;

impl PredictionService {
    /// Demande une recommandation BUY/HOLD/SELL au modèle de langage.
    /// Toute erreur amont (réseau, JSON invalide, signal inconnu) est remplacée
    /// par la recommandation HOLD de repli: l'UI ne voit jamais d'exception.
    /// Les valeurs de confiance et d'indicateurs sont du texte généré par le
    /// modèle, aucune vérification statistique n'est faite côté serveur.
    pub async fn predict(
        client: &reqwest::Client,
        config: &Config,
        request: &PredictionRequest,
    ) -> PredictionResponse {
        match Self::call_model(client, config, request).await {
            Ok(prediction) => prediction,
            Err(e) => {
                warn!("AI prediction failed for {}: {} (substituting HOLD fallback)", request.symbol, e);
                Self::fallback(&request.symbol)
            }
        }
    }

    async fn call_model(
        client: &reqwest::Client,
        config: &Config,
        request: &PredictionRequest,
    ) -> Result<PredictionResponse, String> {
        let prompt = Self::build_prompt(request);
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            config.llm_api_url, config.llm_model, config.llm_api_key
        );

        let body = serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
        });

        let response = client
            .post(&url)
            .json(&body)
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

        let text = json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or("No text candidate in provider response")?;

        Self::parse_prediction(text, &config.llm_model)
    }

    fn build_prompt(request: &PredictionRequest) -> String {
        format!(
            "You are a stock analyst. Given this snapshot, respond with ONLY a JSON object \
             (no markdown) with keys: signal (BUY, HOLD or SELL), confidence (integer 60-95), \
             reasoning (2-3 sentences), keyFactors (array of 3 short strings), indicators \
             (array of 3 objects with name, value, signal).\n\
             Symbol: {}\nName: {}\nPrice: {}\nChange: {}\nChange percent: {}\nVolume: {}",
            request.symbol,
            request.name.as_deref().unwrap_or(&request.symbol),
            request.price,
            request.change,
            request.change_percent,
            request.volume,
        )
    }

    /// Parse la réponse texte du modèle (JSON éventuellement clôturé en markdown),
    /// normalise le signal et borne la confiance à [60, 95]
    pub fn parse_prediction(text: &str, model: &str) -> Result<PredictionResponse, String> {
        let cleaned = text
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();

        let mut prediction: PredictionResponse =
            serde_json::from_str(cleaned).map_err(|e| format!("Invalid prediction JSON: {}", e))?;

        prediction.signal = prediction.signal.to_uppercase();
        if !matches!(prediction.signal.as_str(), "BUY" | "HOLD" | "SELL") {
            return Err(format!("Unknown signal '{}'", prediction.signal));
        }

        prediction.confidence = prediction.confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);
        prediction.model_used = model.to_string();

        Ok(prediction)
    }

    /// Recommandation de repli: HOLD fixe avec indicateurs placeholder
    pub fn fallback(symbol: &str) -> PredictionResponse {
        PredictionResponse {
            signal: "HOLD".to_string(),
            confidence: 65,
            reasoning: format!(
                "Live analysis is temporarily unavailable for {}. Holding is suggested until \
                 fresh signals can be computed.",
                symbol
            ),
            key_factors: vec![
                "Analysis service unavailable".to_string(),
                "No fresh market signals".to_string(),
                "Position unchanged by default".to_string(),
            ],
            indicators: vec![
                Indicator {
                    name: "RSI (14)".to_string(),
                    value: "50.0".to_string(),
                    signal: "NEUTRAL".to_string(),
                },
                Indicator {
                    name: "MACD".to_string(),
                    value: "0.00".to_string(),
                    signal: "NEUTRAL".to_string(),
                },
                Indicator {
                    name: "SMA (50)".to_string(),
                    value: "n/a".to_string(),
                    signal: "NEUTRAL".to_string(),
                },
            ],
            model_used: FALLBACK_MODEL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prediction_with_markdown_fences() {
        let text = r#"```json
{"signal": "buy", "confidence": 82, "reasoning": "Momentum is strong.",
 "keyFactors": ["Volume spike"], "indicators": [{"name": "RSI", "value": "61", "signal": "BULLISH"}]}
```"#;

        let prediction = PredictionService::parse_prediction(text, "gemini-1.5-flash").unwrap();
        assert_eq!(prediction.signal, "BUY");
        assert_eq!(prediction.confidence, 82);
        assert_eq!(prediction.model_used, "gemini-1.5-flash");
        assert_eq!(prediction.indicators.len(), 1);
    }

    #[test]
    fn test_confidence_is_clamped_to_contract_range() {
        let low = r#"{"signal": "SELL", "confidence": 12, "reasoning": "r", "keyFactors": [], "indicators": []}"#;
        let high = r#"{"signal": "SELL", "confidence": 99, "reasoning": "r", "keyFactors": [], "indicators": []}"#;

        assert_eq!(PredictionService::parse_prediction(low, "m").unwrap().confidence, 60);
        assert_eq!(PredictionService::parse_prediction(high, "m").unwrap().confidence, 95);
    }

    #[test]
    fn test_unknown_signal_is_an_error() {
        let text = r#"{"signal": "SHORT", "confidence": 70, "reasoning": "r", "keyFactors": [], "indicators": []}"#;
        assert!(PredictionService::parse_prediction(text, "m").is_err());
    }

    #[test]
    fn test_fallback_is_a_valid_hold() {
        let fallback = PredictionService::fallback("AAPL");
        assert_eq!(fallback.signal, "HOLD");
        assert!(fallback.confidence >= MIN_CONFIDENCE && fallback.confidence <= MAX_CONFIDENCE);
        assert!(!fallback.indicators.is_empty());
        assert_eq!(fallback.model_used, "fallback");
        assert!(fallback.reasoning.contains("AAPL"));
    }
}
