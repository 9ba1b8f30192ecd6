//pour les requêtes/réponses structurées de l'API
use serde::{Deserialize, Serialize};
use rust_decimal::Decimal;
use validator::{Validate, ValidationError};

// ============================================================
// Quotes
// ============================================================

/// Snapshot ponctuel prix/volume pour un symbole.
/// `category` est assignée en round-robin positionnel pour l'UI;
/// `is_sample` marque les données placeholder (badge côté client).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    #[serde(rename = "changePercent")]
    pub change_percent: f64,
    pub volume: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "isSample", default)]
    pub is_sample: bool,
}

/// Requête quote-fetch: soit une liste de symboles, soit une recherche
#[derive(Debug, Deserialize)]
pub struct QuotesRequest {
    pub symbols: Option<Vec<String>>,
    pub search: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct QuotesResponse {
    pub stocks: Vec<QuoteSnapshot>,
    pub total_requested: usize,
    pub total_retrieved: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub symbol: String,
    pub description: String,
    #[serde(rename = "displaySymbol")]
    pub display_symbol: String,
    #[serde(rename = "type")]
    pub security_type: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    #[serde(rename = "searchResults")]
    pub search_results: Vec<SearchResult>,
}

// ============================================================
// Historique (candles)
// ============================================================

#[derive(Debug, Deserialize, Validate)]
pub struct HistoryRequest {
    #[validate(length(min = 1, message = "symbol is required"))]
    pub symbol: String,
    #[serde(rename = "timeRange", default = "default_time_range")]
    pub time_range: String,
}

fn default_time_range() -> String {
    "1M".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct CandlePoint {
    pub date: String,
    pub price: f64,
    pub volume: i64,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub symbol: String,
    #[serde(rename = "timeRange")]
    pub time_range: String,
    pub data: Vec<CandlePoint>,
}

// ============================================================
// IA: prédiction, chat, transcription
// ============================================================

#[derive(Debug, Deserialize, Validate)]
pub struct PredictionRequest {
    #[validate(length(min = 1, message = "symbol is required"))]
    pub symbol: String,
    pub name: Option<String>,
    pub price: f64,
    pub change: f64,
    #[serde(rename = "changePercent")]
    pub change_percent: f64,
    pub volume: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indicator {
    pub name: String,
    pub value: String,
    pub signal: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub signal: String, // BUY | HOLD | SELL
    pub confidence: u8, // 60-95
    pub reasoning: String,
    #[serde(rename = "keyFactors", default)]
    pub key_factors: Vec<String>,
    #[serde(default)]
    pub indicators: Vec<Indicator>,
    #[serde(rename = "modelUsed", default)]
    pub model_used: String,
}

/// Message de conversation (jamais persisté, durée de vie du widget)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String, // user | assistant
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, message = "message is required"))]
    pub message: String,
    #[serde(rename = "conversationHistory", default)]
    pub conversation_history: Vec<ChatMessage>,
    pub stream: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct TranscribeRequest {
    pub audio: String, // base64
}

#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub text: String,
}

// ============================================================
// Portfolio & watchlist
// ============================================================

#[derive(Debug, Deserialize, Validate)]
pub struct CreateHoldingRequest {
    #[validate(length(min = 1, message = "symbol is required"))]
    pub symbol: String,
    pub name: Option<String>,
    #[validate(custom(function = "validate_positive_shares"))]
    pub shares: Decimal,
    #[serde(rename = "avgPrice")]
    #[validate(custom(function = "validate_non_negative_price"))]
    pub avg_price: Decimal,
}

fn validate_positive_shares(shares: &Decimal) -> Result<(), ValidationError> {
    if *shares > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("shares_must_be_positive"))
    }
}

fn validate_non_negative_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price >= Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("price_must_be_non_negative"))
    }
}

/// Holding enrichi des champs dérivés, recalculés à chaque lecture
#[derive(Debug, Clone, Serialize)]
pub struct HoldingView {
    pub id: i32,
    pub symbol: String,
    pub name: Option<String>,
    pub shares: Decimal,
    #[serde(rename = "avgPrice")]
    pub avg_price: Decimal,
    #[serde(rename = "currentPrice")]
    pub current_price: Decimal,
    pub value: Decimal,
    pub gain: Decimal,
    #[serde(rename = "gainPercent")]
    pub gain_percent: Decimal,
    #[serde(rename = "isSample")]
    pub is_sample: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddWatchlistRequest {
    #[validate(length(min = 1, message = "symbol is required"))]
    pub symbol: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFeedbackRequest {
    #[validate(length(min = 1, message = "message is required"))]
    pub message: String,
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i32>,
}

// ============================================================
// Practice mode
// ============================================================

#[derive(Debug, Deserialize, Validate)]
pub struct PracticeStartRequest {
    #[validate(length(min = 1, message = "at least one symbol is required"))]
    pub symbols: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_non_positive_shares_are_rejected() {
        let request = CreateHoldingRequest {
            symbol: "AAPL".to_string(),
            name: Some("Apple Inc".to_string()),
            shares: dec("0"),
            avg_price: dec("150.00"),
        };
        assert!(request.validate().is_err());

        let request = CreateHoldingRequest {
            symbol: "AAPL".to_string(),
            name: None,
            shares: dec("-3"),
            avg_price: dec("150.00"),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_valid_holding_passes_validation() {
        let request = CreateHoldingRequest {
            symbol: "AAPL".to_string(),
            name: Some("Apple Inc".to_string()),
            shares: dec("2.5"),
            avg_price: dec("150.00"),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_empty_symbol_is_rejected() {
        let request = CreateHoldingRequest {
            symbol: "".to_string(),
            name: None,
            shares: dec("1"),
            avg_price: dec("10"),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_feedback_rating_out_of_range() {
        let request = CreateFeedbackRequest {
            message: "Great app".to_string(),
            rating: Some(6),
        };
        assert!(request.validate().is_err());
    }
}
