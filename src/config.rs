// Configuration explicite chargée une seule fois depuis l'environnement,
// puis injectée via web::Data (pas d'accès global ambiant)

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub site_url: Option<String>,

    // Fournisseur de quotes (Finnhub-compatible)
    pub quote_api_url: String,
    pub quote_api_key: String,

    // Fournisseur de langage génératif (prédictions + chat)
    pub llm_api_url: String,
    pub llm_api_key: String,
    pub llm_model: String,

    // Fournisseur speech-to-text
    pub transcribe_api_url: String,
    pub transcribe_api_key: String,
}

fn required(key: &str) -> Result<String, String> {
    env::var(key).map_err(|_| format!("Missing required environment variable: {}", key))
}

impl Config {
    /// Charge la configuration depuis les variables d'environnement.
    /// Les secrets (clés API) sont obligatoires, le reste a des défauts raisonnables.
    pub fn from_env() -> Result<Config, String> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| "PORT must be a valid port number".to_string())?;

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
            site_url: env::var("SITE_URL").ok(),

            quote_api_url: env::var("QUOTE_API_URL")
                .unwrap_or_else(|_| "https://finnhub.io/api/v1".to_string()),
            quote_api_key: required("QUOTE_API_KEY")?,

            llm_api_url: env::var("LLM_API_URL").unwrap_or_else(|_| {
                "https://generativelanguage.googleapis.com/v1beta".to_string()
            }),
            llm_api_key: required("LLM_API_KEY")?,
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string()),

            transcribe_api_url: env::var("TRANSCRIBE_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/audio/transcriptions".to_string()),
            transcribe_api_key: required("TRANSCRIBE_API_KEY")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required_variable() {
        let result = required("DEFINITELY_NOT_SET_VARIABLE_12345");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("DEFINITELY_NOT_SET_VARIABLE_12345"));
    }
}
