use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::config::Config;
use crate::middleware::AuthUser;
use crate::models::dto::{ChatRequest, ChatResponse, PredictionRequest, TranscribeRequest, TranscribeResponse};
use crate::services::chat_service::ChatService;
use crate::services::prediction_service::PredictionService;
use crate::services::transcription_service::TranscriptionService;

/// POST /ai/prediction - Recommandation BUY/HOLD/SELL (PROTÉGÉE)
pub async fn prediction(
    _auth_user: AuthUser,
    client: web::Data<reqwest::Client>,
    config: web::Data<Config>,
    body: web::Json<PredictionRequest>,
) -> impl Responder {
    if let Err(errors) = body.validate() {
        return HttpResponse::BadRequest().json(errors);
    }

    // Le service substitue lui-même le repli HOLD: jamais d'erreur dure ici
    let prediction = PredictionService::predict(client.get_ref(), config.get_ref(), &body).await;
    HttpResponse::Ok().json(prediction)
}

/// POST /ai/chat - Chat assistant, réponse simple ou stream SSE (PROTÉGÉE)
pub async fn chat(
    _auth_user: AuthUser,
    client: web::Data<reqwest::Client>,
    config: web::Data<Config>,
    body: web::Json<ChatRequest>,
) -> HttpResponse {
    if let Err(errors) = body.validate() {
        return HttpResponse::BadRequest().json(errors);
    }

    // Mode stream: relais SSE des chunks incrémentaux, terminé par un marqueur done
    if body.stream.unwrap_or(false) {
        return match ChatService::stream_reply(client.get_ref(), config.get_ref(), &body).await {
            Ok(stream) => HttpResponse::Ok()
                .content_type("text/event-stream")
                .insert_header(("Cache-Control", "no-cache"))
                .streaming(stream),
            Err(e) => {
                // Même en erreur d'ouverture du flux, l'UI reçoit un SSE bien formé
                tracing::warn!("AI chat stream failed to open: {}", e);
                let fallback = format!(
                    "{}{}",
                    ChatService::sse_event(&serde_json::json!({
                        "content": crate::services::chat_service::FALLBACK_MESSAGE
                    })),
                    ChatService::sse_event(&serde_json::json!({ "done": true })),
                );
                HttpResponse::Ok()
                    .content_type("text/event-stream")
                    .insert_header(("Cache-Control", "no-cache"))
                    .body(fallback)
            }
        };
    }

    // Mode simple: une réponse JSON unique
    let message = ChatService::reply(client.get_ref(), config.get_ref(), &body).await;
    HttpResponse::Ok().json(ChatResponse { message })
}

/// POST /ai/transcribe - Transcription vocale {audio: base64} (PROTÉGÉE)
pub async fn transcribe(
    _auth_user: AuthUser,
    client: web::Data<reqwest::Client>,
    config: web::Data<Config>,
    body: web::Json<TranscribeRequest>,
) -> impl Responder {
    // Validation (base64, plafond 25MB) AVANT tout appel réseau
    let audio = match TranscriptionService::decode_audio(&body.audio) {
        Ok(audio) => audio,
        Err(e) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": e
            }));
        }
    };

    let text = TranscriptionService::transcribe(client.get_ref(), config.get_ref(), audio).await;
    HttpResponse::Ok().json(TranscribeResponse { text })
}

pub fn ai_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/ai")
            .route("/prediction", web::post().to(prediction))
            .route("/chat", web::post().to(chat))
            .route("/transcribe", web::post().to(transcribe)),
    );
}
