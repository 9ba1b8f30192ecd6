use actix_web::{web, HttpResponse, Responder};
use sea_orm::{DatabaseConnection, Set, ActiveModelTrait};
use validator::Validate;

use crate::middleware::AuthUser;
use crate::models::dto::CreateFeedbackRequest;
use crate::models::feedback;

/// POST /feedback - Envoyer un retour utilisateur (PROTÉGÉE)
pub async fn create_feedback(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<CreateFeedbackRequest>,
) -> impl Responder {
    if let Err(errors) = body.validate() {
        return HttpResponse::BadRequest().json(errors);
    }

    let new_feedback = feedback::ActiveModel {
        user_id: Set(auth_user.user_id),
        message: Set(body.message.trim().to_string()),
        rating: Set(body.rating),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    match new_feedback.insert(db.get_ref()).await {
        Ok(entry) => HttpResponse::Created().json(entry),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to save feedback: {}", e)
        })),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/feedback").route("", web::post().to(create_feedback)));
}
