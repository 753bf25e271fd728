use std::sync::Arc;

use axum::{
    extract::{State, Json},
    http::HeaderMap,
};
use serde_json::json;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::TokenResponse;
use shared_models::error::AppError;
use shared_utils::jwt::validate_token as validate_jwt;

// Helper function to extract token
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    if !auth_value.starts_with("Bearer ") {
        return Err(AppError::Auth("Invalid authorization header format".to_string()));
    }

    Ok(auth_value[7..].to_string())
}

pub async fn validate_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = extract_bearer_token(&headers)?;

    match validate_jwt(&token, &config.supabase_jwt_secret) {
        Ok(user) => {
            let response = TokenResponse {
                valid: true,
                user_id: user.id,
                email: user.email,
                role: user.role,
                hospital_id: user.hospital_id,
            };

            Ok(Json(response))
        },
        Err(err) => {
            Err(AppError::Auth(err))
        }
    }
}

pub async fn verify_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    debug!("Verifying token");

    let token = extract_bearer_token(&headers)?;

    match validate_jwt(&token, &config.supabase_jwt_secret) {
        Ok(_) => {
            Ok(Json(json!({ "valid": true })))
        },
        Err(_) => {
            Ok(Json(json!({ "valid": false })))
        }
    }
}

/// Current user's auth profile, straight from the datastore's auth API.
pub async fn get_profile(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let token = extract_bearer_token(&headers)?;

    let user = validate_jwt(&token, &config.supabase_jwt_secret)
        .map_err(AppError::Auth)?;
    debug!("Getting profile for user: {}", user.id);

    let client = SupabaseClient::new(&config);

    let auth_profile = client.get_user_profile(&user.id, &token)
        .await
        .map_err(|e| AppError::ExternalService(e.to_string()))?;

    Ok(Json(json!({
        "user_id": user.id,
        "hospital_id": user.hospital_id,
        "auth_profile": auth_profile
    })))
}
