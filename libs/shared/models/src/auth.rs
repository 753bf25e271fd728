use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub hospital_id: Option<Uuid>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub hospital_id: Option<Uuid>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Explicit per-request tenant context, threaded through every service call
/// instead of ambient session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    pub actor_id: Uuid,
    pub hospital_id: Uuid,
}

impl RequestContext {
    /// Build the context from a validated user. Fails when the token carries
    /// no hospital claim - every domain operation is tenant-scoped.
    pub fn from_user(user: &User) -> Result<Self, String> {
        let actor_id = Uuid::parse_str(&user.id)
            .map_err(|_| "User id is not a valid UUID".to_string())?;
        let hospital_id = user.hospital_id
            .ok_or_else(|| "Token carries no hospital_id claim".to_string())?;

        Ok(Self { actor_id, hospital_id })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub valid: bool,
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub hospital_id: Option<Uuid>,
}
