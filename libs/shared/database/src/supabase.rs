use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::notify::{ChangeHub, ChangeOp, TableChange};

/// Typed datastore errors. The uniqueness-guard rejection is a first-class
/// variant so callers never have to match on error message content.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl DbError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, DbError::Conflict { .. })
    }
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    changes: ChangeHub,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
            changes: ChangeHub::new(),
        }
    }

    /// Observer registration for row mutations issued through this client.
    /// Best-effort refresh signal only; reads always re-derive truth.
    pub fn changes(&self) -> &ChangeHub {
        &self.changes
    }

    fn get_headers(&self, auth_token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(&self.anon_key).unwrap());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
            );
        }

        headers
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> Result<T, DbError>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(&self, method: Method, path: &str,
                                         auth_token: Option<&str>, body: Option<Value>,
                                         extra_headers: Option<HeaderMap>)
                                         -> Result<T, DbError>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers(auth_token);
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mutation_op = if method == Method::POST {
            Some(ChangeOp::Insert)
        } else if method == Method::PATCH || method == Method::PUT {
            Some(ChangeOp::Update)
        } else if method == Method::DELETE {
            Some(ChangeOp::Delete)
        } else {
            None
        };

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => DbError::Auth(error_text),
                404 => DbError::NotFound(error_text),
                409 => DbError::Conflict { message: error_text },
                code => DbError::Api { status: code, message: error_text },
            });
        }

        if let Some(op) = mutation_op {
            if let Some(table) = table_from_path(path) {
                self.changes.publish(TableChange { table, op });
            }
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    pub async fn get_user_profile(&self, _user_id: &str, auth_token: &str) -> Result<Value, DbError> {
        // Supabase Auth API endpoint for the current user
        let path = "/auth/v1/user";

        self.request::<Value>(
            Method::GET,
            path,
            Some(auth_token),
            None,
        ).await
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

/// Extract the table name from a PostgREST path like
/// `/rest/v1/appointments?scheduled_date=eq.2025-01-01`.
fn table_from_path(path: &str) -> Option<String> {
    let rest = path.strip_prefix("/rest/v1/")?;
    let table = rest.split('?').next().unwrap_or(rest);
    if table.is_empty() {
        None
    } else {
        Some(table.to_string())
    }
}
