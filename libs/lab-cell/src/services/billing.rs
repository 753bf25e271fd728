// libs/lab-cell/src/services/billing.rs
use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use shared_database::supabase::SupabaseClient;
use shared_models::auth::RequestContext;

use crate::models::{Bill, LabError, LabOrder};

pub struct BillingService {
    supabase: Arc<SupabaseClient>,
}

impl BillingService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// The bill linked to a lab order, if finance has raised one yet.
    pub async fn bill_for_lab_order(
        &self,
        order: &LabOrder,
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<Option<Bill>, LabError> {
        let Some(bill_id) = order.bill_id else {
            debug!("Lab order {} has no linked bill", order.id);
            return Ok(None);
        };

        let path = format!(
            "/rest/v1/bills?id=eq.{}&hospital_id=eq.{}",
            bill_id, ctx.hospital_id
        );

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(LabError::from_db)?;

        if result.is_empty() {
            return Ok(None);
        }

        let bill: Bill = serde_json::from_value(result[0].clone())
            .map_err(|e| LabError::DatabaseError(format!("Failed to parse bill: {}", e)))?;

        Ok(Some(bill))
    }
}
