// libs/lab-cell/src/services/workflow.rs
use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::RequestContext;

use crate::models::{CreateLabOrderRequest, LabError, LabOrder, LabOrderStatus, RecordResultRequest};
use crate::services::billing::BillingService;

/// Lab order workflow. States move forward only; the steps that hand the
/// sample to the laboratory are blocked while the order's bill is unpaid.
pub struct LabWorkflowService {
    supabase: Arc<SupabaseClient>,
    billing_service: BillingService,
}

impl LabWorkflowService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        let billing_service = BillingService::new(Arc::clone(&supabase));

        Self {
            supabase,
            billing_service,
        }
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: &LabOrderStatus) -> Vec<LabOrderStatus> {
        match current_status {
            LabOrderStatus::Ordered => vec![LabOrderStatus::SampleCollected],
            LabOrderStatus::SampleCollected => vec![LabOrderStatus::InProgress],
            LabOrderStatus::InProgress => vec![LabOrderStatus::Completed],
            LabOrderStatus::Completed => vec![],
        }
    }

    /// The transitions that require the linked bill to be settled first.
    fn is_payment_gated(&self, from: &LabOrderStatus, to: &LabOrderStatus) -> bool {
        matches!(
            (from, to),
            (LabOrderStatus::Ordered, LabOrderStatus::SampleCollected)
                | (LabOrderStatus::SampleCollected, LabOrderStatus::InProgress)
        )
    }

    /// Place a new lab order. Finance links a bill to it separately; until
    /// then the order cannot leave the ordered state.
    pub async fn create_order(
        &self,
        request: CreateLabOrderRequest,
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<LabOrder, LabError> {
        if request.test_name.trim().is_empty() {
            return Err(LabError::ValidationError("Test name is required".to_string()));
        }

        let now = Utc::now();
        let order_data = json!({
            "hospital_id": ctx.hospital_id,
            "patient_id": request.patient_id,
            "test_name": request.test_name,
            "status": LabOrderStatus::Ordered.to_string(),
            "bill_id": null,
            "result": null,
            "ordered_by": ctx.actor_id,
            "ordered_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339(),
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/lab_orders",
            Some(auth_token),
            Some(order_data),
            Some(headers),
        ).await.map_err(LabError::from_db)?;

        if result.is_empty() {
            return Err(LabError::DatabaseError("Failed to create lab order".to_string()));
        }

        let order: LabOrder = serde_json::from_value(result[0].clone())
            .map_err(|e| LabError::DatabaseError(format!("Failed to parse lab order: {}", e)))?;

        info!("Lab order {} placed for patient {}", order.id, request.patient_id);
        Ok(order)
    }

    /// Get lab order by ID
    pub async fn get_order(
        &self,
        order_id: Uuid,
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<LabOrder, LabError> {
        debug!("Fetching lab order: {}", order_id);

        let path = format!(
            "/rest/v1/lab_orders?id=eq.{}&hospital_id=eq.{}",
            order_id, ctx.hospital_id
        );
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(LabError::from_db)?;

        if result.is_empty() {
            return Err(LabError::NotFound);
        }

        let order: LabOrder = serde_json::from_value(result[0].clone())
            .map_err(|e| LabError::DatabaseError(format!("Failed to parse lab order: {}", e)))?;

        Ok(order)
    }

    /// Advance a lab order one step. A payment-gated step re-reads the linked
    /// bill and rejects without touching the order when it is not settled.
    pub async fn advance(
        &self,
        order_id: Uuid,
        new_status: LabOrderStatus,
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<LabOrder, LabError> {
        let order = self.get_order(order_id, ctx, auth_token).await?;

        if !self.get_valid_transitions(&order.status).contains(&new_status) {
            warn!("Invalid lab order transition attempted: {} -> {}", order.status, new_status);
            return Err(LabError::InvalidStatusTransition(order.status));
        }

        if self.is_payment_gated(&order.status, &new_status) {
            match self.billing_service.bill_for_lab_order(&order, ctx, auth_token).await? {
                None => {
                    warn!("Lab order {} blocked: no bill linked", order.id);
                    return Err(LabError::BillNotLinked);
                },
                Some(bill) if !bill.is_settled() => {
                    info!("Lab order {} blocked: {:.2} outstanding on bill {}",
                          order.id, bill.outstanding(), bill.id);
                    return Err(LabError::PaymentRequired { outstanding: bill.outstanding() });
                },
                Some(_) => {},
            }
        }

        let update_data = json!({
            "status": new_status.to_string(),
            "updated_at": Utc::now().to_rfc3339(),
        });

        let updated = self.patch_order(order_id, update_data, ctx, auth_token).await?;

        info!("Lab order {} moved {} -> {}", order_id, order.status, new_status);
        Ok(updated)
    }

    /// Enter the test result. Completion is implicit here and carries no
    /// further payment check - the gate sits earlier in the workflow.
    pub async fn record_result(
        &self,
        order_id: Uuid,
        request: RecordResultRequest,
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<LabOrder, LabError> {
        let order = self.get_order(order_id, ctx, auth_token).await?;

        if order.status != LabOrderStatus::InProgress {
            return Err(LabError::InvalidStatusTransition(order.status));
        }

        let update_data = json!({
            "status": LabOrderStatus::Completed.to_string(),
            "result": request.result,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let updated = self.patch_order(order_id, update_data, ctx, auth_token).await?;

        info!("Lab order {} completed with result", order_id);
        Ok(updated)
    }

    async fn patch_order(
        &self,
        order_id: Uuid,
        update_data: Value,
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<LabOrder, LabError> {
        let path = format!(
            "/rest/v1/lab_orders?id=eq.{}&hospital_id=eq.{}",
            order_id, ctx.hospital_id
        );
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(update_data),
            Some(headers),
        ).await.map_err(LabError::from_db)?;

        if result.is_empty() {
            return Err(LabError::DatabaseError("Failed to update lab order".to_string()));
        }

        let order: LabOrder = serde_json::from_value(result[0].clone())
            .map_err(|e| LabError::DatabaseError(format!("Failed to parse lab order: {}", e)))?;

        Ok(order)
    }
}
