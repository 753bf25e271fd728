// libs/lab-cell/tests/workflow_test.rs
//
// Lab order workflow against a mocked datastore: the payment gate re-reads
// the linked bill and blocks without mutating the order.

use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::{Mock, MockServer, ResponseTemplate};
use wiremock::matchers::{method, path};

use lab_cell::models::{LabError, LabOrderStatus, RecordResultRequest};
use lab_cell::services::workflow::LabWorkflowService;
use shared_models::auth::RequestContext;
use shared_utils::test_utils::{TestConfig, TestUser};

struct TestSetup {
    workflow: LabWorkflowService,
    mock_server: MockServer,
    ctx: RequestContext,
    auth_token: String,
}

impl TestSetup {
    async fn new() -> Self {
        let mock_server = MockServer::start().await;
        let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
        let user = TestUser::new("lab@example.com", "lab_technician");

        Self {
            workflow: LabWorkflowService::new(&config),
            mock_server,
            ctx: user.to_context(),
            auth_token: "test_token".to_string(),
        }
    }

    fn order_row(&self, order_id: Uuid, status: &str, bill_id: Option<Uuid>) -> serde_json::Value {
        json!({
            "id": order_id,
            "hospital_id": self.ctx.hospital_id,
            "patient_id": Uuid::new_v4(),
            "test_name": "Full blood count",
            "status": status,
            "bill_id": bill_id,
            "result": null,
            "ordered_by": self.ctx.actor_id,
            "ordered_at": "2025-06-20T09:00:00Z",
            "updated_at": "2025-06-20T09:00:00Z"
        })
    }

    fn bill_row(&self, bill_id: Uuid, amount: f64, amount_paid: f64) -> serde_json::Value {
        json!({
            "id": bill_id,
            "hospital_id": self.ctx.hospital_id,
            "patient_id": Uuid::new_v4(),
            "amount": amount,
            "amount_paid": amount_paid,
            "paid": amount_paid >= amount,
            "created_at": "2025-06-20T09:05:00Z"
        })
    }
}

#[tokio::test]
async fn unpaid_bill_blocks_sample_collection_without_mutation() {
    let setup = TestSetup::new().await;
    let order_id = Uuid::new_v4();
    let bill_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/lab_orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            setup.order_row(order_id, "ordered", Some(bill_id)),
        ]))
        .mount(&setup.mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/bills"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            setup.bill_row(bill_id, 5000.0, 0.0),
        ]))
        .mount(&setup.mock_server)
        .await;

    // The order row must not be touched
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/lab_orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .expect(0)
        .mount(&setup.mock_server)
        .await;

    let result = setup.workflow
        .advance(order_id, LabOrderStatus::SampleCollected, &setup.ctx, &setup.auth_token)
        .await;

    assert_matches!(result, Err(LabError::PaymentRequired { outstanding }) if outstanding == 5000.0);
}

#[tokio::test]
async fn settled_bill_allows_sample_collection() {
    let setup = TestSetup::new().await;
    let order_id = Uuid::new_v4();
    let bill_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/lab_orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            setup.order_row(order_id, "ordered", Some(bill_id)),
        ]))
        .mount(&setup.mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/bills"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            setup.bill_row(bill_id, 5000.0, 5000.0),
        ]))
        .mount(&setup.mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/lab_orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            setup.order_row(order_id, "sample_collected", Some(bill_id)),
        ]))
        .expect(1)
        .mount(&setup.mock_server)
        .await;

    let order = setup.workflow
        .advance(order_id, LabOrderStatus::SampleCollected, &setup.ctx, &setup.auth_token)
        .await
        .unwrap();

    assert_eq!(order.status, LabOrderStatus::SampleCollected);
}

#[tokio::test]
async fn missing_bill_blocks_the_gated_step() {
    let setup = TestSetup::new().await;
    let order_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/lab_orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            setup.order_row(order_id, "ordered", None),
        ]))
        .mount(&setup.mock_server)
        .await;

    let result = setup.workflow
        .advance(order_id, LabOrderStatus::SampleCollected, &setup.ctx, &setup.auth_token)
        .await;

    assert_matches!(result, Err(LabError::BillNotLinked));
}

#[tokio::test]
async fn processing_start_is_payment_gated_too() {
    let setup = TestSetup::new().await;
    let order_id = Uuid::new_v4();
    let bill_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/lab_orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            setup.order_row(order_id, "sample_collected", Some(bill_id)),
        ]))
        .mount(&setup.mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/bills"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            setup.bill_row(bill_id, 1200.0, 600.0),
        ]))
        .mount(&setup.mock_server)
        .await;

    let result = setup.workflow
        .advance(order_id, LabOrderStatus::InProgress, &setup.ctx, &setup.auth_token)
        .await;

    assert_matches!(result, Err(LabError::PaymentRequired { outstanding }) if outstanding == 600.0);
}

#[tokio::test]
async fn states_never_move_backwards_or_skip_ahead() {
    let setup = TestSetup::new().await;
    let order_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/lab_orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            setup.order_row(order_id, "ordered", None),
        ]))
        .mount(&setup.mock_server)
        .await;

    let skip = setup.workflow
        .advance(order_id, LabOrderStatus::Completed, &setup.ctx, &setup.auth_token)
        .await;
    assert_matches!(skip, Err(LabError::InvalidStatusTransition(LabOrderStatus::Ordered)));

    let backwards = setup.workflow
        .advance(order_id, LabOrderStatus::Ordered, &setup.ctx, &setup.auth_token)
        .await;
    assert_matches!(backwards, Err(LabError::InvalidStatusTransition(LabOrderStatus::Ordered)));
}

#[tokio::test]
async fn entering_a_result_completes_without_a_payment_recheck() {
    let setup = TestSetup::new().await;
    let order_id = Uuid::new_v4();
    let bill_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/lab_orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            setup.order_row(order_id, "in_progress", Some(bill_id)),
        ]))
        .mount(&setup.mock_server)
        .await;

    // No bill fetch on completion - the gate sits earlier in the workflow
    Mock::given(method("GET"))
        .and(path("/rest/v1/bills"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .expect(0)
        .mount(&setup.mock_server)
        .await;

    let mut completed = setup.order_row(order_id, "completed", Some(bill_id));
    completed["result"] = json!("WBC 6.1, RBC 4.8, within reference ranges");
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/lab_orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![completed]))
        .expect(1)
        .mount(&setup.mock_server)
        .await;

    let request = RecordResultRequest {
        result: "WBC 6.1, RBC 4.8, within reference ranges".to_string(),
    };

    let order = setup.workflow
        .record_result(order_id, request, &setup.ctx, &setup.auth_token)
        .await
        .unwrap();

    assert_eq!(order.status, LabOrderStatus::Completed);
    assert!(order.result.is_some());
}

#[tokio::test]
async fn results_cannot_be_entered_before_processing() {
    let setup = TestSetup::new().await;
    let order_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/lab_orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            setup.order_row(order_id, "ordered", None),
        ]))
        .mount(&setup.mock_server)
        .await;

    let request = RecordResultRequest { result: "premature".to_string() };

    let result = setup.workflow
        .record_result(order_id, request, &setup.ctx, &setup.auth_token)
        .await;

    assert_matches!(result, Err(LabError::InvalidStatusTransition(LabOrderStatus::Ordered)));
}
