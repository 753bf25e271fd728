// libs/triage-cell/tests/queue_fetch_test.rs
//
// Queue derivation against a mocked datastore: the fetch joins vitals with
// same-day open appointments and recomputes the order from scratch.

use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;
use wiremock::{Mock, MockServer, ResponseTemplate};
use wiremock::matchers::{method, path};

use shared_utils::test_utils::{TestConfig, TestUser};
use triage_cell::services::queue::TriageQueueService;

#[tokio::test]
async fn queue_for_date_joins_vitals_with_open_appointments() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let user = TestUser::new("nurse@example.com", "nurse");
    let ctx = user.to_context();

    let walk_in = Uuid::new_v4();
    let booked_patient = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/vital_signs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            json!({
                "id": Uuid::new_v4(),
                "hospital_id": ctx.hospital_id,
                "patient_id": walk_in,
                "temperature_celsius": 39.5,
                "heart_rate_bpm": null,
                "systolic_mmhg": null,
                "diastolic_mmhg": null,
                "oxygen_saturation_pct": null,
                "weight_kg": null,
                "complaints": "Fever since last night",
                "recorded_by": ctx.actor_id,
                "recorded_at": "2025-06-20T08:10:00Z"
            }),
            json!({
                "id": Uuid::new_v4(),
                "hospital_id": ctx.hospital_id,
                "patient_id": booked_patient,
                "temperature_celsius": 36.8,
                "heart_rate_bpm": 72,
                "systolic_mmhg": 118,
                "diastolic_mmhg": 76,
                "oxygen_saturation_pct": 99.0,
                "weight_kg": 70.5,
                "complaints": null,
                "recorded_by": ctx.actor_id,
                "recorded_at": "2025-06-20T08:05:00Z"
            }),
        ]))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            json!({
                "id": Uuid::new_v4(),
                "hospital_id": ctx.hospital_id,
                "patient_id": booked_patient,
                "doctor_id": null,
                "scheduled_date": "2025-06-20",
                "start_time": "09:00",
                "end_time": "09:15",
                "status": "scheduled",
                "notes": null,
                "created_by": ctx.actor_id,
                "created_at": "2025-06-19T15:00:00Z",
                "updated_at": "2025-06-19T15:00:00Z"
            }),
        ]))
        .mount(&mock_server)
        .await;

    let queue_service = TriageQueueService::new(&config);
    let date = NaiveDate::from_ymd_opt(2025, 6, 20).unwrap();

    let queue = queue_service
        .queue_for_date(date, &ctx, "test_token")
        .await
        .unwrap();

    assert_eq!(queue.len(), 2);

    // Feverish walk-in outranks the healthy booked patient despite having no
    // appointment and a later check-in
    assert_eq!(queue[0].patient_id, walk_in);
    assert_eq!(queue[0].priority_score, 3);
    assert!(queue[0].appointment.is_none());

    assert_eq!(queue[1].patient_id, booked_patient);
    assert_eq!(queue[1].priority_score, 0);
    assert_eq!(
        queue[1].appointment.as_ref().unwrap().start_time.to_string(),
        "09:00"
    );
}
