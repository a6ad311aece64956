use assert_matches::assert_matches;
use chrono::{Duration, NaiveDate, Utc};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::{CreateOrthoBlockRequest, SchedulingError};
use appointment_cell::services::OrthoBlockService;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

fn block_request(date: NaiveDate, start: &str, end: &str) -> CreateOrthoBlockRequest {
    CreateOrthoBlockRequest {
        date,
        start_time: start.to_string(),
        end_time: end.to_string(),
        label: Some("Orthodontics".to_string()),
    }
}

fn future_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 6, 3).unwrap()
}

#[tokio::test]
async fn test_create_block_succeeds() {
    let server = MockServer::start().await;
    let date = future_date();

    Mock::given(method("GET"))
        .and(path("/rest/v1/ortho_blocks"))
        .and(query_param("date", "eq.2030-06-03"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/ortho_blocks"))
        .and(body_partial_json(json!({
            "date": "2030-06-03",
            "start_time": "10:00",
            "end_time": "12:00",
            "created_by": 7,
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::ortho_block(1, "2030-06-03", "10:00", "12:00")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let service = OrthoBlockService::new(&config);

    let block = service
        .create(block_request(date, "10:00", "12:00"), Some(7), None)
        .await
        .unwrap();

    assert_eq!(block.id, 1);
    assert_eq!(block.start_time, "10:00");
    assert_eq!(block.end_time, "12:00");
}

#[tokio::test]
async fn test_create_block_rejects_overlap_on_same_date() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/ortho_blocks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::ortho_block(1, "2030-06-03", "10:00", "12:00")
        ])))
        .mount(&server)
        .await;

    // No POST mock is mounted; reaching the insert would fail the test.
    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let service = OrthoBlockService::new(&config);

    let result = service
        .create(block_request(future_date(), "11:00", "13:00"), None, None)
        .await;

    assert_matches!(result, Err(SchedulingError::Conflict(_)));
}

#[tokio::test]
async fn test_create_block_allows_touching_windows() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/ortho_blocks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::ortho_block(1, "2030-06-03", "10:00", "12:00")
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/ortho_blocks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::ortho_block(2, "2030-06-03", "12:00", "13:00")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let service = OrthoBlockService::new(&config);

    let block = service
        .create(block_request(future_date(), "12:00", "13:00"), None, None)
        .await
        .unwrap();

    assert_eq!(block.id, 2);
}

#[tokio::test]
async fn test_create_block_rejects_inverted_window() {
    let config = TestConfig::default().to_app_config();
    let service = OrthoBlockService::new(&config);

    let result = service
        .create(block_request(future_date(), "12:00", "10:00"), None, None)
        .await;

    assert_matches!(result, Err(SchedulingError::Validation(msg)) => {
        assert_eq!(msg, "Start time must be before end time");
    });
}

#[tokio::test]
async fn test_create_block_rejects_zero_length_window() {
    let config = TestConfig::default().to_app_config();
    let service = OrthoBlockService::new(&config);

    let result = service
        .create(block_request(future_date(), "10:00", "10:00"), None, None)
        .await;

    assert_matches!(result, Err(SchedulingError::Validation(_)));
}

#[tokio::test]
async fn test_create_block_rejects_unpadded_time() {
    let config = TestConfig::default().to_app_config();
    let service = OrthoBlockService::new(&config);

    let result = service
        .create(block_request(future_date(), "9:00", "12:00"), None, None)
        .await;

    assert_matches!(result, Err(SchedulingError::Validation(_)));
}

#[tokio::test]
async fn test_create_block_rejects_past_date() {
    let config = TestConfig::default().to_app_config();
    let service = OrthoBlockService::new(&config);

    let yesterday = Utc::now().date_naive() - Duration::days(1);
    let result = service
        .create(block_request(yesterday, "10:00", "12:00"), None, None)
        .await;

    assert_matches!(result, Err(SchedulingError::Validation(msg)) => {
        assert_eq!(msg, "Cannot create a block on a past date");
    });
}

#[tokio::test]
async fn test_delete_block_leaves_appointments_alone() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/ortho_blocks"))
        .and(query_param("id", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::ortho_block(1, "2030-06-03", "10:00", "12:00")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    // Deleting a block must never touch the appointments table.
    Mock::given(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let service = OrthoBlockService::new(&config);

    service.delete(1, None).await.unwrap();
}

#[tokio::test]
async fn test_delete_missing_block_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/ortho_blocks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let service = OrthoBlockService::new(&config);

    let result = service.delete(99, None).await;

    assert_matches!(result, Err(SchedulingError::BlockNotFound));
}

#[tokio::test]
async fn test_list_orders_by_date() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/ortho_blocks"))
        .and(query_param("order", "date.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::ortho_block(1, "2030-06-03", "10:00", "12:00"),
            MockSupabaseResponses::ortho_block(2, "2030-06-04", "09:00", "11:00"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let service = OrthoBlockService::new(&config);

    let blocks = service.list(None).await.unwrap();

    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].id, 1);
}

#[tokio::test]
async fn test_bookable_dates_deduplicates_adjacent_rows() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/ortho_blocks"))
        .and(query_param("select", "date"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"date": "2030-06-03"},
            {"date": "2030-06-03"},
            {"date": "2030-06-04"},
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let service = OrthoBlockService::new(&config);

    let dates = service.bookable_dates(None).await.unwrap();

    assert_eq!(dates, vec!["2030-06-03", "2030-06-04"]);
}

#[tokio::test]
async fn test_storage_conflict_surfaces_as_conflict() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/ortho_blocks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    // A concurrent create can slip past the pre-check; the exclusion
    // constraint answers with 409 and that must stay a conflict.
    Mock::given(method("POST"))
        .and(path("/rest/v1/ortho_blocks"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "conflicting key value violates exclusion constraint"
        })))
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let service = OrthoBlockService::new(&config);

    let result = service
        .create(block_request(future_date(), "10:00", "12:00"), None, None)
        .await;

    assert_matches!(result, Err(SchedulingError::Conflict(_)));
}
