use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::appointment_routes;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

async fn body_json(body: Body) -> Value {
    let bytes = to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_public_availability_needs_no_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/ortho_blocks"))
        .and(query_param("date", "eq.2030-06-03"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::ortho_block(1, "2030-06-03", "10:00", "11:00")
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let app = appointment_routes(TestConfig::with_supabase_url(&server.uri()).to_arc());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/public/availability?date=2030-06-03")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["date"], "2030-06-03");
    assert_eq!(body["available"], json!(["10:00", "10:30"]));
}

#[tokio::test]
async fn test_public_availability_rejects_malformed_date() {
    let app = appointment_routes(TestConfig::default().to_arc());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/public/availability?date=03-06-2030")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_protected_route_without_token_is_unauthorized() {
    let app = appointment_routes(TestConfig::default().to_arc());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/appointments")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_rejects_bad_signature() {
    let config = TestConfig::default();
    let token = JwtTestUtils::create_token(&TestUser::default(), "some-other-secret", 3600);

    let app = appointment_routes(config.to_arc());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/appointments")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_accepts_valid_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment(
                3, 5, Some(7),
                "2030-06-03T10:00:00", "2030-06-03T11:00:00",
                "confirmed", "general",
            )
        ])))
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri());
    let token = JwtTestUtils::create_token(&TestUser::default(), &config.jwt_secret, 3600);

    let app = appointment_routes(config.to_arc());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/appointments")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body[0]["id"], 3);
}

#[tokio::test]
async fn test_booking_conflict_maps_to_409() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/ortho_blocks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::ortho_block(1, "2030-06-03", "10:00", "12:00")
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment(
                40, 0, None,
                "2030-06-03T10:30:00", "2030-06-03T11:00:00",
                "pending", "orthodontics",
            )
        ])))
        .mount(&server)
        .await;

    let app = appointment_routes(TestConfig::with_supabase_url(&server.uri()).to_arc());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/public/book-ortho")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "full_name": "Ana Pérez",
                        "email": "ana@example.com",
                        "date": "2030-06-03",
                        "time": "10:30",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["error"], "This slot was just taken. Choose another");
}
