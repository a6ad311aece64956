use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use shared_config::AppConfig;
use shared_models::auth::User;

type HmacSha256 = Hmac<Sha256>;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub notifications_service_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            notifications_service_url: "http://localhost:8004".to_string(),
        }
    }
}

impl TestConfig {
    /// Point the database layer at a wiremock server.
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            notifications_service_url: self.notifications_service_url.clone(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: 1,
            email: "staff@example.com".to_string(),
            role: "staff".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(id: i64, email: &str, role: &str) -> Self {
        Self {
            id,
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.to_string(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    /// Mint a signed HS256 token the way the validation side expects it.
    pub fn create_token(user: &TestUser, secret: &str, expires_in_secs: i64) -> String {
        let header = json!({"alg": "HS256", "typ": "JWT"});
        let now = Utc::now().timestamp();
        let claims = json!({
            "sub": user.id.to_string(),
            "email": user.email,
            "role": user.role,
            "iat": now,
            "exp": now + expires_in_secs,
        });

        let header_b64 = URL_SAFE_NO_PAD.encode(header.to_string());
        let claims_b64 = URL_SAFE_NO_PAD.encode(claims.to_string());
        let signing_input = format!("{}.{}", header_b64, claims_b64);

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(signing_input.as_bytes());
        let signature_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{}.{}", signing_input, signature_b64)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_token(user, secret, -3600)
    }
}

/// Canned PostgREST row payloads matching db/schema.sql.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn ortho_block(id: i64, date: &str, start_time: &str, end_time: &str) -> serde_json::Value {
        json!({
            "id": id,
            "date": date,
            "start_time": start_time,
            "end_time": end_time,
            "label": "Orthodontics",
            "created_by": 1,
            "created_at": "2026-01-01T00:00:00"
        })
    }

    pub fn appointment(
        id: i64,
        patient_id: i64,
        doctor_id: Option<i64>,
        start_time: &str,
        end_time: &str,
        status: &str,
        appointment_type: &str,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "start_time": start_time,
            "end_time": end_time,
            "reason": "General checkup",
            "status": status,
            "appointment_type": appointment_type,
            "created_at": "2026-01-01T00:00:00",
            "updated_at": "2026-01-01T00:00:00"
        })
    }
}
