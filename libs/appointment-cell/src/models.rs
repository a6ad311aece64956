// libs/appointment-cell/src/models.rs
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use shared_database::supabase::DbError;

// ==============================================================================
// CORE SCHEDULING MODELS
// ==============================================================================

/// A staff-defined open window on a date during which orthodontics slots may
/// be booked. `start_time`/`end_time` are fixed-width zero-padded `"HH:MM"`
/// strings; comparisons on them are lexicographic, which is safe only because
/// the format never varies. Blocks are created and deleted, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrthoBlock {
    pub id: i64,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub label: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: Option<i64>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub reason: Option<String>,
    pub status: AppointmentStatus,
    pub appointment_type: AppointmentType,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    General,
    Orthodontics,
}

impl Default for AppointmentType {
    fn default() -> Self {
        AppointmentType::General
    }
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentType::General => write!(f, "general"),
            AppointmentType::Orthodontics => write!(f, "orthodontics"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub patient_id: i64,
    pub doctor_id: Option<i64>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub reason: Option<String>,
    #[serde(default)]
    pub appointment_type: AppointmentType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAppointmentStatusRequest {
    pub status: AppointmentStatus,
}

/// Filters for the protected appointment listing. The date range is carried
/// as the literal timestamp strings the caller supplied; both ends are
/// inclusive and no timezone normalization is applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentSearchQuery {
    pub doctor_id: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrthoBlockRequest {
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicBookingRequest {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date: NaiveDate,
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub date: String,
    pub available: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingReceipt {
    pub message: String,
    pub appointment_id: i64,
    pub date: String,
    pub time: String,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum SchedulingError {
    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Ortho block not found")]
    BlockNotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<DbError> for SchedulingError {
    fn from(err: DbError) -> Self {
        match err {
            // A 409 from the storage layer means a unique/exclusion constraint
            // caught a race our pre-check missed; still a domain conflict.
            DbError::Conflict(msg) => SchedulingError::Conflict(msg),
            other => SchedulingError::Database(other.to_string()),
        }
    }
}
