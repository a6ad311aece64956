// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    Appointment, AppointmentSearchQuery, AvailabilityResponse, BookingReceipt,
    CreateAppointmentRequest, CreateOrthoBlockRequest, OrthoBlock, PublicBookingRequest,
    SchedulingError, UpdateAppointmentStatusRequest,
};
use crate::services::appointments::AppointmentService;
use crate::services::availability::AvailabilityService;
use crate::services::blocks::OrthoBlockService;
use crate::services::booking::PublicBookingService;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: String,
}

fn to_app_error(err: SchedulingError) -> AppError {
    match err {
        SchedulingError::AppointmentNotFound => {
            AppError::NotFound("Appointment not found".to_string())
        }
        SchedulingError::BlockNotFound => AppError::NotFound("Ortho block not found".to_string()),
        SchedulingError::Validation(msg) => AppError::ValidationError(msg),
        SchedulingError::Conflict(msg) => AppError::Conflict(msg),
        SchedulingError::Database(msg) => AppError::Database(msg),
    }
}

// ==============================================================================
// PROTECTED: APPOINTMENTS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<AppointmentSearchQuery>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let service = AppointmentService::new(&state);

    let appointments = service
        .list(&query, Some(auth.token()))
        .await
        .map_err(to_app_error)?;

    Ok(Json(appointments))
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let service = AppointmentService::new(&state);

    let appointment = service
        .create(request, Some(auth.token()))
        .await
        .map_err(to_app_error)?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<UpdateAppointmentStatusRequest>,
) -> Result<Json<Appointment>, AppError> {
    let service = AppointmentService::new(&state);

    let appointment = service
        .update_status(appointment_id, request.status, Some(auth.token()))
        .await
        .map_err(to_app_error)?;

    Ok(Json(appointment))
}

// ==============================================================================
// PROTECTED: ORTHO BLOCKS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_ortho_blocks(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Vec<OrthoBlock>>, AppError> {
    let service = OrthoBlockService::new(&state);

    let blocks = service
        .list(Some(auth.token()))
        .await
        .map_err(to_app_error)?;

    Ok(Json(blocks))
}

#[axum::debug_handler]
pub async fn create_ortho_block(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateOrthoBlockRequest>,
) -> Result<(StatusCode, Json<OrthoBlock>), AppError> {
    let service = OrthoBlockService::new(&state);

    let block = service
        .create(request, user.subject_id(), Some(auth.token()))
        .await
        .map_err(to_app_error)?;

    Ok((StatusCode::CREATED, Json(block)))
}

#[axum::debug_handler]
pub async fn delete_ortho_block(
    State(state): State<Arc<AppConfig>>,
    Path(block_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<StatusCode, AppError> {
    let service = OrthoBlockService::new(&state);

    service
        .delete(block_id, Some(auth.token()))
        .await
        .map_err(to_app_error)?;

    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// PUBLIC: AVAILABILITY & BOOKING
// ==============================================================================

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let date = NaiveDate::parse_from_str(&query.date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("date must be YYYY-MM-DD".to_string()))?;

    let service = AvailabilityService::new(&state);

    let availability = service.compute(date, None).await.map_err(to_app_error)?;

    Ok(Json(availability))
}

#[axum::debug_handler]
pub async fn get_ortho_dates(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(&state);

    let dates = service.bookable_dates(None).await.map_err(to_app_error)?;

    Ok(Json(json!({ "dates": dates })))
}

#[axum::debug_handler]
pub async fn book_ortho(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<PublicBookingRequest>,
) -> Result<(StatusCode, Json<BookingReceipt>), AppError> {
    let service = PublicBookingService::new(&state);

    let receipt = service.book(request).await.map_err(to_app_error)?;

    Ok((StatusCode::CREATED, Json(receipt)))
}
