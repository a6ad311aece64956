// libs/appointment-cell/src/services/appointments.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    Appointment, AppointmentSearchQuery, AppointmentStatus, CreateAppointmentRequest,
    SchedulingError,
};
use crate::services::interval::Interval;
use crate::services::notify::{HttpNotifier, NotificationKind, Notifier};

/// Owns the appointments table and its exclusivity invariants: no two
/// non-cancelled appointments for one doctor may overlap, and the public
/// orthodontics path additionally forbids two bookings at the same start.
pub struct AppointmentService {
    supabase: Arc<SupabaseClient>,
    notifier: Arc<dyn Notifier>,
}

impl AppointmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_parts(
            Arc::new(SupabaseClient::new(config)),
            Arc::new(HttpNotifier::new(config)),
        )
    }

    pub fn with_parts(supabase: Arc<SupabaseClient>, notifier: Arc<dyn Notifier>) -> Self {
        Self { supabase, notifier }
    }

    /// List appointments ordered by start time ascending. Filters are ANDed;
    /// the date range only applies when both ends are supplied and is passed
    /// through as the caller's literal timestamps, both ends inclusive.
    pub async fn list(
        &self,
        query: &AppointmentSearchQuery,
        auth_token: Option<&str>,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let mut path = String::from("/rest/v1/appointments?order=start_time.asc");

        if let Some(doctor_id) = query.doctor_id {
            path.push_str(&format!("&doctor_id=eq.{}", doctor_id));
        }
        if let (Some(start), Some(end)) = (&query.start_date, &query.end_date) {
            path.push_str(&format!(
                "&start_time=gte.{}&end_time=lte.{}",
                urlencoding::encode(start),
                urlencoding::encode(end)
            ));
        }

        let appointments = self
            .supabase
            .request::<Vec<Appointment>>(Method::GET, &path, auth_token, None)
            .await?;

        Ok(appointments)
    }

    /// Create an appointment through the protected path. When a doctor is
    /// named, any overlapping non-cancelled appointment of theirs is a
    /// conflict; with no doctor there is nothing to collide with. On success
    /// an "appointment created" notification is dispatched best-effort.
    pub async fn create(
        &self,
        request: CreateAppointmentRequest,
        auth_token: Option<&str>,
    ) -> Result<Appointment, SchedulingError> {
        if request.start_time >= request.end_time {
            return Err(SchedulingError::Validation(
                "Start time must be before end time".to_string(),
            ));
        }

        if let Some(doctor_id) = request.doctor_id {
            let requested = Interval::new(request.start_time, request.end_time);
            let candidates = self
                .doctor_appointments_overlapping(doctor_id, &requested, auth_token)
                .await?;

            for appointment in &candidates {
                let existing = Interval::new(appointment.start_time, appointment.end_time);
                if requested.overlaps(&existing) {
                    warn!(
                        "Doctor {} already booked {}..{} (appointment {})",
                        doctor_id, appointment.start_time, appointment.end_time, appointment.id
                    );
                    return Err(SchedulingError::Conflict(
                        "The doctor already has an appointment in this time range".to_string(),
                    ));
                }
            }
        }

        let appointment = self
            .insert_record(&request, AppointmentStatus::Pending, auth_token)
            .await?;

        self.notifier
            .notify(
                NotificationKind::AppointmentCreated,
                json!({
                    "appointment_id": appointment.id,
                    "patient_id": appointment.patient_id,
                    "start_time": format_ts(&appointment.start_time),
                    "reason": appointment.reason.clone().unwrap_or_else(|| "Consultation".to_string()),
                }),
            )
            .await;

        info!("Appointment {} created", appointment.id);
        Ok(appointment)
    }

    /// Set a new status. Any status in the set may follow any other; the
    /// transition itself is deliberately not validated.
    pub async fn update_status(
        &self,
        appointment_id: i64,
        status: AppointmentStatus,
        auth_token: Option<&str>,
    ) -> Result<Appointment, SchedulingError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let body = json!({
            "status": status.to_string(),
            "updated_at": format_ts(&Utc::now().naive_utc()),
        });

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let updated: Vec<Appointment> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, auth_token, Some(body), Some(headers))
            .await?;

        let appointment = updated
            .into_iter()
            .next()
            .ok_or(SchedulingError::AppointmentNotFound)?;

        info!("Appointment {} status set to {}", appointment_id, status);
        Ok(appointment)
    }

    /// Non-cancelled appointments whose start falls inside the fixed
    /// `[date 00:00, date 23:59]` window used by the availability calculator.
    pub async fn non_cancelled_in_day(
        &self,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let day_start = format!("{}T00:00:00", date);
        let day_end = format!("{}T23:59:00", date);
        let path = format!(
            "/rest/v1/appointments?start_time=gte.{}&start_time=lte.{}&status=neq.cancelled",
            urlencoding::encode(&day_start),
            urlencoding::encode(&day_end)
        );

        let appointments = self
            .supabase
            .request::<Vec<Appointment>>(Method::GET, &path, auth_token, None)
            .await?;

        Ok(appointments)
    }

    /// Non-cancelled appointments starting at exactly this instant. The
    /// orthodontics booking path treats any hit as a taken slot.
    pub async fn find_at_exact_start(
        &self,
        start_time: NaiveDateTime,
        auth_token: Option<&str>,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let path = format!(
            "/rest/v1/appointments?start_time=eq.{}&status=neq.cancelled",
            urlencoding::encode(&format_ts(&start_time))
        );

        let appointments = self
            .supabase
            .request::<Vec<Appointment>>(Method::GET, &path, auth_token, None)
            .await?;

        Ok(appointments)
    }

    /// Insert the row itself, without conflict checks or notification. The
    /// callers decide which guards apply; the database constraints have the
    /// final word on exclusivity either way.
    pub(crate) async fn insert_record(
        &self,
        request: &CreateAppointmentRequest,
        status: AppointmentStatus,
        auth_token: Option<&str>,
    ) -> Result<Appointment, SchedulingError> {
        let body = json!({
            "patient_id": request.patient_id,
            "doctor_id": request.doctor_id,
            "start_time": format_ts(&request.start_time),
            "end_time": format_ts(&request.end_time),
            "reason": request.reason,
            "status": status.to_string(),
            "appointment_type": request.appointment_type.to_string(),
        });

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let created: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                auth_token,
                Some(body),
                Some(headers),
            )
            .await?;

        created.into_iter().next().ok_or_else(|| {
            SchedulingError::Database("Insert returned no appointment row".to_string())
        })
    }

    /// Candidate conflicts for a doctor: non-cancelled rows the database
    /// already filtered to the overlap window. The caller re-checks each one
    /// with the interval model.
    async fn doctor_appointments_overlapping(
        &self,
        doctor_id: i64,
        requested: &Interval<NaiveDateTime>,
        auth_token: Option<&str>,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        debug!(
            "Checking conflicts for doctor {} from {} to {}",
            doctor_id, requested.start, requested.end
        );

        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&status=neq.cancelled&start_time=lt.{}&end_time=gt.{}",
            doctor_id,
            urlencoding::encode(&format_ts(&requested.end)),
            urlencoding::encode(&format_ts(&requested.start))
        );

        let appointments = self
            .supabase
            .request::<Vec<Appointment>>(Method::GET, &path, auth_token, None)
            .await?;

        Ok(appointments)
    }
}

/// Timestamps go to PostgREST in the unzoned `YYYY-MM-DDTHH:MM:SS` form the
/// columns store; nothing converts or normalizes them.
pub(crate) fn format_ts(value: &NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S").to_string()
}
