// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, NaiveDate, NaiveTime};
use serde_json::json;
use tracing::{info, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    AppointmentStatus, AppointmentType, BookingReceipt, CreateAppointmentRequest,
    PublicBookingRequest, SchedulingError,
};
use crate::services::appointments::AppointmentService;
use crate::services::blocks::OrthoBlockService;
use crate::services::interval::{minutes_from_hhmm, SLOT_MINUTES};
use crate::services::notify::{HttpNotifier, NotificationKind, Notifier};

/// The public orthodontics booking path: validate the requested slot against
/// the date's blocks and existing appointments, commit the appointment, and
/// send a confirmation email as a side effect the caller never waits on.
pub struct PublicBookingService {
    blocks: OrthoBlockService,
    appointments: AppointmentService,
    notifier: Arc<dyn Notifier>,
}

impl PublicBookingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        let notifier: Arc<dyn Notifier> = Arc::new(HttpNotifier::new(config));
        Self {
            blocks: OrthoBlockService::with_client(Arc::clone(&supabase)),
            appointments: AppointmentService::with_parts(supabase, Arc::clone(&notifier)),
            notifier,
        }
    }

    pub fn with_parts(
        blocks: OrthoBlockService,
        appointments: AppointmentService,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { blocks, appointments, notifier }
    }

    pub async fn book(
        &self,
        request: PublicBookingRequest,
    ) -> Result<BookingReceipt, SchedulingError> {
        let full_name = request.full_name.trim();
        if full_name.len() < 2 {
            return Err(SchedulingError::Validation(
                "full_name must be at least 2 characters".to_string(),
            ));
        }
        if request.email.len() < 5 {
            return Err(SchedulingError::Validation(
                "email must be at least 5 characters".to_string(),
            ));
        }
        let slot_minutes = minutes_from_hhmm(&request.time).ok_or_else(|| {
            SchedulingError::Validation("time must be a zero-padded HH:MM value".to_string())
        })?;

        // A block covers the slot when start_time <= time < end_time. The
        // stored times are fixed-width HH:MM, so the string comparison is
        // equivalent to the numeric one.
        let blocks = self.blocks.blocks_for_date(request.date, None).await?;
        let covered = blocks.iter().any(|block| {
            block.start_time.as_str() <= request.time.as_str()
                && request.time.as_str() < block.end_time.as_str()
        });
        if !covered {
            return Err(SchedulingError::Validation(
                "This slot is not available for orthodontics".to_string(),
            ));
        }

        let start_time = request.date.and_time(
            NaiveTime::from_num_seconds_from_midnight_opt(slot_minutes * 60, 0).ok_or_else(
                || SchedulingError::Validation("time is out of range".to_string()),
            )?,
        );
        let end_time = start_time + ChronoDuration::minutes(SLOT_MINUTES as i64);

        let taken = self.appointments.find_at_exact_start(start_time, None).await?;
        if !taken.is_empty() {
            warn!("Public booking raced on slot {} {}", request.date, request.time);
            return Err(SchedulingError::Conflict(
                "This slot was just taken. Choose another".to_string(),
            ));
        }

        // No patient record is resolved or created here; the placeholder id
        // marks web bookings until reception links them to a real patient.
        let appointment = self
            .appointments
            .insert_record(
                &CreateAppointmentRequest {
                    patient_id: 0,
                    doctor_id: None,
                    start_time,
                    end_time,
                    reason: Some(format!("Orthodontics – {}", full_name)),
                    appointment_type: AppointmentType::Orthodontics,
                },
                AppointmentStatus::Pending,
                None,
            )
            .await?;

        self.notifier
            .notify(
                NotificationKind::Email,
                json!({
                    "to": request.email,
                    "subject": "Orthodontics Appointment Confirmation",
                    "body": format!(
                        "Hello {},\n\nYour orthodontics appointment has been booked for {} at {}.\n\nDental Clinic",
                        full_name, request.date, request.time
                    ),
                }),
            )
            .await;

        info!(
            "Public orthodontics booking {} committed for {} {}",
            appointment.id, request.date, request.time
        );

        Ok(BookingReceipt {
            message: "Orthodontics appointment booked successfully".to_string(),
            appointment_id: appointment.id,
            date: request.date.to_string(),
            time: request.time,
        })
    }
}
