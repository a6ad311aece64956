// libs/appointment-cell/src/services/availability.rs
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, Timelike};
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AvailabilityResponse, SchedulingError};
use crate::services::appointments::AppointmentService;
use crate::services::blocks::{block_window, OrthoBlockService};
use crate::services::interval::slot_starts;
use crate::services::notify::HttpNotifier;

/// Derives the free 30-minute slots of a date: every slot the date's ortho
/// blocks offer, minus the start times already taken by non-cancelled
/// appointments. Read-only and side-effect free.
pub struct AvailabilityService {
    blocks: OrthoBlockService,
    appointments: AppointmentService,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            blocks: OrthoBlockService::with_client(Arc::clone(&supabase)),
            appointments: AppointmentService::with_parts(
                supabase,
                Arc::new(HttpNotifier::new(config)),
            ),
        }
    }

    pub fn with_services(blocks: OrthoBlockService, appointments: AppointmentService) -> Self {
        Self { blocks, appointments }
    }

    pub async fn compute(
        &self,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<AvailabilityResponse, SchedulingError> {
        let blocks = self.blocks.blocks_for_date(date, auth_token).await?;
        if blocks.is_empty() {
            return Ok(AvailabilityResponse {
                date: date.to_string(),
                available: vec![],
            });
        }

        // Slots come out block by block, each block's times ascending; that
        // generation order is the response order.
        let mut all_slots = Vec::new();
        for block in &blocks {
            let Some(window) = block_window(block) else {
                warn!("Skipping malformed block {} during slot generation", block.id);
                continue;
            };
            all_slots.extend(slot_starts(window));
        }

        // Booked labels are the hour:minute of each stored start timestamp,
        // read off as-is.
        let booked = self.appointments.non_cancelled_in_day(date, auth_token).await?;
        let taken: HashSet<String> = booked
            .iter()
            .map(|appointment| {
                format!(
                    "{:02}:{:02}",
                    appointment.start_time.hour(),
                    appointment.start_time.minute()
                )
            })
            .collect();

        let available: Vec<String> = all_slots
            .into_iter()
            .filter(|slot| !taken.contains(slot))
            .collect();

        debug!("{} slots available on {}", available.len(), date);

        Ok(AvailabilityResponse {
            date: date.to_string(),
            available,
        })
    }

    /// Dates with at least one block, today or later.
    pub async fn bookable_dates(
        &self,
        auth_token: Option<&str>,
    ) -> Result<Vec<String>, SchedulingError> {
        self.blocks.bookable_dates(auth_token).await
    }
}
