// libs/appointment-cell/src/services/blocks.rs
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{CreateOrthoBlockRequest, OrthoBlock, SchedulingError};
use crate::services::interval::{minutes_from_hhmm, Interval};

/// Owns the ortho block table: recurring open-scheduling windows per date.
pub struct OrthoBlockService {
    supabase: Arc<SupabaseClient>,
}

impl OrthoBlockService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// All blocks, ordered by date ascending.
    pub async fn list(&self, auth_token: Option<&str>) -> Result<Vec<OrthoBlock>, SchedulingError> {
        let blocks = self
            .supabase
            .request::<Vec<OrthoBlock>>(
                Method::GET,
                "/rest/v1/ortho_blocks?order=date.asc",
                auth_token,
                None,
            )
            .await?;

        Ok(blocks)
    }

    /// Blocks on one date, in insertion order.
    pub async fn blocks_for_date(
        &self,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<OrthoBlock>, SchedulingError> {
        let path = format!("/rest/v1/ortho_blocks?date=eq.{}&order=id.asc", date);
        let blocks = self
            .supabase
            .request::<Vec<OrthoBlock>>(Method::GET, &path, auth_token, None)
            .await?;

        Ok(blocks)
    }

    /// Create a block after checking its invariants: a well-formed,
    /// non-inverted window, on a date that is not in the past, overlapping no
    /// existing block on the same date. The same-date exclusion constraint in
    /// the database backstops the overlap check against concurrent creates.
    pub async fn create(
        &self,
        request: CreateOrthoBlockRequest,
        created_by: Option<i64>,
        auth_token: Option<&str>,
    ) -> Result<OrthoBlock, SchedulingError> {
        let start = minutes_from_hhmm(&request.start_time).ok_or_else(|| {
            SchedulingError::Validation("start_time must be a zero-padded HH:MM value".to_string())
        })?;
        let end = minutes_from_hhmm(&request.end_time).ok_or_else(|| {
            SchedulingError::Validation("end_time must be a zero-padded HH:MM value".to_string())
        })?;

        if start >= end {
            return Err(SchedulingError::Validation(
                "Start time must be before end time".to_string(),
            ));
        }

        if request.date < Utc::now().date_naive() {
            return Err(SchedulingError::Validation(
                "Cannot create a block on a past date".to_string(),
            ));
        }

        let requested = Interval::new(start, end);
        let existing = self.blocks_for_date(request.date, auth_token).await?;
        for block in &existing {
            let Some(window) = block_window(block) else {
                warn!("Skipping malformed block {} during overlap check", block.id);
                continue;
            };
            if requested.overlaps(&window) {
                debug!(
                    "Block {}..{} on {} overlaps existing block {}",
                    request.start_time, request.end_time, request.date, block.id
                );
                return Err(SchedulingError::Conflict(
                    "A block already exists on that date and time range".to_string(),
                ));
            }
        }

        let body = json!({
            "date": request.date.to_string(),
            "start_time": request.start_time,
            "end_time": request.end_time,
            "label": request.label,
            "created_by": created_by,
        });

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let created: Vec<OrthoBlock> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/ortho_blocks",
                auth_token,
                Some(body),
                Some(headers),
            )
            .await?;

        let block = created.into_iter().next().ok_or_else(|| {
            SchedulingError::Database("Insert returned no ortho block row".to_string())
        })?;

        info!("Ortho block {} created on {}", block.id, block.date);
        Ok(block)
    }

    /// Remove a block permanently. Appointments already booked against it are
    /// left untouched.
    pub async fn delete(
        &self,
        block_id: i64,
        auth_token: Option<&str>,
    ) -> Result<(), SchedulingError> {
        let path = format!("/rest/v1/ortho_blocks?id=eq.{}", block_id);

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let deleted: Vec<OrthoBlock> = self
            .supabase
            .request_with_headers(Method::DELETE, &path, auth_token, None, Some(headers))
            .await?;

        if deleted.is_empty() {
            return Err(SchedulingError::BlockNotFound);
        }

        info!("Ortho block {} deleted", block_id);
        Ok(())
    }

    /// Distinct dates with at least one block, today or later. Drives the
    /// public calendar of bookable days.
    pub async fn bookable_dates(
        &self,
        auth_token: Option<&str>,
    ) -> Result<Vec<String>, SchedulingError> {
        let today = Utc::now().date_naive();
        let path = format!(
            "/rest/v1/ortho_blocks?select=date&date=gte.{}&order=date.asc",
            today
        );

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;

        let mut dates = Vec::new();
        for row in rows {
            if let Some(date) = row.get("date").and_then(Value::as_str) {
                if dates.last().map(String::as_str) != Some(date) {
                    dates.push(date.to_string());
                }
            }
        }

        Ok(dates)
    }
}

/// Minute-of-day window of a stored block, if its times parse.
pub fn block_window(block: &OrthoBlock) -> Option<Interval<u32>> {
    let start = minutes_from_hhmm(&block.start_time)?;
    let end = minutes_from_hhmm(&block.end_time)?;
    Some(Interval::new(start, end))
}
