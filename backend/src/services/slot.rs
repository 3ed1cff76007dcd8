//! Slot service: loads slot reference data and computes checkout availability

use chrono::{Local, NaiveTime};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{slots_for_days, DayOfWeek, DaySlots, Slot};
use shared::validation;

use crate::error::{AppError, AppResult};

/// Slot service for the checkout availability calculator
#[derive(Clone)]
pub struct SlotService {
    db: PgPool,
    default_days: u32,
}

#[derive(FromRow)]
struct SlotRow {
    id: Uuid,
    label: String,
    start_time: NaiveTime,
    end_time: NaiveTime,
    available_on_days: Vec<String>,
    min_lead_time_minutes: i64,
    max_orders: i32,
    is_active: bool,
}

impl SlotRow {
    fn into_slot(self) -> AppResult<Slot> {
        let mut days = Vec::with_capacity(self.available_on_days.len());
        for day in &self.available_on_days {
            days.push(DayOfWeek::from_str(day).ok_or_else(|| {
                AppError::Internal(format!("Unknown weekday '{}' in slot {}", day, self.id))
            })?);
        }
        Ok(Slot {
            id: self.id,
            label: self.label,
            start_time: self.start_time,
            end_time: self.end_time,
            available_on_days: days,
            min_lead_time_minutes: self.min_lead_time_minutes,
            max_orders: self.max_orders,
            is_active: self.is_active,
        })
    }
}

impl SlotService {
    /// Create a new SlotService instance
    pub fn new(db: PgPool, default_days: u32) -> Self {
        Self { db, default_days }
    }

    /// Valid delivery slots for the next `days` days (server-local time),
    /// starting today. Falls back to the configured day count; the window
    /// is bounded either way.
    pub async fn available_slots(&self, days: Option<u32>) -> AppResult<Vec<DaySlots>> {
        let day_count = days.unwrap_or(self.default_days);
        validation::validate_slot_window(day_count).map_err(|e| AppError::Validation {
            field: "days".to_string(),
            message: e.to_string(),
        })?;

        let rows = sqlx::query_as::<_, SlotRow>(
            r#"
            SELECT id, label, start_time, end_time, available_on_days,
                   min_lead_time_minutes, max_orders, is_active
            FROM slots
            WHERE is_active = TRUE
            ORDER BY start_time
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut slots = Vec::with_capacity(rows.len());
        for row in rows {
            slots.push(row.into_slot()?);
        }

        Ok(slots_for_days(&slots, day_count, Local::now().naive_local()))
    }
}
