//! Delivery slot reference data and the slot availability calculator
//!
//! The calculator is pure and deterministic: callers pass `now` explicitly,
//! so cutoff and boundary behavior is exhaustively unit-testable.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Day of the week a slot is offered on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Monday" => Some(DayOfWeek::Monday),
            "Tuesday" => Some(DayOfWeek::Tuesday),
            "Wednesday" => Some(DayOfWeek::Wednesday),
            "Thursday" => Some(DayOfWeek::Thursday),
            "Friday" => Some(DayOfWeek::Friday),
            "Saturday" => Some(DayOfWeek::Saturday),
            "Sunday" => Some(DayOfWeek::Sunday),
        _ => None,
        }
    }

    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

/// A bounded delivery time window offered at checkout.
///
/// Read-only reference data at order time; orders store a [`SlotSnapshot`]
/// so later edits never alter placed orders.
///
/// [`SlotSnapshot`]: crate::models::SlotSnapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    pub label: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub available_on_days: Vec<DayOfWeek>,
    /// Minimum buffer between `now` and the slot start for the slot to be
    /// offered, in minutes
    pub min_lead_time_minutes: i64,
    pub max_orders: i32,
    pub is_active: bool,
}

impl Slot {
    /// A slot is valid for `candidate_date` iff it is active, offered on that
    /// weekday, and its start is at least `min_lead_time_minutes` after `now`.
    pub fn is_valid(&self, candidate_date: NaiveDate, now: NaiveDateTime) -> bool {
        if !self.is_active {
            return false;
        }
        let day = DayOfWeek::from_weekday(candidate_date.weekday());
        if !self.available_on_days.contains(&day) {
            return false;
        }
        let slot_start = candidate_date.and_time(self.start_time);
        slot_start.signed_duration_since(now) >= Duration::minutes(self.min_lead_time_minutes)
    }

    fn view_for(&self, date: NaiveDate) -> SlotView {
        SlotView {
            id: self.id,
            label: self.label.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            available: true,
            date,
        }
    }
}

/// A slot formatted for a concrete date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    pub id: Uuid,
    pub label: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub available: bool,
    pub date: NaiveDate,
}

/// Valid slots for one day, labeled "today" or "day{n}"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySlots {
    pub day: String,
    pub date: NaiveDate,
    pub slots: Vec<SlotView>,
}

/// Compute the valid slots for `day_count` consecutive days starting from
/// the date of `now`. Day 0 is labeled "today", day `i` is "day{i+1}".
pub fn slots_for_days(slots: &[Slot], day_count: u32, now: NaiveDateTime) -> Vec<DaySlots> {
    (0..day_count)
        .map(|i| {
            let date = now.date() + Duration::days(i64::from(i));
            DaySlots {
                day: if i == 0 {
                    "today".to_string()
                } else {
                    format!("day{}", i + 1)
                },
                date,
                slots: slots
                    .iter()
                    .filter(|s| s.is_valid(date, now))
                    .map(|s| s.view_for(date))
                    .collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(start: &str, lead_minutes: i64, days: &[DayOfWeek]) -> Slot {
        Slot {
            id: Uuid::new_v4(),
            label: "Morning".to_string(),
            start_time: start.parse().unwrap(),
            end_time: "11:00:00".parse().unwrap(),
            available_on_days: days.to_vec(),
            min_lead_time_minutes: lead_minutes,
            max_orders: 100,
            is_active: true,
        }
    }

    #[test]
    fn inactive_slot_is_never_valid() {
        let mut s = slot("09:30:00", 0, &DayOfWeek::ALL);
        s.is_active = false;
        let now = "2025-06-02T00:00:00".parse().unwrap();
        assert!(!s.is_valid("2025-06-02".parse().unwrap(), now));
    }

    #[test]
    fn cutoff_boundary_is_inclusive() {
        let s = slot("09:30:00", 60, &DayOfWeek::ALL);
        let date: NaiveDate = "2025-06-02".parse().unwrap();
        // Exactly 60 minutes before the start: still valid
        assert!(s.is_valid(date, "2025-06-02T08:30:00".parse().unwrap()));
        // One second past the cutoff: invalid
        assert!(!s.is_valid(date, "2025-06-02T08:30:01".parse().unwrap()));
    }

    #[test]
    fn weekday_filter_applies() {
        // 2025-06-02 is a Monday
        let s = slot("09:30:00", 0, &[DayOfWeek::Tuesday]);
        let now = "2025-06-01T00:00:00".parse().unwrap();
        assert!(!s.is_valid("2025-06-02".parse().unwrap(), now));
        assert!(s.is_valid("2025-06-03".parse().unwrap(), now));
    }

    #[test]
    fn day_labels_follow_original_scheme() {
        let s = slot("09:30:00", 0, &DayOfWeek::ALL);
        let days = slots_for_days(&[s], 3, "2025-06-02T00:00:00".parse().unwrap());
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].day, "today");
        assert_eq!(days[1].day, "day2");
        assert_eq!(days[2].day, "day3");
    }
}
