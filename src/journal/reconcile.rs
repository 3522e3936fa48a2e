//! Persists a day's entry and decides where the editor goes next.
//!
//! A save always replaces the whole record for `(trip_id, day_number)`
//! with exactly the supplied fields. Nothing from an earlier save survives,
//! so switching a day between the stay and travel shapes can't leave stale
//! fields behind.

use tracing::info;

use crate::{
    error::AppError,
    models::{
        day::{Day, DayFields},
        trip::Trip,
    },
    services::store::JournalStore,
};

/// Where the per-day editor goes after a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    Day(u32),
    Reflection,
}

impl NextStep {
    pub fn path(&self, trip_id: &str) -> String {
        match self {
            NextStep::Day(day_number) => day_path(trip_id, *day_number),
            NextStep::Reflection => reflection_path(trip_id),
        }
    }
}

pub fn day_path(trip_id: &str, day_number: u32) -> String {
    format!("/trips/{trip_id}/days/{day_number}")
}

pub fn reflection_path(trip_id: &str) -> String {
    format!("/trips/{trip_id}/reflection")
}

pub fn decide_next(day_number: u32, total_days: u32) -> NextStep {
    if day_number < total_days {
        NextStep::Day(day_number + 1)
    } else {
        NextStep::Reflection
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavedDay {
    pub day: Day,
    pub next: NextStep,
}

#[derive(Clone)]
pub struct DayReconciler {
    store: JournalStore,
}

impl DayReconciler {
    pub fn new(store: JournalStore) -> Self {
        Self { store }
    }

    pub async fn save(
        &self,
        trip_id: &str,
        day_number: u32,
        fields: DayFields,
    ) -> Result<SavedDay, AppError> {
        let trip = self.store.require_trip(trip_id).await?;
        self.save_for_trip(&trip, day_number, fields).await
    }

    pub async fn save_for_trip(
        &self,
        trip: &Trip,
        day_number: u32,
        fields: DayFields,
    ) -> Result<SavedDay, AppError> {
        let date = trip.date_for_day(day_number)?;
        fields.validate()?;

        let day = Day {
            trip_id: trip.id.clone(),
            day_number,
            date,
            fields,
        };
        self.store.replace_day(&day).await?;

        let next = decide_next(day_number, trip.total_days());
        info!(trip_id = %trip.id, day_number, %date, ?next, "day saved");
        Ok(SavedDay { day, next })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_until_the_last_day() {
        assert_eq!(decide_next(3, 5), NextStep::Day(4));
        assert_eq!(decide_next(1, 2), NextStep::Day(2));
        assert_eq!(decide_next(5, 5), NextStep::Reflection);
        assert_eq!(decide_next(1, 1), NextStep::Reflection);
    }

    #[test]
    fn next_step_paths() {
        assert_eq!(NextStep::Day(4).path("abc"), "/trips/abc/days/4");
        assert_eq!(NextStep::Reflection.path("abc"), "/trips/abc/reflection");
    }
}
