use chrono::Utc;
use sqlx::{sqlite::SqliteRow, types::Json, Row};
use tracing::{debug, warn};

use crate::{
    db::DbPool,
    error::AppError,
    journal::calendar,
    models::{
        day::{Day, DayFields, DayLocation},
        place::{Coordinates, Place},
        trip::{Reflection, Trip, TripDetails},
    },
};

const TRIP_COLUMNS: &str = "id, name, start_date, end_date, trip_type, final_reflection, \
     what_to_do_next_time, photo_url, created_at";

const DAY_COLUMNS: &str = "trip_id, day_number, date, is_travel_day, location, country, lat, lng, \
     leaving_city, leaving_country, leaving_lat, leaving_lng, \
     arriving_city, arriving_country, arriving_lat, arriving_lng, \
     highlight, journal_entry, notable_things";

/// Handle on the `trips`, `trip_days` and `locations_cache` tables.
/// Built once at startup and cloned into whoever needs it.
#[derive(Clone)]
pub struct JournalStore {
    db: DbPool,
}

impl JournalStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &DbPool {
        &self.db
    }

    pub async fn create_trip(&self, details: TripDetails) -> Result<Trip, AppError> {
        details.validate()?;
        let trip = Trip::new(details);
        sqlx::query(
            r#"INSERT INTO trips (id, name, start_date, end_date, trip_type, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&trip.id)
        .bind(&trip.name)
        .bind(trip.start_date)
        .bind(trip.end_date)
        .bind(Json(&trip.trip_type))
        .bind(trip.created_at)
        .execute(&self.db)
        .await?;
        debug!(trip_id = %trip.id, "trip created");
        Ok(trip)
    }

    pub async fn list_trips(&self) -> Result<Vec<Trip>, AppError> {
        let sql = format!("SELECT {TRIP_COLUMNS} FROM trips ORDER BY start_date DESC, created_at DESC");
        let rows = sqlx::query(&sql).fetch_all(&self.db).await?;
        rows.iter().map(trip_from_row).collect()
    }

    pub async fn get_trip(&self, trip_id: &str) -> Result<Option<Trip>, AppError> {
        let sql = format!("SELECT {TRIP_COLUMNS} FROM trips WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(trip_id)
            .fetch_optional(&self.db)
            .await?;
        row.as_ref().map(trip_from_row).transpose()
    }

    pub async fn require_trip(&self, trip_id: &str) -> Result<Trip, AppError> {
        self.get_trip(trip_id).await?.ok_or(AppError::NotFound)
    }

    pub async fn random_trip(&self) -> Result<Option<Trip>, AppError> {
        let sql = format!("SELECT {TRIP_COLUMNS} FROM trips ORDER BY RANDOM() LIMIT 1");
        let row = sqlx::query(&sql).fetch_optional(&self.db).await?;
        row.as_ref().map(trip_from_row).transpose()
    }

    pub async fn update_trip_details(
        &self,
        trip_id: &str,
        details: &TripDetails,
    ) -> Result<(), AppError> {
        details.validate()?;
        let result = sqlx::query(
            r#"UPDATE trips SET name = ?, start_date = ?, end_date = ?, trip_type = ? WHERE id = ?"#,
        )
        .bind(&details.name)
        .bind(details.start_date)
        .bind(details.end_date)
        .bind(Json(&details.trip_type))
        .bind(trip_id)
        .execute(&self.db)
        .await?;
        expect_one_row(result.rows_affected())?;
        self.realign_days(trip_id, details).await?;
        Ok(())
    }

    pub async fn save_reflection(
        &self,
        trip_id: &str,
        details: &TripDetails,
        reflection: &Reflection,
    ) -> Result<(), AppError> {
        details.validate()?;
        let result = sqlx::query(
            r#"UPDATE trips
               SET name = ?, start_date = ?, end_date = ?, trip_type = ?,
                   final_reflection = ?, what_to_do_next_time = ?
               WHERE id = ?"#,
        )
        .bind(&details.name)
        .bind(details.start_date)
        .bind(details.end_date)
        .bind(Json(&details.trip_type))
        .bind(&reflection.final_reflection)
        .bind(&reflection.what_to_do_next_time)
        .bind(trip_id)
        .execute(&self.db)
        .await?;
        expect_one_row(result.rows_affected())?;
        self.realign_days(trip_id, details).await?;
        Ok(())
    }

    /// Keeps stored days consistent with a trip's (possibly changed) range:
    /// days past the new end are dropped and every remaining `date` is
    /// re-derived from its day number.
    async fn realign_days(&self, trip_id: &str, details: &TripDetails) -> Result<(), AppError> {
        let total_days = calendar::span_len(details.start_date, details.end_date);
        let dropped = sqlx::query("DELETE FROM trip_days WHERE trip_id = ? AND day_number > ?")
            .bind(trip_id)
            .bind(total_days)
            .execute(&self.db)
            .await?
            .rows_affected();
        if dropped > 0 {
            warn!(%trip_id, dropped, total_days, "dropped days outside the new trip range");
        }
        sqlx::query(
            r#"UPDATE trip_days SET date = date(?, '+' || (day_number - 1) || ' days')
               WHERE trip_id = ?"#,
        )
        .bind(details.start_date)
        .bind(trip_id)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    pub async fn set_trip_photo(&self, trip_id: &str, photo_url: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE trips SET photo_url = ? WHERE id = ?")
            .bind(photo_url)
            .bind(trip_id)
            .execute(&self.db)
            .await?;
        expect_one_row(result.rows_affected())
    }

    /// Removes a trip and its days. Days go first so no day ever outlives
    /// its trip, even if the second statement fails.
    pub async fn delete_trip(&self, trip_id: &str) -> Result<u64, AppError> {
        let days = sqlx::query("DELETE FROM trip_days WHERE trip_id = ?")
            .bind(trip_id)
            .execute(&self.db)
            .await?
            .rows_affected();
        let trips = sqlx::query("DELETE FROM trips WHERE id = ?")
            .bind(trip_id)
            .execute(&self.db)
            .await?
            .rows_affected();
        expect_one_row(trips)?;
        debug!(%trip_id, days, "trip deleted");
        Ok(days)
    }

    pub async fn get_day(&self, trip_id: &str, day_number: u32) -> Result<Option<Day>, AppError> {
        let sql = format!("SELECT {DAY_COLUMNS} FROM trip_days WHERE trip_id = ? AND day_number = ?");
        let row = sqlx::query(&sql)
            .bind(trip_id)
            .bind(day_number)
            .fetch_optional(&self.db)
            .await?;
        row.as_ref().map(day_from_row).transpose()
    }

    pub async fn all_days(&self) -> Result<Vec<Day>, AppError> {
        let sql = format!("SELECT {DAY_COLUMNS} FROM trip_days ORDER BY date, trip_id, day_number");
        let rows = sqlx::query(&sql).fetch_all(&self.db).await?;
        rows.iter().map(day_from_row).collect()
    }

    /// First recorded highlight of a trip, by day order.
    pub async fn first_highlight(&self, trip_id: &str) -> Result<Option<String>, AppError> {
        let highlight = sqlx::query_scalar::<_, String>(
            r#"SELECT highlight FROM trip_days
               WHERE trip_id = ? AND highlight IS NOT NULL AND highlight <> ''
               ORDER BY day_number LIMIT 1"#,
        )
        .bind(trip_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(highlight)
    }

    pub async fn count_days(&self, trip_id: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM trip_days WHERE trip_id = ?")
            .bind(trip_id)
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    pub async fn delete_day(&self, trip_id: &str, day_number: u32) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM trip_days WHERE trip_id = ? AND day_number = ?")
            .bind(trip_id)
            .bind(day_number)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn insert_day(&self, day: &Day) -> Result<(), AppError> {
        let (stay, leaving, arriving) = match &day.fields.location {
            DayLocation::Stay(place) => (Some(place), None, None),
            DayLocation::Travel { leaving, arriving } => (None, Some(leaving), Some(arriving)),
        };
        let sql = format!(
            "INSERT INTO trip_days ({DAY_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
        sqlx::query(&sql)
            .bind(&day.trip_id)
            .bind(day.day_number)
            .bind(day.date)
            .bind(day.is_travel_day())
            .bind(stay.and_then(|p| p.name.clone()))
            .bind(stay.and_then(|p| p.country.clone()))
            .bind(stay.and_then(|p| p.lat))
            .bind(stay.and_then(|p| p.lng))
            .bind(leaving.and_then(|p| p.name.clone()))
            .bind(leaving.and_then(|p| p.country.clone()))
            .bind(leaving.and_then(|p| p.lat))
            .bind(leaving.and_then(|p| p.lng))
            .bind(arriving.and_then(|p| p.name.clone()))
            .bind(arriving.and_then(|p| p.country.clone()))
            .bind(arriving.and_then(|p| p.lat))
            .bind(arriving.and_then(|p| p.lng))
            .bind(&day.fields.highlight)
            .bind(&day.fields.journal_entry)
            .bind(&day.fields.notable_things)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Replaces whatever is stored under the day's key with `day`.
    ///
    /// The delete and the insert are two separate statements. If the insert
    /// fails the key is left empty, which reads the same as a day that was
    /// never filled in, so the caller can simply retry.
    pub async fn replace_day(&self, day: &Day) -> Result<(), AppError> {
        let removed = self.delete_day(&day.trip_id, day.day_number).await?;
        debug!(trip_id = %day.trip_id, day_number = day.day_number, removed, "cleared day before insert");
        self.insert_day(day).await
    }

    pub async fn cached_coordinates(&self, city: &str) -> Result<Option<Coordinates>, AppError> {
        let row = sqlx::query("SELECT lat, lng FROM locations_cache WHERE city_name = ?")
            .bind(city)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(|row| Coordinates::new(row.get("lat"), row.get("lng"))))
    }

    pub async fn cache_coordinates(
        &self,
        city: &str,
        coordinates: Coordinates,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO locations_cache (city_name, lat, lng, cached_at) VALUES (?, ?, ?, ?)
               ON CONFLICT(city_name) DO UPDATE SET lat = excluded.lat, lng = excluded.lng"#,
        )
        .bind(city)
        .bind(coordinates.lat)
        .bind(coordinates.lng)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;
        Ok(())
    }
}

fn expect_one_row(rows_affected: u64) -> Result<(), AppError> {
    if rows_affected == 0 {
        Err(AppError::NotFound)
    } else {
        Ok(())
    }
}

fn trip_from_row(row: &SqliteRow) -> Result<Trip, AppError> {
    let trip_type: Json<Vec<String>> = row.try_get("trip_type")?;
    Ok(Trip {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        trip_type: trip_type.0,
        final_reflection: row.try_get("final_reflection")?,
        what_to_do_next_time: row.try_get("what_to_do_next_time")?,
        photo_url: row.try_get("photo_url")?,
        created_at: row.try_get("created_at")?,
    })
}

fn place_from_row(row: &SqliteRow, prefix: &str, name_column: &str) -> Result<Place, AppError> {
    Ok(Place {
        name: row.try_get(name_column)?,
        country: row.try_get(format!("{prefix}country").as_str())?,
        lat: row.try_get(format!("{prefix}lat").as_str())?,
        lng: row.try_get(format!("{prefix}lng").as_str())?,
    })
}

fn day_from_row(row: &SqliteRow) -> Result<Day, AppError> {
    let is_travel_day: bool = row.try_get("is_travel_day")?;
    let location = if is_travel_day {
        DayLocation::Travel {
            leaving: place_from_row(row, "leaving_", "leaving_city")?,
            arriving: place_from_row(row, "arriving_", "arriving_city")?,
        }
    } else {
        DayLocation::Stay(place_from_row(row, "", "location")?)
    };
    Ok(Day {
        trip_id: row.try_get("trip_id")?,
        day_number: row.try_get("day_number")?,
        date: row.try_get("date")?,
        fields: DayFields {
            location,
            highlight: row.try_get("highlight")?,
            journal_entry: row.try_get("journal_entry")?,
            notable_things: row.try_get("notable_things")?,
        },
    })
}
