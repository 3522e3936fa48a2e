use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Redirect, Response},
    routing::get,
    Form, Router,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::warn;

use crate::{
    error::AppError,
    flash,
    journal::reconcile::{day_path, reflection_path},
    models::{
        day::{Day, DayFields, DayLocation},
        place::Place,
        trip::Trip,
    },
    routes::normalize_optional,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/trips/:trip_id/days/:day_number",
        get(day_form).post(day_submit),
    )
}

/// Raw day form values. Kept as strings so a rejected submission can be
/// shown again exactly as typed.
#[derive(Debug, Default, Deserialize)]
struct DayForm {
    is_travel_day: Option<String>,
    #[serde(default)]
    location: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    lat: String,
    #[serde(default)]
    lng: String,
    #[serde(default)]
    leaving_city: String,
    #[serde(default)]
    leaving_country: String,
    #[serde(default)]
    leaving_lat: String,
    #[serde(default)]
    leaving_lng: String,
    #[serde(default)]
    arriving_city: String,
    #[serde(default)]
    arriving_country: String,
    #[serde(default)]
    arriving_lat: String,
    #[serde(default)]
    arriving_lng: String,
    #[serde(default)]
    highlight: String,
    #[serde(default)]
    journal_entry: String,
    #[serde(default)]
    notable_things: String,
}

impl DayForm {
    fn is_travel(&self) -> bool {
        self.is_travel_day.is_some()
    }

    fn from_day(day: &Day) -> Self {
        let mut form = Self {
            highlight: text(&day.fields.highlight),
            journal_entry: text(&day.fields.journal_entry),
            notable_things: text(&day.fields.notable_things),
            ..Self::default()
        };
        match &day.fields.location {
            DayLocation::Stay(place) => {
                form.location = text(&place.name);
                form.country = text(&place.country);
                form.lat = coordinate_text(place.lat);
                form.lng = coordinate_text(place.lng);
            }
            DayLocation::Travel { leaving, arriving } => {
                form.is_travel_day = Some("true".into());
                form.leaving_city = text(&leaving.name);
                form.leaving_country = text(&leaving.country);
                form.leaving_lat = coordinate_text(leaving.lat);
                form.leaving_lng = coordinate_text(leaving.lng);
                form.arriving_city = text(&arriving.name);
                form.arriving_country = text(&arriving.country);
                form.arriving_lat = coordinate_text(arriving.lat);
                form.arriving_lng = coordinate_text(arriving.lng);
            }
        }
        form
    }

    /// Only the fields of the selected shape are carried over; values left
    /// in the hidden half of the form are discarded.
    fn to_fields(&self) -> Result<DayFields, AppError> {
        let location = if self.is_travel() {
            DayLocation::Travel {
                leaving: place(
                    &self.leaving_city,
                    &self.leaving_country,
                    &self.leaving_lat,
                    &self.leaving_lng,
                )?,
                arriving: place(
                    &self.arriving_city,
                    &self.arriving_country,
                    &self.arriving_lat,
                    &self.arriving_lng,
                )?,
            }
        } else {
            DayLocation::Stay(place(&self.location, &self.country, &self.lat, &self.lng)?)
        };
        Ok(DayFields {
            location,
            highlight: normalize_optional(Some(self.highlight.clone())),
            journal_entry: normalize_optional(Some(self.journal_entry.clone())),
            notable_things: normalize_optional(Some(self.notable_things.clone())),
        })
    }
}

fn place(name: &str, country: &str, lat: &str, lng: &str) -> Result<Place, AppError> {
    Ok(Place {
        name: normalize_optional(Some(name.to_string())),
        country: normalize_optional(Some(country.to_string())),
        lat: parse_coordinate(lat, "latitude")?,
        lng: parse_coordinate(lng, "longitude")?,
    })
}

fn parse_coordinate(value: &str, what: &str) -> Result<Option<f64>, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| AppError::validation(format!("'{value}' is not a valid {what}.")))
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn coordinate_text(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

struct NavDay {
    day_number: u32,
    current: bool,
}

#[derive(Template)]
#[template(path = "day.html")]
struct DayTemplate {
    trip_name: String,
    action: String,
    day_number: u32,
    date: String,
    nav: Vec<NavDay>,
    nav_base: String,
    reflection_url: String,
    is_last_day: bool,
    form: DayForm,
    error: Option<String>,
    notice: Option<String>,
}

fn render_day(
    trip: &Trip,
    day_number: u32,
    date: NaiveDate,
    form: DayForm,
    error: Option<String>,
    notice: Option<String>,
) -> DayTemplate {
    DayTemplate {
        trip_name: trip.name.clone(),
        action: day_path(&trip.id, day_number),
        day_number,
        date: date.format("%m/%d/%Y").to_string(),
        nav: trip
            .calendar()
            .into_iter()
            .map(|day| NavDay {
                day_number: day.day_number,
                current: day.day_number == day_number,
            })
            .collect(),
        nav_base: format!("/trips/{}/days", trip.id),
        reflection_url: reflection_path(&trip.id),
        is_last_day: day_number == trip.total_days(),
        form,
        error,
        notice,
    }
}

async fn day_form(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path((trip_id, day_number)): Path<(String, u32)>,
) -> Result<Response, AppError> {
    let Some(trip) = state.store.get_trip(&trip_id).await? else {
        warn!(%trip_id, "day requested for unknown trip");
        return Ok(Redirect::to("/journal").into_response());
    };
    let date = trip.date_for_day(day_number)?;

    // no record yet just means the day hasn't been filled in
    let (form, error) = match state.store.get_day(&trip.id, day_number).await {
        Ok(Some(day)) => (DayForm::from_day(&day), None),
        Ok(None) => (DayForm::default(), None),
        Err(err) => {
            warn!(%trip_id, day_number, error = %err, "could not load day, showing empty form");
            (DayForm::default(), Some(err.user_message()))
        }
    };

    let (jar, notice) = flash::take(jar);
    let template = render_day(&trip, day_number, date, form, error, notice);
    Ok((jar, AskamaTemplateResponse::into_response(template)).into_response())
}

async fn day_submit(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path((trip_id, day_number)): Path<(String, u32)>,
    Form(form): Form<DayForm>,
) -> Result<Response, AppError> {
    let Some(trip) = state.store.get_trip(&trip_id).await? else {
        warn!(%trip_id, "save requested for unknown trip");
        return Ok(Redirect::to("/journal").into_response());
    };
    let date = trip.date_for_day(day_number)?;

    let result = match form.to_fields() {
        Ok(fields) => {
            state
                .reconciler()
                .save_for_trip(&trip, day_number, fields)
                .await
        }
        Err(err) => Err(err),
    };

    match result {
        Ok(saved) => {
            let jar = flash::set(jar, format!("Day {day_number} saved successfully!"));
            Ok((jar, Redirect::to(&saved.next.path(&trip.id))).into_response())
        }
        Err(err @ AppError::OutOfRange { .. }) => Err(err),
        Err(err) => {
            warn!(%trip_id, day_number, error = %err, "saving day failed");
            let status: StatusCode = err.status();
            let template = render_day(&trip, day_number, date, form, Some(err.user_message()), None);
            Ok((status, AskamaTemplateResponse::into_response(template)).into_response())
        }
    }
}
