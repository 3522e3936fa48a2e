use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;
use serde_with::{serde_as, NoneAsEmptyString};
use tracing::{info, warn};

use crate::{
    error::AppError,
    flash,
    journal::{
        calendar,
        hashtags,
        reconcile::{day_path, reflection_path},
    },
    models::trip::{Reflection, Trip, TripDetails},
    routes::normalize_optional,
    services::photos::MAX_PHOTO_BYTES,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/journal", get(journal))
        .route("/trips/new", get(new_trip_form).post(new_trip_submit))
        .route("/trips/:trip_id/edit", get(edit_trip_form).post(edit_trip_submit))
        .route(
            "/trips/:trip_id/photo",
            post(upload_photo).layer(DefaultBodyLimit::max(MAX_PHOTO_BYTES + 64 * 1024)),
        )
        .route("/trips/:trip_id/delete", post(delete_trip))
        .route(
            "/trips/:trip_id/reflection",
            get(reflection_form).post(reflection_submit),
        )
}

#[derive(Debug, Default, Deserialize)]
struct TripForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    start_date: String,
    #[serde(default)]
    end_date: String,
    #[serde(default)]
    trip_type: String,
}

impl TripForm {
    fn from_trip(trip: &Trip) -> Self {
        Self {
            name: trip.name.clone(),
            start_date: trip.start_date.format(calendar::DATE_FORMAT).to_string(),
            end_date: trip.end_date.format(calendar::DATE_FORMAT).to_string(),
            trip_type: hashtags::format_tags(&trip.trip_type),
        }
    }

    fn to_details(&self) -> Result<TripDetails, AppError> {
        let details = TripDetails {
            name: self.name.trim().to_string(),
            start_date: calendar::parse_date(&self.start_date)?,
            end_date: calendar::parse_date(&self.end_date)?,
            trip_type: hashtags::parse_tags(&self.trip_type),
        };
        details.validate()?;
        Ok(details)
    }
}

struct TripRow {
    id: String,
    name: String,
    dates: String,
    total_days: u32,
    recorded_days: i64,
    tags: String,
}

#[derive(Template)]
#[template(path = "journal.html")]
struct JournalTemplate {
    trips: Vec<TripRow>,
    notice: Option<String>,
}

async fn journal(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, AppError> {
    let trips = state.store.list_trips().await?;
    let mut rows = Vec::with_capacity(trips.len());
    for trip in trips {
        rows.push(TripRow {
            recorded_days: state.store.count_days(&trip.id).await?,
            dates: trip.date_range_text(),
            total_days: trip.total_days(),
            tags: hashtags::format_tags(&trip.trip_type),
            id: trip.id,
            name: trip.name,
        });
    }
    let (jar, notice) = flash::take(jar);
    Ok((
        jar,
        AskamaTemplateResponse::into_response(JournalTemplate {
            trips: rows,
            notice,
        }),
    ))
}

#[derive(Template)]
#[template(path = "trip_form.html")]
struct TripFormTemplate {
    heading: String,
    action: String,
    submit_label: String,
    form: TripForm,
    error: Option<String>,
    notice: Option<String>,
    trip_id: Option<String>,
    photo_url: Option<String>,
}

fn render_trip_form(template: TripFormTemplate, status: StatusCode) -> Response {
    (status, AskamaTemplateResponse::into_response(template)).into_response()
}

fn new_trip_template(form: TripForm, error: Option<String>) -> TripFormTemplate {
    TripFormTemplate {
        heading: "Add New Trip".into(),
        action: "/trips/new".into(),
        submit_label: "Save Trip".into(),
        form,
        error,
        notice: None,
        trip_id: None,
        photo_url: None,
    }
}

fn edit_trip_template(trip: &Trip, form: TripForm, error: Option<String>) -> TripFormTemplate {
    TripFormTemplate {
        heading: format!("Edit {}", trip.name),
        action: format!("/trips/{}/edit", trip.id),
        submit_label: "Save Changes".into(),
        form,
        error,
        notice: None,
        trip_id: Some(trip.id.clone()),
        photo_url: trip.photo_url.clone(),
    }
}

async fn new_trip_form() -> impl IntoResponse {
    render_trip_form(new_trip_template(TripForm::default(), None), StatusCode::OK)
}

async fn new_trip_submit(
    State(state): State<AppState>,
    Form(form): Form<TripForm>,
) -> Result<Response, AppError> {
    let details = match form.to_details() {
        Ok(details) => details,
        Err(AppError::Validation(msg)) => {
            return Ok(render_trip_form(
                new_trip_template(form, Some(msg)),
                StatusCode::BAD_REQUEST,
            ));
        }
        Err(err) => return Err(err),
    };

    match state.store.create_trip(details).await {
        Ok(trip) => {
            info!(trip_id = %trip.id, days = trip.total_days(), "trip created");
            Ok(Redirect::to(&day_path(&trip.id, 1)).into_response())
        }
        Err(err @ AppError::Database(_)) => {
            warn!(error = %err, "creating trip failed");
            Ok(render_trip_form(
                new_trip_template(form, Some(err.user_message())),
                err.status(),
            ))
        }
        Err(err) => Err(err),
    }
}

async fn edit_trip_form(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path(trip_id): Path<String>,
) -> Result<Response, AppError> {
    let trip = state.store.require_trip(&trip_id).await?;
    let (jar, notice) = flash::take(jar);
    let mut template = edit_trip_template(&trip, TripForm::from_trip(&trip), None);
    template.notice = notice;
    Ok((jar, render_trip_form(template, StatusCode::OK)).into_response())
}

async fn edit_trip_submit(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path(trip_id): Path<String>,
    Form(form): Form<TripForm>,
) -> Result<Response, AppError> {
    let trip = state.store.require_trip(&trip_id).await?;
    let result = match form.to_details() {
        Ok(details) => state.store.update_trip_details(&trip.id, &details).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => {
            info!(trip_id = %trip.id, "trip updated");
            let jar = flash::set(jar, "Trip updated successfully!");
            Ok((jar, Redirect::to("/journal")).into_response())
        }
        Err(err @ (AppError::Validation(_) | AppError::Database(_))) => {
            let status = err.status();
            Ok(render_trip_form(
                edit_trip_template(&trip, form, Some(err.user_message())),
                status,
            ))
        }
        Err(err) => Err(err),
    }
}

async fn upload_photo(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path(trip_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let trip = state.store.require_trip(&trip_id).await?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(format!("invalid upload: {err}")))?
    {
        if field.name() != Some("photo") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("photo").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::BadRequest(format!("invalid upload: {err}")))?;
        upload = Some((file_name, bytes));
        break;
    }

    let notice = match upload {
        None => "Please choose a photo to upload.".to_string(),
        Some((file_name, bytes)) => match state.photos.upload(&trip.id, &file_name, &bytes).await {
            Ok(url) => {
                state.store.set_trip_photo(&trip.id, &url).await?;
                "Photo uploaded successfully!".to_string()
            }
            Err(AppError::Validation(msg)) => msg,
            Err(err) => return Err(err),
        },
    };

    let jar = flash::set(jar, notice);
    Ok((jar, Redirect::to(&format!("/trips/{}/edit", trip.id))).into_response())
}

async fn delete_trip(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path(trip_id): Path<String>,
) -> Result<Response, AppError> {
    let trip = state.store.require_trip(&trip_id).await?;
    let notice = match state.store.delete_trip(&trip.id).await {
        Ok(days) => {
            info!(trip_id = %trip.id, days, "trip deleted");
            format!("Deleted \"{}\" and its {days} recorded days.", trip.name)
        }
        Err(err @ AppError::Database(_)) => {
            warn!(trip_id = %trip.id, error = %err, "deleting trip failed");
            err.user_message()
        }
        Err(err) => return Err(err),
    };
    let jar = flash::set(jar, notice);
    Ok((jar, Redirect::to("/journal")).into_response())
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
struct ReflectionForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    start_date: String,
    #[serde(default)]
    end_date: String,
    #[serde(default)]
    trip_type: String,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    final_reflection: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    what_to_do_next_time: Option<String>,
}

impl ReflectionForm {
    fn from_trip(trip: &Trip) -> Self {
        let details = TripForm::from_trip(trip);
        Self {
            name: details.name,
            start_date: details.start_date,
            end_date: details.end_date,
            trip_type: details.trip_type,
            final_reflection: trip.final_reflection.clone(),
            what_to_do_next_time: trip.what_to_do_next_time.clone(),
        }
    }

    fn to_parts(&self) -> Result<(TripDetails, Reflection), AppError> {
        let details = TripForm {
            name: self.name.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            trip_type: self.trip_type.clone(),
        }
        .to_details()?;
        let reflection = Reflection {
            final_reflection: normalize_optional(self.final_reflection.clone()),
            what_to_do_next_time: normalize_optional(self.what_to_do_next_time.clone()),
        };
        Ok((details, reflection))
    }

    fn final_reflection_text(&self) -> &str {
        self.final_reflection.as_deref().unwrap_or("")
    }

    fn what_to_do_next_time_text(&self) -> &str {
        self.what_to_do_next_time.as_deref().unwrap_or("")
    }
}

struct DayLink {
    day_number: u32,
    date: String,
}

#[derive(Template)]
#[template(path = "reflection.html")]
struct ReflectionTemplate {
    trip_id: String,
    action: String,
    trip_name: String,
    days: Vec<DayLink>,
    form: ReflectionForm,
    error: Option<String>,
    notice: Option<String>,
}

fn reflection_template(
    trip: &Trip,
    form: ReflectionForm,
    error: Option<String>,
    notice: Option<String>,
) -> ReflectionTemplate {
    ReflectionTemplate {
        trip_id: trip.id.clone(),
        action: reflection_path(&trip.id),
        trip_name: trip.name.clone(),
        days: trip
            .calendar()
            .into_iter()
            .map(|day| DayLink {
                day_number: day.day_number,
                date: day.date.format("%m/%d/%Y").to_string(),
            })
            .collect(),
        form,
        error,
        notice,
    }
}

async fn reflection_form(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path(trip_id): Path<String>,
) -> Result<Response, AppError> {
    let Some(trip) = state.store.get_trip(&trip_id).await? else {
        warn!(%trip_id, "reflection requested for unknown trip");
        return Ok(Redirect::to("/journal").into_response());
    };
    let (jar, notice) = flash::take(jar);
    let template = reflection_template(&trip, ReflectionForm::from_trip(&trip), None, notice);
    Ok((jar, AskamaTemplateResponse::into_response(template)).into_response())
}

async fn reflection_submit(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path(trip_id): Path<String>,
    Form(form): Form<ReflectionForm>,
) -> Result<Response, AppError> {
    let Some(trip) = state.store.get_trip(&trip_id).await? else {
        return Ok(Redirect::to("/journal").into_response());
    };
    let result = match form.to_parts() {
        Ok((details, reflection)) => {
            state
                .store
                .save_reflection(&trip.id, &details, &reflection)
                .await
        }
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => {
            info!(trip_id = %trip.id, "reflection saved");
            let jar = flash::set(jar, format!("Reflection for \"{}\" saved.", trip.name));
            Ok((jar, Redirect::to("/journal")).into_response())
        }
        Err(err @ (AppError::Validation(_) | AppError::Database(_))) => {
            let status = err.status();
            let template = reflection_template(&trip, form, Some(err.user_message()), None);
            Ok((status, AskamaTemplateResponse::into_response(template)).into_response())
        }
        Err(err) => Err(err),
    }
}
