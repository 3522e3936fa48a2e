use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use chrono::Datelike;

use crate::{error::AppError, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(home))
}

struct FeaturedTrip {
    id: String,
    name: String,
    year: i32,
    photo_url: Option<String>,
    highlight: String,
}

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    featured: Option<FeaturedTrip>,
}

async fn home(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let featured = match state.store.random_trip().await? {
        Some(trip) => {
            let highlight = state
                .store
                .first_highlight(&trip.id)
                .await?
                .unwrap_or_else(|| "No highlights recorded yet".into());
            Some(FeaturedTrip {
                year: trip.start_date.year(),
                id: trip.id,
                name: trip.name,
                photo_url: trip.photo_url,
                highlight,
            })
        }
        None => None,
    };
    Ok(AskamaTemplateResponse::into_response(HomeTemplate {
        featured,
    }))
}
