use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};

use crate::{
    error::AppError,
    services::{
        globe::{self, GlobeData},
        stats::{self, TravelStats},
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats_page))
        .route("/stats/data", get(stats_data))
        .route("/globe", get(globe_page))
        .route("/globe/data", get(globe_data))
}

async fn load_stats(state: &AppState) -> Result<TravelStats, AppError> {
    let trips = state.store.list_trips().await?;
    let days = state.store.all_days().await?;
    Ok(stats::compute(&trips, &days))
}

#[derive(Template)]
#[template(path = "stats.html")]
struct StatsTemplate {
    stats: TravelStats,
    /// Chart data handed to the client-side charting script.
    stats_json: String,
}

async fn stats_page(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let stats = load_stats(&state).await?;
    // embedded inside a <script> element
    let stats_json = serde_json::to_string(&stats)
        .map_err(|err| AppError::Other(err.into()))?
        .replace("</", "<\\/");
    Ok(AskamaTemplateResponse::into_response(StatsTemplate {
        stats,
        stats_json,
    }))
}

async fn stats_data(State(state): State<AppState>) -> Result<Json<TravelStats>, AppError> {
    Ok(Json(load_stats(&state).await?))
}

#[derive(Template)]
#[template(path = "globe.html")]
struct GlobeTemplate {
    point_count: usize,
    country_count: usize,
}

async fn globe_page(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let data = globe::build(&state.store.all_days().await?);
    Ok(AskamaTemplateResponse::into_response(GlobeTemplate {
        point_count: data.points.len(),
        country_count: data.visited_countries.len(),
    }))
}

async fn globe_data(State(state): State<AppState>) -> Result<Json<GlobeData>, AppError> {
    Ok(Json(globe::build(&state.store.all_days().await?)))
}
