use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_with::{serde_as, NoneAsEmptyString};

use crate::{
    error::AppError,
    models::place::{Coordinates, PlaceCandidate},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/places", get(search_places))
        .route("/coordinates", get(city_coordinates))
}

#[serde_as]
#[derive(Debug, Deserialize)]
struct PlacesQuery {
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    q: Option<String>,
}

/// Autocomplete candidates for the day form's location pickers.
async fn search_places(
    State(state): State<AppState>,
    Query(query): Query<PlacesQuery>,
) -> Result<Json<Vec<PlaceCandidate>>, AppError> {
    let Some(q) = query.q else {
        return Ok(Json(Vec::new()));
    };
    Ok(Json(state.geocoder.search(&q).await?))
}

#[derive(Debug, Deserialize)]
struct CoordinatesQuery {
    city: String,
}

async fn city_coordinates(
    State(state): State<AppState>,
    Query(query): Query<CoordinatesQuery>,
) -> Result<Json<Coordinates>, AppError> {
    Ok(Json(state.coordinates.lookup(&query.city).await?))
}
