use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    error::AppError,
    models::place::{Coordinates, PlaceCandidate},
    services::store::JournalStore,
};

const MAPBOX_PLACES_URL: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places/";
const OPENCAGE_URL: &str = "https://api.opencagedata.com/geocode/v1/json";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Queries shorter than this never reach the upstream search.
pub const MIN_QUERY_LEN: usize = 2;

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Ranked place candidates for a free-text query.
    async fn search(&self, query: &str) -> Result<Vec<PlaceCandidate>, AppError>;

    /// Coordinates of a city, if the upstream knows it.
    async fn coordinates(&self, city: &str) -> Result<Option<Coordinates>, AppError>;
}

/// Mapbox for autocomplete, OpenCage for plain city lookups.
#[derive(Clone)]
pub struct HttpGeocoder {
    client: reqwest::Client,
    mapbox_token: Option<String>,
    opencage_key: Option<String>,
}

impl HttpGeocoder {
    pub fn new(mapbox_token: Option<String>, opencage_key: Option<String>) -> Result<Self, AppError> {
        Self::with_timeout(mapbox_token, opencage_key, REQUEST_TIMEOUT)
    }

    /// Every upstream request is abandoned after `timeout`.
    pub fn with_timeout(
        mapbox_token: Option<String>,
        opencage_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            mapbox_token,
            opencage_key,
        })
    }

    fn places_url(&self, query: &str) -> Result<Url, AppError> {
        let token = self
            .mapbox_token
            .as_deref()
            .ok_or_else(|| AppError::Geocoding("place search is not configured".into()))?;
        let mut url = Url::parse(MAPBOX_PLACES_URL).map_err(|err| AppError::Other(err.into()))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Geocoding("invalid places endpoint".into()))?
            .pop_if_empty()
            .push(&format!("{query}.json"));
        url.query_pairs_mut()
            .append_pair("access_token", token)
            .append_pair("autocomplete", "true")
            .append_pair("types", "place");
        Ok(url)
    }

    fn lookup_url(&self, city: &str) -> Result<Url, AppError> {
        let key = self
            .opencage_key
            .as_deref()
            .ok_or_else(|| AppError::Geocoding("coordinate lookup is not configured".into()))?;
        Url::parse_with_params(OPENCAGE_URL, &[("q", city), ("key", key)])
            .map_err(|err| AppError::Other(err.into()))
    }

    async fn fetch<T: for<'de> Deserialize<'de>>(&self, url: Url, upstream: &str) -> Result<T, AppError> {
        let response = self.client.get(url).send().await.map_err(|err| {
            warn!(%upstream, error = %err, "geocoding request failed");
            AppError::Http(err)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%upstream, %status, "geocoding upstream returned error");
            return Err(AppError::Geocoding(format!("{upstream} returned {status}")));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn search(&self, query: &str) -> Result<Vec<PlaceCandidate>, AppError> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            return Ok(Vec::new());
        }
        let url = self.places_url(query)?;
        let response: MapboxResponse = self.fetch(url, "mapbox").await?;
        let candidates = response.into_candidates();
        debug!(%query, found = candidates.len(), "place search");
        Ok(candidates)
    }

    async fn coordinates(&self, city: &str) -> Result<Option<Coordinates>, AppError> {
        let url = self.lookup_url(city)?;
        let response: OpenCageResponse = self.fetch(url, "opencage").await?;
        Ok(response.results.into_iter().next().map(|result| result.geometry))
    }
}

#[derive(Debug, Deserialize)]
struct MapboxResponse {
    #[serde(default)]
    features: Vec<MapboxFeature>,
}

#[derive(Debug, Deserialize)]
struct MapboxFeature {
    text: String,
    /// `[lng, lat]`
    center: [f64; 2],
    #[serde(default)]
    context: Vec<MapboxContext>,
}

#[derive(Debug, Deserialize)]
struct MapboxContext {
    id: String,
    text: String,
}

impl MapboxResponse {
    fn into_candidates(self) -> Vec<PlaceCandidate> {
        self.features
            .into_iter()
            .map(|feature| {
                let country = feature
                    .context
                    .iter()
                    .find(|entry| entry.id.starts_with("country"))
                    .map(|entry| entry.text.clone())
                    .unwrap_or_default();
                PlaceCandidate {
                    name: feature.text,
                    country,
                    lat: feature.center[1],
                    lng: feature.center[0],
                }
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct OpenCageResponse {
    #[serde(default)]
    results: Vec<OpenCageResult>,
}

#[derive(Debug, Deserialize)]
struct OpenCageResult {
    geometry: Coordinates,
}

/// Read-through cache of city coordinates backed by `locations_cache`.
/// Entries are never evicted.
#[derive(Clone)]
pub struct CoordinateCache {
    store: JournalStore,
    geocoder: Arc<dyn Geocoder>,
}

impl CoordinateCache {
    pub fn new(store: JournalStore, geocoder: Arc<dyn Geocoder>) -> Self {
        Self { store, geocoder }
    }

    pub async fn lookup(&self, city: &str) -> Result<Coordinates, AppError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(AppError::validation("A city name is required."));
        }

        if let Some(cached) = self.store.cached_coordinates(city).await? {
            debug!(%city, "coordinate cache hit");
            return Ok(cached);
        }

        let coordinates = self
            .geocoder
            .coordinates(city)
            .await?
            .ok_or_else(|| AppError::Geocoding(format!("no coordinates found for {city}")))?;

        self.store.cache_coordinates(city, coordinates).await?;
        info!(%city, lat = coordinates.lat, lng = coordinates.lng, "cached coordinates");
        Ok(coordinates)
    }
}
