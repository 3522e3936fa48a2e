use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};

use crate::{
    config::AppConfig,
    journal::reconcile::DayReconciler,
    services::{
        geocoding::{CoordinateCache, Geocoder},
        photos::PhotoStorage,
        store::JournalStore,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: JournalStore,
    pub photos: PhotoStorage,
    pub geocoder: Arc<dyn Geocoder>,
    pub coordinates: CoordinateCache,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: JournalStore,
        photos: PhotoStorage,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        let digest = Sha512::digest(config.cookie_secret.as_bytes());
        let cookie_key = Key::from(&digest[..]);
        let coordinates = CoordinateCache::new(store.clone(), geocoder.clone());
        Self {
            config,
            store,
            photos,
            geocoder,
            coordinates,
            cookie_key,
        }
    }

    pub fn reconciler(&self) -> DayReconciler {
        DayReconciler::new(self.store.clone())
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
