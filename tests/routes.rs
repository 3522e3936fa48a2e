use std::{fs::File, net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use tempfile::TempDir;
use tower::ServiceExt;
use tripjournal::{
    config::AppConfig,
    db::{init_pool, run_migrations},
    error::AppError,
    models::{
        day::DayLocation,
        place::{Coordinates, PlaceCandidate},
        trip::{Trip, TripDetails},
    },
    routes::create_router,
    services::{geocoding::Geocoder, photos::PhotoStorage, store::JournalStore},
    state::AppState,
};

struct StaticGeocoder;

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn search(&self, query: &str) -> Result<Vec<PlaceCandidate>, AppError> {
        Ok(vec![PlaceCandidate {
            name: query.to_string(),
            country: "Peru".into(),
            lat: -13.5319,
            lng: -71.9675,
        }])
    }

    async fn coordinates(&self, _city: &str) -> Result<Option<Coordinates>, AppError> {
        Ok(Some(Coordinates::new(-13.5319, -71.9675)))
    }
}

struct TestApp {
    router: Router,
    store: JournalStore,
    _root: TempDir,
}

async fn test_app() -> TestApp {
    let root = TempDir::new().expect("temp dir");
    let db_path = root.path().join("routes.sqlite");
    File::create(&db_path).expect("db file");
    let config = AppConfig {
        database_url: format!("sqlite://{}", db_path.to_string_lossy()),
        listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        upload_root: root.path().join("uploads"),
        public_upload_base: "/uploads".into(),
        cookie_secret: "routes-cookie-secret".into(),
        mapbox_token: None,
        opencage_key: None,
    };
    let db = init_pool(&config.database_url).await.expect("pool");
    run_migrations(&db).await.expect("migrations");
    let store = JournalStore::new(db);
    let photos = PhotoStorage::new(config.upload_root.clone(), config.public_upload_base.clone());
    let state = AppState::new(config, store.clone(), photos, Arc::new(StaticGeocoder));
    TestApp {
        router: create_router(state),
        store,
        _root: root,
    }
}

async fn peru_trip(store: &JournalStore) -> Trip {
    store
        .create_trip(TripDetails {
            name: "Peru".into(),
            start_date: "2024-03-01".parse().unwrap(),
            end_date: "2024-03-03".parse().unwrap(),
            trip_type: vec!["#adventure".into()],
        })
        .await
        .expect("create trip")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect location")
        .to_str()
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn journal_lists_trips() {
    let app = test_app().await;
    peru_trip(&app.store).await;

    let response = app.router.oneshot(get("/journal")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Peru"));
    assert!(html.contains("0 / 3"));
}

#[tokio::test]
async fn creating_a_trip_opens_its_first_day() {
    let app = test_app().await;
    let response = app
        .router
        .oneshot(post_form(
            "/trips/new",
            "name=Peru&start_date=2024-03-01&end_date=2024-03-03&trip_type=%23adventure",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let trips = app.store.list_trips().await.unwrap();
    assert_eq!(trips.len(), 1);
    assert_eq!(location(&response), format!("/trips/{}/days/1", trips[0].id));
}

#[tokio::test]
async fn reversed_dates_are_rejected_with_the_form() {
    let app = test_app().await;
    let response = app
        .router
        .oneshot(post_form(
            "/trips/new",
            "name=Peru&start_date=2024-03-05&end_date=2024-03-01&trip_type=",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("end before it starts"));
    assert!(app.store.list_trips().await.unwrap().is_empty());
}

#[tokio::test]
async fn saving_a_day_redirects_to_the_next_one() {
    let app = test_app().await;
    let trip = peru_trip(&app.store).await;

    let uri = format!("/trips/{}/days/1", trip.id);
    let response = app
        .router
        .clone()
        .oneshot(post_form(&uri, "location=Lima&country=Peru&highlight=Ceviche"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/trips/{}/days/2", trip.id));

    let day = app.store.get_day(&trip.id, 1).await.unwrap().expect("day saved");
    assert_eq!(day.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    assert_eq!(day.fields.highlight.as_deref(), Some("Ceviche"));

    let last = format!("/trips/{}/days/3", trip.id);
    let response = app
        .router
        .oneshot(post_form(
            &last,
            "is_travel_day=true&leaving_city=Lima&arriving_city=Cusco",
        ))
        .await
        .unwrap();
    assert_eq!(location(&response), format!("/trips/{}/reflection", trip.id));
}

#[tokio::test]
async fn day_page_prefills_saved_values() {
    let app = test_app().await;
    let trip = peru_trip(&app.store).await;
    let uri = format!("/trips/{}/days/2", trip.id);
    app.router
        .clone()
        .oneshot(post_form(&uri, "location=Cusco&notable_things=%23ruins"))
        .await
        .unwrap();

    let response = app.router.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("03/02/2024"));
    assert!(html.contains("value=\"Cusco\""));
    assert!(html.contains("#ruins"));
}

#[tokio::test]
async fn invalid_coordinates_rerender_the_day() {
    let app = test_app().await;
    let trip = peru_trip(&app.store).await;
    let uri = format!("/trips/{}/days/1", trip.id);
    let response = app
        .router
        .oneshot(post_form(
            &uri,
            "location=Lima&lat=200&lng=10&highlight=Sunset+at+Miraflores",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let html = body_text(response).await;
    assert!(html.contains("out of range"));
    assert!(html.contains("value=\"Lima\""));
    assert!(html.contains("value=\"200\""));
    assert!(html.contains("Sunset at Miraflores"));
    assert_eq!(app.store.count_days(&trip.id).await.unwrap(), 0);
}

#[tokio::test]
async fn store_failure_rerenders_the_day_with_typed_values() {
    let app = test_app().await;
    let trip = peru_trip(&app.store).await;
    sqlx::query("DROP TABLE trip_days")
        .execute(app.store.pool())
        .await
        .unwrap();

    let uri = format!("/trips/{}/days/1", trip.id);
    let response = app
        .router
        .oneshot(post_form(&uri, "location=Lima&highlight=Ceviche+by+the+sea"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get(header::LOCATION).is_none());
    let html = body_text(response).await;
    assert!(html.contains("please try saving again"));
    assert!(html.contains("value=\"Lima\""));
    assert!(html.contains("Ceviche by the sea"));
}

#[tokio::test]
async fn saved_places_keep_exactly_the_submitted_fields() {
    let app = test_app().await;
    let trip = peru_trip(&app.store).await;
    let uri = format!("/trips/{}/days/1", trip.id);
    let response = app
        .router
        .oneshot(post_form(&uri, "location=Cusco&country=Peru"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let day = app.store.get_day(&trip.id, 1).await.unwrap().expect("day saved");
    match day.fields.location {
        DayLocation::Stay(place) => {
            assert_eq!(place.name.as_deref(), Some("Cusco"));
            assert_eq!(place.country.as_deref(), Some("Peru"));
            assert_eq!(place.lat, None);
            assert_eq!(place.lng, None);
        }
        other => panic!("expected a stay, found {other:?}"),
    }
}

#[tokio::test]
async fn days_outside_the_trip_are_not_found() {
    let app = test_app().await;
    let trip = peru_trip(&app.store).await;
    for day in [0, 4] {
        let uri = format!("/trips/{}/days/{day}", trip.id);
        let response = app.router.clone().oneshot(get(&uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "day {day}");
    }
}

#[tokio::test]
async fn unknown_trip_goes_back_to_the_journal() {
    let app = test_app().await;
    let response = app
        .router
        .oneshot(get("/trips/missing/days/1"))
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/journal");
}

#[tokio::test]
async fn place_search_ignores_blank_queries() {
    let app = test_app().await;
    let response = app
        .router
        .clone()
        .oneshot(get("/api/places?q="))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "[]");

    let response = app.router.oneshot(get("/api/places?q=Cusco")).await.unwrap();
    let candidates: Vec<PlaceCandidate> =
        serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].country, "Peru");
}

#[tokio::test]
async fn globe_data_pins_saved_days() {
    let app = test_app().await;
    let trip = peru_trip(&app.store).await;
    let uri = format!("/trips/{}/days/1", trip.id);
    app.router
        .clone()
        .oneshot(post_form(
            &uri,
            "location=Cusco&country=Peru&lat=-13.5319&lng=-71.9675",
        ))
        .await
        .unwrap();

    let response = app.router.oneshot(get("/globe/data")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let data: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(data["points"].as_array().map(Vec::len), Some(1));
    assert_eq!(data["visited_countries"][0], "Peru");
}
