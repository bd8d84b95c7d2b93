//! End-to-end tests for the route engine pipeline.
//!
//! Runs the full classify → select → compose → assemble chain against a
//! temporary CSV catalog and scripted inference backends, so the tests
//! cover everything except the network itself.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use progulka_engine::classifier::LexicalClassifier;
use progulka_engine::config::Config;
use progulka_engine::engine::RouteEngine;
use progulka_engine::error::EngineError;
use progulka_engine::inference::{ChatBackend, InferenceError, Result as InferenceResult};

/// Returns the same reply every call and counts invocations.
struct FixedChat {
    reply: InferenceResult<String>,
    calls: AtomicUsize,
}

impl FixedChat {
    fn ok(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    fn down() -> Self {
        Self {
            reply: Err(InferenceError::Unavailable("offline".into())),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ChatBackend for FixedChat {
    async fn complete(&self, _system: &str, _user: &str) -> InferenceResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(_) => Err(InferenceError::Unavailable("offline".into())),
        }
    }
}

fn sample_catalog() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(
        "title,address,description,coordinate,category_id\n\
         Парк Швейцария,пр. Гагарина 35,Большой городской парк,POINT(56.282 43.984),2\n\
         Памятник Чкалову,Верхневолжская наб.,Памятник знаменитому летчику,56.330 44.008,1\n\
         Парк Кулибина,ул. Горького,Тихий парк в центре,56.313 43.993,2.0\n\
         Музей фотографии,ул. Пискунова 9а,Старейший музей фотографии,POINT(56.324 44.013),7\n\
         Строка без категории,ул. Тестовая,Описание,56.3 44.0,\n"
            .as_bytes(),
    )
    .expect("write catalog");
    file
}

fn engine(catalog: &tempfile::NamedTempFile, chat: Arc<FixedChat>) -> RouteEngine {
    let mut config = Config::default();
    config.core.catalog_path = catalog.path().to_path_buf();
    RouteEngine::with_components(config, Arc::new(LexicalClassifier), chat)
}

const PARK_QUERY: &str = "хочу прогуляться по парку и посмотреть памятники";

#[tokio::test]
async fn test_full_pipeline_with_generated_route() {
    let catalog = sample_catalog();
    let chat = Arc::new(FixedChat::ok(
        r#"{"route_name": "Парковая прогулка", "total_duration": 110,
            "timeline": "Почти два часа на свежем воздухе",
            "explanation": "Маршрут по зеленым местам города",
            "places": [
              {"name": "Парк Швейцария", "order": 1, "duration": 60, "reason": "главный парк города"},
              {"name": "Памятник Чкалову", "order": 2, "duration": 50, "reason": "памятник с видом на Волгу"}
            ]}"#,
    ));
    let engine = engine(&catalog, chat);

    let itinerary = engine
        .generate_route(PARK_QUERY, Some(2), Some(0), "площадь Минина")
        .await
        .expect("route generated");

    assert_eq!(itinerary.route_name, "Парковая прогулка");
    assert_eq!(itinerary.places.len(), 2);
    assert_eq!(itinerary.start_point, "площадь Минина");
    assert_eq!(itinerary.user_time, 120);
    assert_eq!(itinerary.total_time, "1 ч 50 мин");

    // Catalog enrichment: coordinates and addresses resolved
    let park = &itinerary.places[0];
    assert_eq!(park.title, "Парк Швейцария");
    assert_eq!(park.coord, [56.282, 43.984]);
    assert_eq!(park.address, "пр. Гагарина 35");
    assert_eq!(park.time, 60);
}

#[tokio::test]
async fn test_model_outage_still_produces_itinerary() {
    let catalog = sample_catalog();
    let engine = engine(&catalog, Arc::new(FixedChat::down()));

    let itinerary = engine
        .generate_route(PARK_QUERY, Some(1), Some(40), "центр")
        .await
        .expect("fallback route generated");

    // Lexical match finds parks and monuments; the fallback composer
    // keeps at most four of them.
    assert!(!itinerary.places.is_empty());
    assert!(itinerary.places.len() <= 4);
    assert!(itinerary.places.iter().all(|p| !p.reason.is_empty()));
    assert_eq!(itinerary.user_time, 100);
}

#[tokio::test]
async fn test_empty_query_is_input_error() {
    let catalog = sample_catalog();
    let engine = engine(&catalog, Arc::new(FixedChat::down()));

    let err = engine
        .generate_route("   ", Some(2), Some(0), "центр")
        .await
        .expect_err("empty query rejected");
    assert!(err.is_input_error());
}

#[tokio::test]
async fn test_missing_catalog_is_hard_error() {
    let mut config = Config::default();
    config.core.catalog_path = "/nonexistent/dataset.csv".into();
    let engine = RouteEngine::with_components(
        config,
        Arc::new(LexicalClassifier),
        Arc::new(FixedChat::down()),
    );

    let err = engine
        .generate_route("парк", Some(1), Some(0), "центр")
        .await
        .expect_err("missing catalog rejected");
    assert!(matches!(err, EngineError::Catalog(_)));
}

#[tokio::test]
async fn test_missing_duration_defaults_to_three_hours() {
    let catalog = sample_catalog();
    let engine = engine(&catalog, Arc::new(FixedChat::down()));

    let itinerary = engine
        .generate_route("музей", None, None, "центр")
        .await
        .expect("route generated");
    assert_eq!(itinerary.user_time, 180);
}

#[tokio::test]
async fn test_unmatchable_query_random_samples() {
    let catalog = sample_catalog();
    let engine = engine(&catalog, Arc::new(FixedChat::down()));

    // No trigger word matches; the selector falls back to sampling, so
    // a route still comes back.
    let itinerary = engine
        .generate_route("qwerty", Some(2), Some(0), "центр")
        .await
        .expect("route generated");
    assert!(!itinerary.places.is_empty());
}

#[tokio::test]
async fn test_repeated_request_hits_compose_cache() {
    let catalog = sample_catalog();
    let chat = Arc::new(FixedChat::ok(
        r#"{"route_name": "Прогулка", "places": [
            {"name": "Парк Швейцария", "order": 1, "duration": 40, "reason": "зеленый парк"}
        ]}"#,
    ));
    let engine = engine(&catalog, chat.clone());

    let first = engine
        .generate_route(PARK_QUERY, Some(2), Some(0), "центр")
        .await
        .expect("first");
    let second = engine
        .generate_route(PARK_QUERY, Some(2), Some(0), "центр")
        .await
        .expect("second");

    assert_eq!(first, second);
    assert_eq!(chat.calls.load(Ordering::SeqCst), 1);
}
