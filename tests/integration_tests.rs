//! Integration tests for the translation coordinator
//!
//! These tests drive the full stack (`TranslationService` with the HTTP
//! provider and a file-backed preference store) against a mocked
//! translation API.

use std::time::Duration;
use tempfile::TempDir;
use wiremock::{
    matchers::{body_json, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use translation_coordinator::{retry::RetryConfig, Config, Language, TranslationService};

// ==================== Test Helpers ====================

/// Create a test config pointing at the mock server, with preferences in `temp_dir`
fn create_test_config(server_uri: &str, temp_dir: &TempDir) -> Config {
    Config {
        api_key: "test-key".to_string(),
        translate_url: format!("{}/language/translate/v2", server_uri),
        detect_url: format!("{}/language/translate/v2/detect", server_uri),
        request_timeout: Duration::from_secs(5),
        retry: RetryConfig::no_retry(),
        cache_capacity: 100,
        preferences_path: temp_dir.path().join("preferences.json"),
        ..Config::default()
    }
}

fn translations_response(items: &[&str]) -> serde_json::Value {
    let translations: Vec<_> = items
        .iter()
        .map(|t| serde_json::json!({ "translatedText": t }))
        .collect();
    serde_json::json!({ "data": { "translations": translations } })
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ==================== Translation Workflow Tests ====================

#[tokio::test]
async fn test_language_switching_reuses_cached_translations() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/language/translate/v2"))
        .and(query_param("key", "test-key"))
        .and(body_json(serde_json::json!({ "q": ["Hello"], "target": "fr", "format": "text" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(translations_response(&["Bonjour"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/language/translate/v2"))
        .and(body_json(serde_json::json!({ "q": ["Hello"], "target": "es", "format": "text" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(translations_response(&["Hola"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service =
        TranslationService::from_config(&create_test_config(&mock_server.uri(), &temp_dir)).unwrap();
    let selector = service.selector();
    let coordinator = service.coordinator();

    assert_eq!(coordinator.translate("Hello").await, "Hello");

    selector.set_active_language("fr");
    assert_eq!(coordinator.translate("Hello").await, "Bonjour");

    selector.set_active_language("es");
    assert_eq!(coordinator.translate("Hello").await, "Hola");

    selector.set_active_language("fr");
    assert_eq!(coordinator.translate("Hello").await, "Bonjour");

    let metrics = coordinator.metrics();
    assert_eq!(metrics.api_calls, 2);
    assert_eq!(metrics.cache_hits, 1);
}

#[tokio::test]
async fn test_batch_sends_only_uncached_strings() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/language/translate/v2"))
        .and(body_json(serde_json::json!({ "q": ["Save"], "target": "de", "format": "text" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(translations_response(&["Speichern"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/language/translate/v2"))
        .and(body_json(serde_json::json!({
            "q": ["Cancel", "Delete"],
            "target": "de",
            "format": "text"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(translations_response(&["Abbrechen", "Löschen"])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let service =
        TranslationService::from_config(&create_test_config(&mock_server.uri(), &temp_dir)).unwrap();
    service.selector().set_active_language("de");
    let coordinator = service.coordinator();

    assert_eq!(coordinator.translate("Save").await, "Speichern");

    let result = coordinator
        .translate_batch(&strings(&["Save", "", "Cancel", "Delete", "Cancel"]))
        .await;

    assert_eq!(result, vec!["Speichern", "", "Abbrechen", "Löschen", "Abbrechen"]);
}

#[tokio::test]
async fn test_provider_outage_degrades_to_original_text() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/language/translate/v2"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/language/translate/v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(translations_response(&["Bonjour"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service =
        TranslationService::from_config(&create_test_config(&mock_server.uri(), &temp_dir)).unwrap();
    service.selector().set_active_language("fr");
    let coordinator = service.coordinator();

    assert_eq!(coordinator.translate("Hello").await, "Hello");
    assert_eq!(
        coordinator.translate_batch(&strings(&["Hello"])).await,
        vec!["Hello"]
    );
    assert!(coordinator.cache().is_empty());

    // Failures were not cached, so the provider is asked again once it recovers
    assert_eq!(coordinator.translate("Hello").await, "Bonjour");
    assert_eq!(coordinator.metrics().api_failures, 2);
}

#[tokio::test]
async fn test_rejected_request_degrades_to_original_text() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/language/translate/v2"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": { "code": 400, "message": "API key not valid" }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service =
        TranslationService::from_config(&create_test_config(&mock_server.uri(), &temp_dir)).unwrap();
    service.selector().set_active_language("es");

    assert_eq!(service.coordinator().translate("Hello").await, "Hello");
}

#[tokio::test]
async fn test_concurrent_requests_share_one_provider_call() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/language/translate/v2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(translations_response(&["Bonjour"]))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let service =
        TranslationService::from_config(&create_test_config(&mock_server.uri(), &temp_dir)).unwrap();
    service.selector().set_active_language("fr");
    let coordinator = service.coordinator();

    let texts = strings(&["Hello"]);
    let (a, b, c) = tokio::join!(
        coordinator.translate("Hello"),
        coordinator.translate("Hello"),
        coordinator.translate_batch(&texts),
    );

    assert_eq!(a, "Bonjour");
    assert_eq!(b, "Bonjour");
    assert_eq!(c, vec!["Bonjour"]);
}

// ==================== Preference Tests ====================

#[tokio::test]
async fn test_display_language_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config("http://127.0.0.1:9", &temp_dir);

    let first = TranslationService::from_config(&config).unwrap();
    assert_eq!(first.selector().active_language(), Language::ENGLISH);
    assert!(first.selector().set_active_language("de"));
    first.shutdown();
    drop(first);

    let second = TranslationService::from_config(&config).unwrap();
    assert_eq!(second.selector().active_language(), Language::GERMAN);

    let raw = std::fs::read_to_string(&config.preferences_path).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored["preferredLanguage"], "de");
}

#[tokio::test]
async fn test_corrupt_preferences_fall_back_to_english() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config("http://127.0.0.1:9", &temp_dir);
    std::fs::write(&config.preferences_path, "{ not json").unwrap();

    let service = TranslationService::from_config(&config).unwrap();
    assert_eq!(service.selector().active_language(), Language::ENGLISH);
}

// ==================== Detection Tests ====================

#[tokio::test]
async fn test_detection_sets_source_language_only() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/language/translate/v2/detect"))
        .and(query_param("key", "test-key"))
        .and(body_json(serde_json::json!({ "q": "Hola, ¿cómo estás?" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "detections": [[ { "language": "es", "confidence": 0.97 } ]] }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service =
        TranslationService::from_config(&create_test_config(&mock_server.uri(), &temp_dir)).unwrap();
    service.selector().set_active_language("fr");

    let detected = service.detector().detect_now("Hola, ¿cómo estás?").await;

    assert_eq!(detected.as_deref(), Some("es"));
    assert_eq!(service.selector().source_language().as_deref(), Some("es"));
    assert_eq!(service.selector().active_language(), Language::FRENCH);
}

#[tokio::test]
async fn test_debounced_detection_through_http() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/language/translate/v2/detect"))
        .and(body_json(serde_json::json!({ "q": "Guten Morgen zusammen" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "detections": [[ { "language": "de", "confidence": 0.99 } ]] }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = Config {
        detection_debounce: Duration::from_millis(50),
        ..create_test_config(&mock_server.uri(), &temp_dir)
    };
    let service = TranslationService::from_config(&config).unwrap();
    let detector = service.detector();

    detector.on_input_changed("Guten");
    detector.on_input_changed("Guten Morg");
    detector.on_input_changed("Guten Morgen zusammen");

    let mut detected = None;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        detected = detector.detected_language();
        if detected.is_some() {
            break;
        }
    }

    assert_eq!(detected.as_deref(), Some("de"));
    assert_eq!(service.selector().source_language().as_deref(), Some("de"));
    service.shutdown();
}

#[tokio::test]
async fn test_detection_failure_changes_nothing() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/language/translate/v2/detect"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let service =
        TranslationService::from_config(&create_test_config(&mock_server.uri(), &temp_dir)).unwrap();

    assert_eq!(service.detector().detect_now("Bonjour tout le monde").await, None);
    assert_eq!(service.detector().detected_language(), None);
    assert_eq!(service.selector().source_language(), None);
}
