mod common;

use async_trait::async_trait;
use common::{fast_policy, CountingRepository, Reply, ScriptedFetcher, GARLIC_PASTA_HTML, NO_RECIPE_HTML};
use recipe_import::providers::ExtractionClient;
use recipe_import::{
    ExtractionMethod, ImporterConfig, ProviderError, RecipeImporter, RecipeRepository, RetryPolicy,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

fn completion(reply: &Value) -> String {
    json!({
        "choices": [{"message": {"content": reply.to_string()}}]
    })
    .to_string()
}

fn config(server_url: String) -> ImporterConfig {
    let mut config = ImporterConfig::default();
    config.ai.provider = "openai".to_string();
    config.ai.api_key = Some("test-key".to_string());
    config.ai.base_url = Some(server_url);
    config
}

fn importer_with_ai(
    server_url: String,
    fetcher: Arc<ScriptedFetcher>,
    repository: Arc<CountingRepository>,
    max_retries: u32,
) -> RecipeImporter {
    RecipeImporter::builder()
        .config(config(server_url))
        .fetcher(fetcher)
        .repository(repository)
        .retry_policy(fast_policy(max_retries))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_ai_extraction_is_preferred() {
    let mut server = mockito::Server::new_async().await;
    let reply = json!({
        "title": "Garlic Spaghetti",
        "ingredients": [
            {"name": "spaghetti", "amount": "400", "unit": "grams"},
            {"name": "garlic", "amount": "4", "unit": "cloves"}
        ],
        "instructions": ["1. Boil the pasta.", "2. Fry the garlic and toss."],
        "cook_time": "15 minutes",
        "difficulty": "Easy",
        "meal_times": ["dinner"],
        "appliance_settings": [{"appliance_type": "gas_burner", "heat_level": "medium"}],
        "language_detected": "en"
    });
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion(&reply))
        .expect(1)
        .create_async()
        .await;

    let fetcher = ScriptedFetcher::new(vec![Reply::Page(GARLIC_PASTA_HTML)]);
    let repository = CountingRepository::new();
    let importer = importer_with_ai(server.url(), fetcher, repository.clone(), 3);
    assert!(importer.extraction_status().ai_available);

    let result = importer
        .import_from_url("https://example.com/garlic-pasta", None)
        .await;

    mock.assert_async().await;
    assert!(result.success, "{:?}", result.error);
    let metadata = result.extraction_metadata.as_ref().unwrap();
    assert_eq!(metadata.method_used, ExtractionMethod::Ai);
    assert_eq!(metadata.parser.as_deref(), Some("openai"));

    let recipe = repository
        .get(result.recipe_id.as_deref().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(recipe.title, "Garlic Spaghetti");
    assert_eq!(recipe.ingredients[0].unit.as_deref(), Some("g"));
    assert_eq!(recipe.ingredients[1].unit.as_deref(), Some("clove"));
    assert_eq!(recipe.instructions[0], "Boil the pasta.");
    assert_eq!(recipe.cook_time, Some(15));
    assert_eq!(recipe.appliance_settings.len(), 1);
    assert_eq!(recipe.metadata["extraction_method"], json!("ai"));
}

#[tokio::test]
async fn test_service_error_falls_back_to_rule_based() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .with_body("internal error")
        .expect(1)
        .create_async()
        .await;

    let fetcher = ScriptedFetcher::new(vec![Reply::Page(GARLIC_PASTA_HTML)]);
    let importer = importer_with_ai(server.url(), fetcher, CountingRepository::new(), 3);

    let result = importer
        .import_from_url("https://example.com/garlic-pasta", None)
        .await;

    // the extractor itself never retries the service
    mock.assert_async().await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.attempts, 1);
    assert_eq!(
        result.extraction_metadata.unwrap().method_used,
        ExtractionMethod::RuleBased
    );
}

#[tokio::test]
async fn test_reply_without_recipe_falls_back() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(completion(&json!({"title": null, "ingredients": [], "instructions": []})))
        .create_async()
        .await;

    let fetcher = ScriptedFetcher::new(vec![Reply::Page(GARLIC_PASTA_HTML)]);
    let importer = importer_with_ai(server.url(), fetcher, CountingRepository::new(), 3);

    let result = importer
        .import_from_url("https://example.com/garlic-pasta", None)
        .await;

    assert!(result.success, "{:?}", result.error);
    let metadata = result.extraction_metadata.unwrap();
    assert_eq!(metadata.method_used, ExtractionMethod::RuleBased);
    assert_eq!(metadata.extracted_title.as_deref(), Some("Garlic Pasta"));
}

#[tokio::test]
async fn test_unparseable_reply_falls_back() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices": [{"message": {"content": "Sorry, I can't help with that."}}]}"#)
        .create_async()
        .await;

    let fetcher = ScriptedFetcher::new(vec![Reply::Page(GARLIC_PASTA_HTML)]);
    let importer = importer_with_ai(server.url(), fetcher, CountingRepository::new(), 3);

    let result = importer
        .import_from_url("https://example.com/garlic-pasta", None)
        .await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(
        result.extraction_metadata.unwrap().method_used,
        ExtractionMethod::RuleBased
    );
}

#[tokio::test]
async fn test_unavailable_service_and_no_fallback_is_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(503)
        .expect(2)
        .create_async()
        .await;

    let fetcher = ScriptedFetcher::new(vec![Reply::Page(NO_RECIPE_HTML)]);
    let importer = importer_with_ai(server.url(), fetcher.clone(), CountingRepository::new(), 2);

    let result = importer
        .import_from_url("https://example.com/about", None)
        .await;

    mock.assert_async().await;
    assert!(!result.success);
    assert_eq!(result.attempts, 2);
    assert_eq!(fetcher.calls(), 2);
    assert!(result
        .error
        .as_deref()
        .unwrap()
        .contains("extraction service unavailable"));
}

#[tokio::test]
async fn test_rejected_request_and_no_fallback_is_terminal() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(401)
        .with_body(r#"{"error": {"message": "invalid api key"}}"#)
        .create_async()
        .await;

    let fetcher = ScriptedFetcher::new(vec![Reply::Page(NO_RECIPE_HTML)]);
    let importer = importer_with_ai(server.url(), fetcher.clone(), CountingRepository::new(), 3);

    let result = importer
        .import_from_url("https://example.com/about", None)
        .await;

    assert!(!result.success);
    assert_eq!(result.attempts, 1);
    assert!(result.error.as_deref().unwrap().contains("no_recipe_content"));
}

#[tokio::test]
async fn test_missing_credentials_disable_ai() {
    let mut config = ImporterConfig::default();
    config.ai.provider = "not-a-provider".to_string();

    let importer = RecipeImporter::builder()
        .config(config)
        .fetcher(ScriptedFetcher::new(vec![Reply::Page(GARLIC_PASTA_HTML)]))
        .build()
        .unwrap();

    let status = importer.extraction_status();
    assert!(!status.ai_available);
    assert!(status.fallback_available);

    let result = importer
        .import_from_url("https://example.com/garlic-pasta", None)
        .await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(
        result.extraction_metadata.unwrap().method_used,
        ExtractionMethod::RuleBased
    );
}

/// Extraction service that never answers in time
struct HangingClient;

#[async_trait]
impl ExtractionClient for HangingClient {
    fn provider_name(&self) -> &str {
        "hanging"
    }

    async fn request(
        &self,
        _content: &str,
        _schema: &Value,
        _language_hint: Option<&str>,
    ) -> Result<Value, ProviderError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(json!({}))
    }
}

#[tokio::test(start_paused = true)]
async fn test_hanging_service_still_leaves_time_for_fallback() {
    let fetcher = ScriptedFetcher::new(vec![Reply::Page(GARLIC_PASTA_HTML)]);
    let repository = CountingRepository::new();
    let importer = RecipeImporter::builder()
        .fetcher(fetcher.clone())
        .repository(repository.clone())
        .extraction_client(Arc::new(HangingClient))
        .retry_policy(RetryPolicy {
            max_retries: 3,
            retry_delay: Duration::ZERO,
            stage_timeout: Duration::from_secs(10),
        })
        .build()
        .unwrap();
    assert!(importer.extraction_status().ai_available);

    let result = importer
        .import_from_url("https://example.com/garlic-pasta", None)
        .await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.attempts, 1);
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(repository.saves(), 1);
    let metadata = result.extraction_metadata.as_ref().unwrap();
    assert_eq!(metadata.method_used, ExtractionMethod::RuleBased);
}
