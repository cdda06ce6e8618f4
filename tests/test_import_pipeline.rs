mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{
    fast_policy, importer, CountingRepository, Reply, ScriptedFetcher, GARLIC_PASTA_HTML,
    NO_RECIPE_HTML,
};
use recipe_import::model::MealTime;
use recipe_import::{
    ExtractionMethod, FetchError, Fetcher, ImportMetadata, ImportStatus, RawContent,
    RecipeImporter, RecipeRepository, RetryPolicy,
};
use serde_json::json;

#[tokio::test]
async fn test_garlic_pasta_page_without_credentials() {
    let mut server = mockito::Server::new_async().await;
    let page = server
        .mock("GET", "/garlic-pasta")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(GARLIC_PASTA_HTML)
        .expect(1)
        .create_async()
        .await;

    let repository = CountingRepository::new();
    let importer = RecipeImporter::builder()
        .repository(repository.clone())
        .rule_based_only()
        .build()
        .unwrap();

    let url = format!("{}/garlic-pasta", server.url());
    let result = importer.import_from_url(&url, None).await;

    page.assert_async().await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.attempts, 1);
    assert!(result.error.is_none());
    let metadata = result.extraction_metadata.as_ref().unwrap();
    assert_eq!(metadata.method_used, ExtractionMethod::RuleBased);
    assert_eq!(metadata.parser.as_deref(), Some("json_ld"));
    assert_eq!(metadata.extracted_title.as_deref(), Some("Garlic Pasta"));
    assert_eq!(repository.saves(), 1);

    let recipe = repository
        .get(result.recipe_id.as_deref().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(recipe.title, "Garlic Pasta");
    assert_eq!(recipe.ingredients.len(), 3);
    assert_eq!(recipe.ingredients[0].amount, "400");
    assert_eq!(recipe.ingredients[0].unit.as_deref(), Some("g"));
    assert_eq!(recipe.ingredients[2].amount, "1/3");
    assert_eq!(recipe.ingredients[2].unit.as_deref(), Some("cup"));
    assert_eq!(recipe.ingredients[2].name, "olive oil");
    assert_eq!(recipe.instructions.len(), 4);
    assert_eq!(recipe.instructions[3], "Season with salt and serve.");
    assert_eq!(recipe.prep_time, Some(10));
    assert_eq!(recipe.cook_time, Some(15));
    assert_eq!(recipe.servings, Some(4));
    assert!(recipe.meal_times.contains(&MealTime::Dinner));
    assert!(recipe.tags.contains("italian"));
    assert!(recipe.tags.contains("quick"));
    assert_eq!(recipe.source.source_type, "website");
    assert_eq!(recipe.source.url.as_deref(), Some(url.as_str()));
    assert_eq!(recipe.metadata["extraction_method"], json!("rule_based"));
    assert_eq!(recipe.metadata["original_language"], json!("en"));
}

#[tokio::test(start_paused = true)]
async fn test_retries_until_the_page_loads() {
    let fetcher = ScriptedFetcher::new(vec![
        Reply::Status(500),
        Reply::Status(500),
        Reply::Page(GARLIC_PASTA_HTML),
    ]);
    let repository = CountingRepository::new();
    let policy = RetryPolicy {
        max_retries: 3,
        retry_delay: Duration::from_secs(1),
        stage_timeout: Duration::from_secs(30),
    };
    let importer = importer(fetcher.clone(), repository.clone(), policy);

    let started = tokio::time::Instant::now();
    let result = importer
        .import_from_url("https://example.com/garlic-pasta", None)
        .await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.attempts, 3);
    assert_eq!(fetcher.calls(), 3);
    assert_eq!(repository.saves(), 1);
    // linear backoff: 1s after the first failure, 2s after the second
    assert!(started.elapsed() >= Duration::from_secs(3));
}

#[tokio::test]
async fn test_gives_up_after_max_retries() {
    let fetcher = ScriptedFetcher::new(vec![Reply::Status(503)]);
    let repository = CountingRepository::new();
    let importer = importer(fetcher.clone(), repository.clone(), fast_policy(3));

    let result = importer
        .import_from_url("https://example.com/garlic-pasta", None)
        .await;

    assert!(!result.success);
    assert!(result.recipe_id.is_none());
    assert_eq!(result.attempts, 3);
    assert_eq!(fetcher.calls(), 3);
    assert!(result.error.as_deref().unwrap().contains("503"));
    assert_eq!(repository.saves(), 0);
}

#[tokio::test]
async fn test_page_without_recipe_fails_once() {
    let fetcher = ScriptedFetcher::new(vec![Reply::Page(NO_RECIPE_HTML)]);
    let repository = CountingRepository::new();
    let importer = importer(fetcher.clone(), repository.clone(), fast_policy(3));

    let result = importer
        .import_from_url("https://example.com/about", None)
        .await;

    assert!(!result.success);
    assert_eq!(result.attempts, 1);
    assert_eq!(fetcher.calls(), 1);
    assert!(result.error.as_deref().unwrap().contains("no_recipe_content"));
    assert_eq!(repository.saves(), 0);
}

#[tokio::test]
async fn test_validation_failure_is_not_retried() {
    // usable as a draft, but the only step is too short to survive normalization
    const TOO_SHORT: &str = r#"<html><head><script type="application/ld+json">
        {"@type": "Recipe", "name": "Mystery Dish", "recipeInstructions": ["Mix."]}
        </script></head><body></body></html>"#;

    let fetcher = ScriptedFetcher::new(vec![Reply::Page(TOO_SHORT)]);
    let repository = CountingRepository::new();
    let importer = importer(fetcher.clone(), repository.clone(), fast_policy(3));

    let result = importer
        .import_from_url("https://example.com/mystery", None)
        .await;

    assert!(!result.success);
    assert_eq!(result.attempts, 1);
    assert_eq!(fetcher.calls(), 1);
    assert!(result.error.as_deref().unwrap().contains("validation failed"));
    // the extraction still happened and is reported
    let metadata = result.extraction_metadata.unwrap();
    assert_eq!(metadata.extracted_title.as_deref(), Some("Mystery Dish"));
    assert_eq!(repository.saves(), 0);
}

#[tokio::test]
async fn test_invalid_url_is_rejected_before_fetching() {
    let fetcher = ScriptedFetcher::new(vec![Reply::Page(GARLIC_PASTA_HTML)]);
    let importer = importer(fetcher.clone(), CountingRepository::new(), fast_policy(3));

    for url in ["ftp://example.com/recipe", "not a url", ""] {
        let result = importer.import_from_url(url, None).await;
        assert!(!result.success);
        assert_eq!(result.attempts, 1);
        assert!(result.error.as_deref().unwrap().contains("invalid URL"));
    }
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_failed_save_is_retried_and_stored_once() {
    let fetcher = ScriptedFetcher::new(vec![Reply::Page(GARLIC_PASTA_HTML)]);
    let repository = CountingRepository::failing_first(1);
    let importer = importer(fetcher.clone(), repository.clone(), fast_policy(3));

    let result = importer
        .import_from_url("https://example.com/garlic-pasta", None)
        .await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.attempts, 2);
    assert_eq!(repository.saves(), 1);
}

struct StalledFetcher;

#[async_trait]
impl Fetcher for StalledFetcher {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn fetch(&self, url: &str) -> Result<RawContent, FetchError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(RawContent::new(url, GARLIC_PASTA_HTML, "text/html"))
    }
}

#[tokio::test(start_paused = true)]
async fn test_stage_timeout_counts_as_transient() {
    let policy = RetryPolicy {
        max_retries: 2,
        retry_delay: Duration::from_millis(100),
        stage_timeout: Duration::from_secs(5),
    };
    let importer = importer(Arc::new(StalledFetcher), CountingRepository::new(), policy);

    let result = importer
        .import_from_url("https://example.com/slow", None)
        .await;

    assert!(!result.success);
    assert_eq!(result.attempts, 2);
    assert!(result.error.as_deref().unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_explicit_policy_overrides_the_default() {
    let fetcher = ScriptedFetcher::new(vec![Reply::Status(500)]);
    let importer = importer(fetcher.clone(), CountingRepository::new(), fast_policy(3));

    let result = importer
        .import_from_url_with_policy("https://example.com/r", None, &fast_policy(1))
        .await;

    assert!(!result.success);
    assert_eq!(result.attempts, 1);
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_caller_metadata_is_applied() {
    let fetcher = ScriptedFetcher::new(vec![Reply::Page(GARLIC_PASTA_HTML)]);
    let repository = CountingRepository::new();
    let importer = importer(fetcher, repository.clone(), fast_policy(1));

    let mut extra = BTreeMap::new();
    extra.insert("imported_by".to_string(), json!("weekly-menu"));
    let metadata = ImportMetadata {
        additional_tags: vec!["Family Favourite".to_string()],
        meal_times: vec!["lunch".to_string(), "supper".to_string()],
        source_type: Some("cookbook".to_string()),
        source_name: Some("Weeknight Kitchen".to_string()),
        extra,
    };

    let result = importer
        .import_from_url("https://www.example.com/garlic-pasta", Some(&metadata))
        .await;
    assert!(result.success, "{:?}", result.error);

    let recipe = repository
        .get(result.recipe_id.as_deref().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(recipe.tags.contains("family favourite"));
    assert!(recipe.meal_times.contains(&MealTime::Lunch));
    assert!(recipe.meal_times.contains(&MealTime::Dinner));
    assert_eq!(recipe.meal_times.len(), 2);
    assert_eq!(recipe.source.source_type, "cookbook");
    assert_eq!(recipe.source.name.as_deref(), Some("Weeknight Kitchen"));
    assert_eq!(recipe.metadata["imported_by"], json!("weekly-menu"));
}

#[tokio::test]
async fn test_import_status() {
    let fetcher = ScriptedFetcher::new(vec![Reply::Page(GARLIC_PASTA_HTML)]);
    let importer = importer(fetcher, CountingRepository::new(), fast_policy(1));
    let url = "https://www.example.com/garlic-pasta";

    let before = importer.import_status(url).await.unwrap();
    assert_eq!(
        before,
        ImportStatus::NotImported {
            url: url.to_string()
        }
    );

    let result = importer.import_from_url(url, None).await;
    assert!(result.success);

    match importer.import_status(url).await.unwrap() {
        ImportStatus::Exists { recipe_id, title } => {
            assert_eq!(Some(recipe_id), result.recipe_id);
            assert_eq!(title, "Garlic Pasta");
        }
        other => panic!("expected an existing import, got {other:?}"),
    }
}

#[tokio::test]
async fn test_result_serializes_to_wire_shape() {
    let fetcher = ScriptedFetcher::new(vec![Reply::Page(GARLIC_PASTA_HTML)]);
    let importer = importer(fetcher, CountingRepository::new(), fast_policy(1));

    let result = importer
        .import_from_url("https://example.com/garlic-pasta", None)
        .await;
    let wire = serde_json::to_value(&result).unwrap();

    assert_eq!(wire["success"], json!(true));
    assert!(wire["recipe_id"].is_string());
    assert!(wire["error"].is_null());
    assert_eq!(wire["attempts"], json!(1));
    assert_eq!(wire["extraction_metadata"]["method_used"], json!("rule_based"));
    assert!(wire["timestamp"].is_string());
}

#[tokio::test]
async fn test_source_name_defaults_to_domain() {
    let fetcher = ScriptedFetcher::new(vec![Reply::Page(GARLIC_PASTA_HTML)]);
    let repository = CountingRepository::new();
    let importer = importer(fetcher, repository.clone(), fast_policy(1));

    let result = importer
        .import_from_url("https://www.weeknight-kitchen.com/garlic-pasta", None)
        .await;
    let recipe = repository
        .get(result.recipe_id.as_deref().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(recipe.source.name.as_deref(), Some("weeknight-kitchen.com"));
}
