#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use recipe_import::{
    FetchError, Fetcher, InMemoryRepository, PersistError, RawContent, Recipe, RecipeImporter,
    RecipeRepository, RetryPolicy,
};

pub const GARLIC_PASTA_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <title>Garlic Pasta | Weeknight Kitchen</title>
    <script type="application/ld+json">
    {
        "@context": "https://schema.org",
        "@graph": [
            {"@type": "WebSite", "name": "Weeknight Kitchen"},
            {
                "@type": "Recipe",
                "name": "Garlic Pasta",
                "description": "Spaghetti tossed with garlic and olive oil.",
                "image": ["https://example.com/images/garlic-pasta.jpg"],
                "prepTime": "PT10M",
                "cookTime": "PT15M",
                "recipeYield": "4 servings",
                "recipeCategory": "Dinner",
                "recipeCuisine": "Italian",
                "keywords": "pasta, quick",
                "recipeIngredient": [
                    "400 g spaghetti",
                    "4 cloves garlic, sliced",
                    "1/3 cup olive oil"
                ],
                "recipeInstructions": [
                    {"@type": "HowToStep", "text": "Cook the spaghetti in salted water."},
                    {"@type": "HowToStep", "text": "Fry the garlic gently in the olive oil."},
                    {"@type": "HowToStep", "text": "Toss the pasta with the garlic oil."},
                    {"@type": "HowToStep", "text": "Season with salt and serve."}
                ]
            }
        ]
    }
    </script>
</head>
<body>
    <h1>Garlic Pasta</h1>
    <p>Our favourite weeknight dinner.</p>
</body>
</html>"#;

pub const NO_RECIPE_HTML: &str = r#"<!DOCTYPE html>
<html><head><title>About us</title></head>
<body><h1>About us</h1><p>We are a small team that loves food.</p></body>
</html>"#;

/// Policy without waiting between attempts
pub fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        retry_delay: Duration::ZERO,
        stage_timeout: Duration::from_secs(30),
    }
}

/// Importer without any AI strategy, so environment credentials cannot interfere
pub fn importer(
    fetcher: Arc<dyn Fetcher>,
    repository: Arc<dyn RecipeRepository>,
    policy: RetryPolicy,
) -> RecipeImporter {
    RecipeImporter::builder()
        .fetcher(fetcher)
        .repository(repository)
        .retry_policy(policy)
        .rule_based_only()
        .build()
        .unwrap()
}

#[derive(Debug, Clone)]
pub enum Reply {
    Page(&'static str),
    Status(u16),
}

/// Answers each fetch with the next scripted reply; the last reply repeats
pub struct ScriptedFetcher {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(ScriptedFetcher {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self, url: &str) -> Result<RawContent, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = {
            let mut replies = self.replies.lock().unwrap();
            if replies.len() > 1 {
                replies.pop_front()
            } else {
                replies.front().cloned()
            }
        };

        match reply {
            Some(Reply::Page(body)) => Ok(RawContent::new(url, body, "text/html")),
            Some(Reply::Status(status)) => Err(FetchError::HttpStatus {
                url: url.to_string(),
                status,
            }),
            None => Err(FetchError::Network {
                url: url.to_string(),
                message: "no scripted reply".to_string(),
            }),
        }
    }
}

/// Serves the same page for every URL and records how many fetches overlap
pub struct ConcurrencyTracker {
    body: &'static str,
    delay: Duration,
    active: AtomicUsize,
    max_active: AtomicUsize,
    calls: AtomicUsize,
}

impl ConcurrencyTracker {
    pub fn new(body: &'static str, delay: Duration) -> Arc<Self> {
        Arc::new(ConcurrencyTracker {
            body,
            delay,
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for ConcurrencyTracker {
    fn name(&self) -> &str {
        "tracker"
    }

    async fn fetch(&self, url: &str) -> Result<RawContent, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        if url.contains("unreachable") {
            return Err(FetchError::Network {
                url: url.to_string(),
                message: "connection refused".to_string(),
            });
        }
        if url.contains("panic") {
            panic!("fetcher blew up for {url}");
        }
        Ok(RawContent::new(url, self.body, "text/html"))
    }
}

/// In-memory repository that counts saves and can fail the first few
pub struct CountingRepository {
    inner: InMemoryRepository,
    saves: AtomicUsize,
    failures_left: AtomicUsize,
}

impl CountingRepository {
    pub fn new() -> Arc<Self> {
        Self::failing_first(0)
    }

    pub fn failing_first(failures: usize) -> Arc<Self> {
        Arc::new(CountingRepository {
            inner: InMemoryRepository::new(),
            saves: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(failures),
        })
    }

    /// Successful saves only
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecipeRepository for CountingRepository {
    async fn save(&self, recipe: &Recipe) -> Result<String, PersistError> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(PersistError::Write("database unavailable".to_string()));
        }

        let id = self.inner.save(recipe).await?;
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<Recipe>, PersistError> {
        self.inner.get(id).await
    }

    async fn find_by_source_url(&self, url: &str) -> Result<Option<(String, Recipe)>, PersistError> {
        self.inner.find_by_source_url(url).await
    }
}
