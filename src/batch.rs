use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{error, info};
use tokio::sync::Semaphore;

use crate::error::ImportError;
use crate::importer::RecipeImporter;
use crate::model::{BatchImportResult, ImportMetadata, ImportResult};

impl RecipeImporter {
    /// Import many URLs, at most `max_concurrent` at a time.
    ///
    /// Every distinct URL gets exactly one entry in the returned map;
    /// duplicates are imported once. A failing or panicking import never
    /// affects the others. Returns once every import has finished.
    pub async fn batch_import(
        &self,
        urls: &[String],
        max_concurrent: Option<usize>,
        metadata: Option<&ImportMetadata>,
    ) -> BatchImportResult {
        let limit = max_concurrent.unwrap_or(self.max_concurrent).max(1);

        let mut seen = HashSet::new();
        let unique: Vec<String> = urls
            .iter()
            .filter(|url| seen.insert(url.as_str()))
            .cloned()
            .collect();
        if unique.len() < urls.len() {
            info!("Skipping {} duplicate URL(s)", urls.len() - unique.len());
        }

        info!(
            "Starting batch import of {} URL(s) with concurrency {}",
            unique.len(),
            limit
        );

        let semaphore = Arc::new(Semaphore::new(limit));
        let metadata = metadata.cloned();
        let mut handles = Vec::with_capacity(unique.len());

        for url in unique {
            let importer = self.clone();
            let semaphore = semaphore.clone();
            let metadata = metadata.clone();
            let task_url = url.clone();

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        let err = ImportError::Aborted(e.to_string());
                        return ImportResult::failed(&task_url, err.to_string(), 1, None);
                    }
                };
                importer.import_from_url(&task_url, metadata.as_ref()).await
            });

            handles.push((url, handle));
        }

        let mut results = HashMap::with_capacity(handles.len());
        for (url, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    error!("Import task for {} did not finish: {}", url, e);
                    let err = ImportError::Aborted(e.to_string());
                    ImportResult::failed(&url, err.to_string(), 1, None)
                }
            };
            results.insert(url, result);
        }

        let succeeded = results.values().filter(|r| r.success).count();
        info!(
            "Batch import finished: {} succeeded, {} failed",
            succeeded,
            results.len() - succeeded
        );

        results
    }
}
