//! Engine entry point
//!
//! `RouteEngine` wires the classifier, selector, composer, and assembler
//! into one request pipeline. The only hard failures at this boundary
//! are a missing query and an unloadable or empty catalog; everything
//! upstream of composition absorbs its own failures and degrades to a
//! deterministic route.

use std::sync::Arc;

use crate::assembler::{assemble, Itinerary};
use crate::catalog::load_catalog;
use crate::classifier::{Classifier, ClassifyOptions, EmbeddingClassifier, LexicalClassifier};
use crate::composer::{ComposerOptions, RouteComposer};
use crate::config::{hf_api_token, Config};
use crate::error::EngineError;
use crate::inference::{ChatBackend, HfChatClient, HfEmbeddingClient};
use crate::selector::select_candidates;

/// Duration applied when the request carries no usable time budget.
const DEFAULT_DURATION_MINUTES: u32 = 180;

/// Candidates forwarded to the composer, best scores first.
const TOP_CANDIDATES: usize = 10;

pub struct RouteEngine {
    config: Config,
    classifier: Arc<dyn Classifier>,
    composer: RouteComposer,
}

impl RouteEngine {
    /// Build the engine from config, constructing the remote inference
    /// clients. Requires `HF_API_TOKEN`; with the embedding strategy the
    /// category embeddings are computed here, and a failure there
    /// degrades classification rather than aborting startup.
    pub async fn init(config: Config) -> Result<Self, EngineError> {
        let token = hf_api_token()?;

        let classifier: Arc<dyn Classifier> = match config.classifier.strategy.as_str() {
            "lexical" => Arc::new(LexicalClassifier),
            _ => {
                let backend = Arc::new(HfEmbeddingClient::new(
                    config.inference.embedding.clone(),
                    token.clone(),
                ));
                let classifier = EmbeddingClassifier::init(backend).await;
                if !classifier.is_ready() {
                    tracing::warn!("Embedding classifier degraded, queries will random-sample");
                }
                Arc::new(classifier)
            }
        };

        let chat = Arc::new(HfChatClient::new(config.inference.chat.clone(), token));
        let composer = RouteComposer::new(chat, ComposerOptions::from(&config.inference.chat));

        Ok(Self {
            config,
            classifier,
            composer,
        })
    }

    /// Build the engine from preconstructed components. Used by tests to
    /// run the full pipeline against scripted backends.
    pub fn with_components(
        config: Config,
        classifier: Arc<dyn Classifier>,
        chat: Arc<dyn ChatBackend>,
    ) -> Self {
        let composer = RouteComposer::new(chat, ComposerOptions::from(&config.inference.chat));
        Self {
            config,
            classifier,
            composer,
        }
    }

    /// Answer one route request.
    ///
    /// The catalog is read fresh per call, so concurrent requests each
    /// see their own snapshot and edits to the file take effect without
    /// a restart.
    pub async fn generate_route(
        &self,
        query: &str,
        hours: Option<i64>,
        minutes: Option<i64>,
        start_point: &str,
    ) -> Result<Itinerary, EngineError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(EngineError::InvalidInput("Query is required".to_string()));
        }

        let total_minutes = resolve_duration(hours, minutes);
        tracing::info!(query, total_minutes, "Generating route");

        let catalog = load_catalog(&self.config.core.catalog_path)?;

        let opts = ClassifyOptions::from(&self.config.classifier);
        let mut candidates =
            select_candidates(self.classifier.as_ref(), query, &catalog, &opts).await;
        candidates.truncate(TOP_CANDIDATES);

        let interests = vec![query.to_string()];
        let route = self
            .composer
            .compose(&candidates, &interests, total_minutes, start_point)
            .await;

        Ok(assemble(&route, &candidates, start_point, total_minutes))
    }
}

/// Combine the requested hours and minutes into a total, treating
/// absent, non-positive, or absurd values as the default budget.
pub fn resolve_duration(hours: Option<i64>, minutes: Option<i64>) -> u32 {
    let total = hours.unwrap_or(0).saturating_mul(60).saturating_add(minutes.unwrap_or(0));
    if total <= 0 {
        return DEFAULT_DURATION_MINUTES;
    }
    u32::try_from(total).unwrap_or(DEFAULT_DURATION_MINUTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_duration() {
        assert_eq!(resolve_duration(Some(2), Some(30)), 150);
        assert_eq!(resolve_duration(None, Some(45)), 45);
        assert_eq!(resolve_duration(Some(3), None), 180);
        assert_eq!(resolve_duration(None, None), DEFAULT_DURATION_MINUTES);
        assert_eq!(resolve_duration(Some(0), Some(0)), DEFAULT_DURATION_MINUTES);
        assert_eq!(resolve_duration(Some(-1), Some(30)), DEFAULT_DURATION_MINUTES);
        assert_eq!(resolve_duration(Some(i64::MAX), Some(1)), DEFAULT_DURATION_MINUTES);
    }
}
