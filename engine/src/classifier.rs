//! Category Classifier
//!
//! Turns free text into a ranked list of (category id, confidence) pairs.
//! Two interchangeable strategies implement the same trait: a lexical
//! substring matcher (deterministic, offline) and an embedding-similarity
//! matcher that ranks categories by cosine similarity against label
//! embeddings computed once at startup.
//!
//! An unreachable embedding capability is never an error at this layer:
//! the classifier returns an empty list and the candidate selector falls
//! back to random sampling.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ClassifierConfig;
use crate::inference::EmbeddingBackend;
use crate::taxonomy::{labels_in_order, CATEGORIES};

/// One classified category with its confidence.
///
/// Confidence is `None` for strategies that match without ranking
/// (lexical); the selector carries it over as a 0.0 score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryScore {
    pub category_id: u32,
    pub confidence: Option<f32>,
}

/// Selection bounds for one classification call.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyOptions {
    pub similarity_threshold: f32,
    pub min_categories: usize,
    pub max_categories: usize,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.3,
            min_categories: 2,
            max_categories: 5,
        }
    }
}

impl From<&ClassifierConfig> for ClassifyOptions {
    fn from(config: &ClassifierConfig) -> Self {
        Self {
            similarity_threshold: config.similarity_threshold,
            min_categories: config.min_categories,
            max_categories: config.max_categories,
        }
    }
}

/// Classification strategy trait.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify `text` into categories, ordered by descending confidence.
    ///
    /// An empty result means "no categorization available" and is not an
    /// error; callers apply their own fallback.
    async fn classify(&self, text: &str, opts: &ClassifyOptions) -> Vec<CategoryScore>;
}

/// Deterministic substring matcher over the taxonomy trigger words.
pub struct LexicalClassifier;

#[async_trait]
impl Classifier for LexicalClassifier {
    async fn classify(&self, text: &str, opts: &ClassifyOptions) -> Vec<CategoryScore> {
        let lowered = text.to_lowercase();
        CATEGORIES
            .iter()
            .filter(|category| {
                category
                    .trigger_words
                    .iter()
                    .any(|word| lowered.contains(word))
            })
            .take(opts.max_categories)
            .map(|category| CategoryScore {
                category_id: category.id,
                confidence: None,
            })
            .collect()
    }
}

/// Embedding-similarity matcher.
///
/// Category label embeddings are computed once at construction and held
/// read-only for the process lifetime. If that startup call fails the
/// classifier stays usable but degrades to empty classifications.
pub struct EmbeddingClassifier {
    backend: Arc<dyn EmbeddingBackend>,
    category_embeddings: Option<Vec<Vec<f32>>>,
}

impl EmbeddingClassifier {
    /// Build the classifier, embedding all category labels up front.
    pub async fn init(backend: Arc<dyn EmbeddingBackend>) -> Self {
        let labels = labels_in_order();
        let category_embeddings = match backend.embed(&labels).await {
            Ok(vectors) if vectors.len() == CATEGORIES.len() => {
                tracing::info!("Category embeddings loaded ({} vectors)", vectors.len());
                Some(vectors)
            }
            Ok(vectors) => {
                tracing::warn!(
                    "Category embedding count mismatch: got {}, expected {}",
                    vectors.len(),
                    CATEGORIES.len()
                );
                None
            }
            Err(e) => {
                tracing::warn!("Failed to load category embeddings: {}", e);
                None
            }
        };
        Self {
            backend,
            category_embeddings,
        }
    }

    /// Construct with precomputed category vectors. Used by tests to
    /// inject fake embeddings without a live endpoint.
    pub fn with_category_embeddings(
        backend: Arc<dyn EmbeddingBackend>,
        category_embeddings: Vec<Vec<f32>>,
    ) -> Self {
        Self {
            backend,
            category_embeddings: Some(category_embeddings),
        }
    }

    /// True when startup embedding succeeded.
    pub fn is_ready(&self) -> bool {
        self.category_embeddings.is_some()
    }
}

#[async_trait]
impl Classifier for EmbeddingClassifier {
    async fn classify(&self, text: &str, opts: &ClassifyOptions) -> Vec<CategoryScore> {
        let Some(category_embeddings) = &self.category_embeddings else {
            return Vec::new();
        };

        let query = match self.backend.embed(&[text.to_string()]).await {
            Ok(vectors) if !vectors.is_empty() => vectors.into_iter().next().unwrap_or_default(),
            Ok(_) => {
                tracing::warn!("Empty embedding response for query");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!("Query embedding failed: {}", e);
                return Vec::new();
            }
        };

        let mut ranked: Vec<(usize, f32)> = category_embeddings
            .iter()
            .enumerate()
            .map(|(index, vector)| (index, cosine_similarity(&query, vector)))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        select_ranked(&ranked, opts)
    }
}

/// Two-phase selection over a descending-sorted similarity list.
///
/// Phase one takes everything at or above the threshold, capped at
/// `max_categories`. Phase two keeps filling from the sorted list
/// regardless of threshold until `min_categories` is reached, so even a
/// query with no strong match yields a usable candidate set.
fn select_ranked(ranked: &[(usize, f32)], opts: &ClassifyOptions) -> Vec<CategoryScore> {
    let mut found: Vec<CategoryScore> = Vec::new();

    for &(index, score) in ranked {
        if score < opts.similarity_threshold {
            break;
        }
        found.push(CategoryScore {
            category_id: CATEGORIES[index].id,
            confidence: Some(score),
        });
        if found.len() >= opts.max_categories {
            return found;
        }
    }

    if found.len() < opts.min_categories {
        for &(index, score) in ranked {
            let id = CATEGORIES[index].id;
            if found.iter().any(|s| s.category_id == id) {
                continue;
            }
            found.push(CategoryScore {
                category_id: id,
                confidence: Some(score),
            });
            if found.len() >= opts.min_categories {
                break;
            }
        }
    }

    found
}

/// Cosine similarity; 0.0 for mismatched or zero-length vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
