//! Candidate Selector
//!
//! Filters the catalog down to a scored candidate set for one query.
//! The classification confidence travels with each matching row as its
//! score; when classification yields nothing usable the selector falls
//! back to an unweighted random sample, so a non-empty catalog always
//! produces a non-empty candidate set.

use rand::seq::SliceRandom;

use crate::catalog::Place;
use crate::classifier::{Classifier, ClassifyOptions};

/// Number of rows sampled when no category matched.
const FALLBACK_SAMPLE_SIZE: usize = 5;

/// A catalog row with its derived relevance score.
#[derive(Debug, Clone)]
pub struct CandidatePlace {
    pub place: Place,
    /// Category confidence carried over from classification; 0.0 for
    /// rows selected by the random-sample fallback or by an unranked
    /// (lexical) match.
    pub score: f32,
}

/// Select scored candidates for `query` from a catalog snapshot.
///
/// Returns an empty set only when the catalog itself is empty; callers
/// treat that as an error upstream of this function.
pub async fn select_candidates(
    classifier: &dyn Classifier,
    query: &str,
    catalog: &[Place],
    opts: &ClassifyOptions,
) -> Vec<CandidatePlace> {
    let scores = classifier.classify(query, opts).await;

    if scores.is_empty() {
        tracing::warn!("No categories matched, sampling random places");
        return random_sample(catalog);
    }

    let mut candidates: Vec<CandidatePlace> = catalog
        .iter()
        .filter_map(|place| {
            let category_id = place.category_id?;
            let matched = scores.iter().find(|s| s.category_id == category_id)?;
            Some(CandidatePlace {
                place: place.clone(),
                score: matched.confidence.unwrap_or(0.0),
            })
        })
        .collect();

    if candidates.is_empty() {
        tracing::warn!("Matched categories have no catalog rows, sampling random places");
        return random_sample(catalog);
    }

    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    tracing::debug!("Selected {} candidates", candidates.len());
    candidates
}

fn random_sample(catalog: &[Place]) -> Vec<CandidatePlace> {
    let mut rng = rand::thread_rng();
    catalog
        .choose_multiple(&mut rng, FALLBACK_SAMPLE_SIZE.min(catalog.len()))
        .map(|place| CandidatePlace {
            place: place.clone(),
            score: 0.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::CategoryScore;
    use async_trait::async_trait;

    struct FixedClassifier(Vec<CategoryScore>);

    #[async_trait]
    impl Classifier for FixedClassifier {
        async fn classify(&self, _text: &str, _opts: &ClassifyOptions) -> Vec<CategoryScore> {
            self.0.clone()
        }
    }

    fn place(title: &str, category_id: Option<u32>) -> Place {
        Place {
            title: title.to_string(),
            address: String::new(),
            description: String::new(),
            coordinate: String::new(),
            category_id,
        }
    }

    fn small_catalog() -> Vec<Place> {
        vec![
            place("Памятник Чкалову", Some(1)),
            place("Парк Кулибина", Some(2)),
            place("Музей фотографии", Some(7)),
            place("Строка без категории", None),
        ]
    }

    #[tokio::test]
    async fn test_matching_rows_carry_confidence() {
        let classifier = FixedClassifier(vec![
            CategoryScore { category_id: 2, confidence: Some(0.8) },
            CategoryScore { category_id: 1, confidence: Some(0.5) },
        ]);
        let candidates = select_candidates(
            &classifier,
            "парк",
            &small_catalog(),
            &ClassifyOptions::default(),
        )
        .await;

        assert_eq!(candidates.len(), 2);
        // Sorted by descending score
        assert_eq!(candidates[0].place.title, "Парк Кулибина");
        assert_eq!(candidates[0].score, 0.8);
        assert_eq!(candidates[1].score, 0.5);
    }

    #[tokio::test]
    async fn test_unranked_match_scores_zero() {
        let classifier = FixedClassifier(vec![CategoryScore {
            category_id: 7,
            confidence: None,
        }]);
        let candidates = select_candidates(
            &classifier,
            "музей",
            &small_catalog(),
            &ClassifyOptions::default(),
        )
        .await;
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].score, 0.0);
    }

    #[tokio::test]
    async fn test_empty_classification_falls_back_to_sample() {
        let classifier = FixedClassifier(vec![]);
        let candidates = select_candidates(
            &classifier,
            "что-нибудь",
            &small_catalog(),
            &ClassifyOptions::default(),
        )
        .await;
        assert!(!candidates.is_empty());
        assert!(candidates.len() <= FALLBACK_SAMPLE_SIZE);
        assert!(candidates.iter().all(|c| c.score == 0.0));
    }

    #[tokio::test]
    async fn test_unmatched_categories_fall_back_to_sample() {
        // Category 14 matched but no catalog row carries it.
        let classifier = FixedClassifier(vec![CategoryScore {
            category_id: 14,
            confidence: Some(0.9),
        }]);
        let candidates = select_candidates(
            &classifier,
            "шоппинг",
            &small_catalog(),
            &ClassifyOptions::default(),
        )
        .await;
        assert!(!candidates.is_empty());
    }

    #[tokio::test]
    async fn test_empty_catalog_yields_empty_set() {
        let classifier = FixedClassifier(vec![]);
        let candidates =
            select_candidates(&classifier, "парк", &[], &ClassifyOptions::default()).await;
        assert!(candidates.is_empty());
    }
}
