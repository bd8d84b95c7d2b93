//! Route Composer
//!
//! Turns a scored candidate set into a finished route. The primary path
//! prompts the chat capability for a JSON route and validates the reply
//! field by field; everything that survives validation is used, and
//! everything that does not is replaced deterministically. When the model
//! is unreachable, exhausts its retry budget, or returns unusable text,
//! a deterministic fallback composer produces the route instead.
//!
//! compose is infallible: given a candidate set it always returns a
//! route, and given an empty one it returns the minimal single-stop
//! route. Finished routes are memoized by a content hash of the inputs.

pub mod phrasing;
pub mod repair;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::config::ChatConfig;
use crate::inference::{ChatBackend, InferenceError};
use crate::selector::CandidatePlace;
use crate::taxonomy::label_or_generic;

/// Upper bound on stops in a composed route.
const MAX_STOPS: usize = 4;

/// Candidates shown to the model in the prompt.
const PROMPT_CANDIDATES: usize = 5;

/// Stop duration when the model omits one.
const DEFAULT_STOP_MINUTES: u32 = 30;

/// Per-stop floor for the fallback composer.
const MIN_FALLBACK_STOP_MINUTES: u32 = 25;

/// Hard ceiling on route duration (one day).
const MAX_TOTAL_MINUTES: u32 = 1440;

const SYSTEM_PROMPT: &str =
    "Ты — умный русскоязычный помощник по созданию туристических маршрутов.";

/// One stop of a composed route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStop {
    pub name: String,
    /// Position in the route, contiguous from 1.
    pub order: u32,
    pub duration_minutes: u32,
    /// Russian justification for including this stop.
    pub reason: String,
}

/// A finished route, before catalog enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub route_name: String,
    pub total_duration_minutes: u32,
    pub timeline: String,
    pub explanation: String,
    pub stops: Vec<RouteStop>,
}

/// Retry parameters for the generative path.
#[derive(Debug, Clone)]
pub struct ComposerOptions {
    pub max_attempts: u32,
    pub warmup_backoff: Duration,
}

impl From<&ChatConfig> for ComposerOptions {
    fn from(config: &ChatConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            warmup_backoff: Duration::from_secs(config.warmup_backoff_secs),
        }
    }
}

/// What to do after a failed generation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryStep {
    /// Wait, then try again (model still loading).
    Backoff(Duration),
    /// Try again immediately.
    Continue,
    /// Stop trying; the request itself is broken.
    Abort,
}

/// Classify an attempt failure into a retry action. Warming waits
/// linearly longer each attempt; client errors are not retried.
fn retry_step(error: &InferenceError, attempt: u32, warmup_backoff: Duration) -> RetryStep {
    match error {
        InferenceError::ModelWarming => RetryStep::Backoff(warmup_backoff * (attempt + 1)),
        InferenceError::ClientError { .. } | InferenceError::AuthenticationFailed(_) => {
            RetryStep::Abort
        }
        _ => RetryStep::Continue,
    }
}

pub struct RouteComposer {
    chat: Arc<dyn ChatBackend>,
    options: ComposerOptions,
    // Taken only for get/insert, never across an await point.
    cache: Mutex<HashMap<String, Route>>,
}

impl RouteComposer {
    pub fn new(chat: Arc<dyn ChatBackend>, options: ComposerOptions) -> Self {
        Self {
            chat,
            options,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Compose a route for the candidate set. Never fails: the generative
    /// path is tried first, then the deterministic fallback.
    pub async fn compose(
        &self,
        candidates: &[CandidatePlace],
        interests: &[String],
        total_minutes: u32,
        start_point: &str,
    ) -> Route {
        let key = cache_key(candidates, interests, total_minutes);
        if let Some(cached) = self.cache.lock().ok().and_then(|c| c.get(&key).cloned()) {
            tracing::debug!("Route cache hit");
            return cached;
        }

        let prompt = build_prompt(candidates, interests, total_minutes, start_point);

        let route = match self.generate_with_retry(&prompt).await {
            Some(text) => match repair::parse_with_repair(&text)
                .and_then(|value| validate_generated(&value, candidates, interests))
            {
                Some(route) => {
                    tracing::info!(route_name = %route.route_name, "Generated route accepted");
                    route
                }
                None => {
                    tracing::warn!("Model reply unusable, composing fallback route");
                    fallback_route(candidates, interests, total_minutes)
                }
            },
            None => {
                tracing::warn!("No model reply, composing fallback route");
                fallback_route(candidates, interests, total_minutes)
            }
        };

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, route.clone());
        }
        route
    }

    /// Run the bounded generation loop. Returns the raw reply text, or
    /// `None` when every attempt failed or the reply was empty.
    async fn generate_with_retry(&self, prompt: &str) -> Option<String> {
        for attempt in 0..self.options.max_attempts {
            match self.chat.complete(SYSTEM_PROMPT, prompt).await {
                Ok(text) if !text.trim().is_empty() => return Some(text),
                Ok(_) => {
                    tracing::warn!("Empty completion from model");
                    return None;
                }
                Err(e) => match retry_step(&e, attempt, self.options.warmup_backoff) {
                    RetryStep::Backoff(wait) => {
                        tracing::info!(attempt, wait_secs = wait.as_secs(), "Model warming up");
                        tokio::time::sleep(wait).await;
                    }
                    RetryStep::Continue => {
                        tracing::warn!(attempt, error = %e, "Generation attempt failed");
                    }
                    RetryStep::Abort => {
                        tracing::warn!(error = %e, "Generation aborted");
                        return None;
                    }
                },
            }
        }
        None
    }
}

/// Content hash of one compose request, so identical requests reuse the
/// finished route. Names and interests are sorted first: the key must
/// not depend on candidate ordering.
fn cache_key(candidates: &[CandidatePlace], interests: &[String], total_minutes: u32) -> String {
    let mut names: Vec<String> = candidates
        .iter()
        .map(|c| {
            format!(
                "{}:{}",
                c.place.title,
                c.place.category_id.map_or(String::new(), |id| id.to_string())
            )
        })
        .collect();
    names.sort_unstable();

    let mut sorted_interests = interests.to_vec();
    sorted_interests.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(names.join("\n"));
    hasher.update("\x1f");
    hasher.update(sorted_interests.join("\n"));
    hasher.update("\x1f");
    hasher.update(total_minutes.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Render the generation prompt: a numbered candidate list with category
/// labels, the user's interests, the time budget, and the exact JSON
/// shape the reply must take.
fn build_prompt(
    candidates: &[CandidatePlace],
    interests: &[String],
    total_minutes: u32,
    start_point: &str,
) -> String {
    let places_text = if candidates.is_empty() {
        "Нет доступных мест".to_string()
    } else {
        candidates
            .iter()
            .take(PROMPT_CANDIDATES)
            .enumerate()
            .map(|(i, c)| {
                let label = c
                    .place
                    .category_id
                    .map(label_or_generic)
                    .unwrap_or("достопримечательность");
                format!("{}. {} ({})", i + 1, c.place.title, label)
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Ты - помощник для создания туристических маршрутов. Создай связный маршрут по Нижнему Новгороду. ОБЯЗАТЕЛЬНО ИСПОЛЬЗУЙ ТОЛЬКО РУССКИЙ ЯЗЫК.\n\n\
         Доступные места для посещения:\n{places}\n\n\
         Интересы пользователя: {interests}\n\
         Общее время маршрута: {duration} минут\n\
         Начальная точка: {location}\n\n\
         Создай маршрут, который логически соединяет эти места. Для каждого места дай КРАТКОЕ объяснение на РУССКОМ языке - почему именно оно было выбрано с учетом интересов пользователя и категории места.\n\n\
         Верни ответ ТОЛЬКО в формате JSON без каких-либо дополнительных пояснений:\n\
         {{\n\
         \"route_name\": \"креативное название маршрута на русском\",\n\
         \"total_duration\": общее_время,\n\
         \"timeline\": \"краткое описание временного плана\",\n\
         \"explanation\": \"общее объяснение выбора маршрута\",\n\
         \"places\": [\n\
           {{\n\
             \"name\": \"название места\",\n\
             \"order\": 1,\n\
             \"duration\": 30,\n\
             \"reason\": \"объяснение почему выбрано это место с учетом интересов пользователя\"\n\
           }}\n\
         ]\n\
         }}",
        places = places_text,
        interests = interests.join(", "),
        duration = total_minutes,
        location = start_point,
    )
}

/// Validate a parsed model reply into a route.
///
/// Field rules: `places` must be a non-empty list after dropping
/// nameless entries and truncating to four; orders are renumbered
/// contiguously; every free-text field must pass the Cyrillic check or
/// is replaced/sanitized; durations default per stop and the total is
/// clamped to a day. `None` means the reply is beyond salvage.
fn validate_generated(
    value: &Value,
    candidates: &[CandidatePlace],
    interests: &[String],
) -> Option<Route> {
    let raw_places = value.get("places")?.as_array()?;

    let mut stops: Vec<RouteStop> = Vec::new();
    for raw in raw_places.iter().take(MAX_STOPS) {
        let Some(name) = raw.get("name").and_then(Value::as_str) else {
            continue;
        };
        let name = phrasing::clean_russian_text(name);
        if name.is_empty() {
            continue;
        }

        let reason = match raw.get("reason").and_then(Value::as_str) {
            Some(r) if phrasing::is_russian_text(r) => phrasing::clean_russian_text(r),
            _ => {
                let category = candidates
                    .iter()
                    .find(|c| c.place.title == name)
                    .and_then(|c| c.place.category_id);
                phrasing::fallback_reason(category, interests)
            }
        };

        let duration_minutes = raw
            .get("duration")
            .and_then(Value::as_u64)
            .map(|d| d.min(MAX_TOTAL_MINUTES as u64) as u32)
            .unwrap_or(DEFAULT_STOP_MINUTES);

        stops.push(RouteStop {
            name,
            order: stops.len() as u32 + 1,
            duration_minutes,
            reason,
        });
    }

    if stops.is_empty() {
        return None;
    }

    // Name regeneration uses the categories of the surviving stops,
    // not the whole candidate pool.
    let stop_categories: Vec<u32> = stops
        .iter()
        .filter_map(|s| {
            candidates
                .iter()
                .find(|c| c.place.title == s.name)
                .and_then(|c| c.place.category_id)
        })
        .collect();

    let route_name = match value.get("route_name").and_then(Value::as_str) {
        Some(n) if phrasing::is_russian_text(n) => phrasing::clean_russian_text(n),
        _ => phrasing::route_name(&stop_categories, interests),
    };

    let stop_sum: u32 = stops.iter().map(|s| s.duration_minutes).sum();
    let total_duration_minutes = value
        .get("total_duration")
        .and_then(Value::as_u64)
        .map(|d| d as u32)
        .unwrap_or(stop_sum)
        .min(MAX_TOTAL_MINUTES);

    let timeline = match value.get("timeline").and_then(Value::as_str) {
        Some(t) => phrasing::clean_russian_text(t),
        None => format!("Маршрут из {} мест", stops.len()),
    };

    let explanation = match value.get("explanation").and_then(Value::as_str) {
        Some(e) => phrasing::clean_russian_text(e),
        None => "Маршрут составлен с учетом ваших интересов".to_string(),
    };

    Some(Route {
        route_name,
        total_duration_minutes,
        timeline,
        explanation,
        stops,
    })
}

/// Deterministic composer: first four candidates, time budget split
/// evenly with a 25-minute floor per stop.
pub fn fallback_route(
    candidates: &[CandidatePlace],
    interests: &[String],
    total_minutes: u32,
) -> Route {
    if candidates.is_empty() {
        return minimal_route();
    }

    let selected = &candidates[..candidates.len().min(MAX_STOPS)];
    let per_stop = (total_minutes / selected.len() as u32).max(MIN_FALLBACK_STOP_MINUTES);

    let stops: Vec<RouteStop> = selected
        .iter()
        .enumerate()
        .map(|(i, c)| RouteStop {
            name: phrasing::clean_russian_text(&c.place.title),
            order: i as u32 + 1,
            duration_minutes: per_stop,
            reason: phrasing::fallback_reason(c.place.category_id, interests),
        })
        .collect();

    let categories: Vec<u32> = selected.iter().filter_map(|c| c.place.category_id).collect();
    let interests_text = if interests.is_empty() {
        "основные достопримечательности".to_string()
    } else {
        interests.join(", ")
    };

    Route {
        route_name: phrasing::route_name(&categories, interests),
        total_duration_minutes: (per_stop * stops.len() as u32).min(MAX_TOTAL_MINUTES),
        timeline: format!("Посещение {} мест", stops.len()),
        explanation: format!(
            "Маршрут составлен автоматически с учетом ваших интересов: {}",
            interests_text
        ),
        stops,
    }
}

/// Last-resort route when there are no candidates at all.
fn minimal_route() -> Route {
    Route {
        route_name: "Базовый маршрут по городу".to_string(),
        total_duration_minutes: 90,
        timeline: "Прогулка по центру".to_string(),
        explanation: "Рекомендуется уточнить интересующие места для детального маршрута"
            .to_string(),
        stops: vec![RouteStop {
            name: "Центральные достопримечательности".to_string(),
            order: 1,
            duration_minutes: 90,
            reason: "выбраны для обзора главных мест города".to_string(),
        }],
    }
}
