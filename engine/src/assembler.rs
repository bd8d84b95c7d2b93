//! Result Assembler
//!
//! Joins a composed route back onto the catalog. Stop names come from a
//! generative model and rarely match catalog titles byte for byte, so
//! matching runs in three tiers of decreasing strictness: exact
//! case-insensitive, substring containment, then token overlap. A stop
//! that matches nothing is still kept, with an empty address and the
//! city-center coordinate, because dropping a stop the user was promised
//! is worse than a vague pin.

use serde::{Deserialize, Serialize};

use crate::catalog::Place;
use crate::composer::Route;
use crate::selector::CandidatePlace;

/// City center, used when a coordinate is missing or unparsable.
pub const DEFAULT_COORDINATE: [f64; 2] = [56.326887, 44.005986];

/// Minimum token-overlap ratio for the fuzzy matching tier.
const TOKEN_OVERLAP_THRESHOLD: f64 = 0.3;

/// One stop of the final itinerary, enriched from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryPlace {
    pub title: String,
    pub address: String,
    /// `[latitude, longitude]`
    pub coord: [f64; 2],
    pub description: String,
    pub reason: String,
    /// Visit duration in minutes.
    pub time: u32,
}

/// The complete answer to one route request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    #[serde(rename = "startPoint")]
    pub start_point: String,
    pub places: Vec<ItineraryPlace>,
    /// Route duration rendered as `"H ч M мин"`.
    #[serde(rename = "totalTime")]
    pub total_time: String,
    pub route_name: String,
    pub explanation: String,
    pub timeline: String,
    /// The minutes the user asked for, echoed back.
    #[serde(rename = "userTime")]
    pub user_time: u32,
}

/// Join `route` onto the candidate set it was composed from.
pub fn assemble(
    route: &Route,
    candidates: &[CandidatePlace],
    start_point: &str,
    user_minutes: u32,
) -> Itinerary {
    let places = route
        .stops
        .iter()
        .map(|stop| match find_place(&stop.name, candidates) {
            Some(place) => ItineraryPlace {
                title: stop.name.clone(),
                address: place.address.clone(),
                coord: parse_coordinate(&place.coordinate).unwrap_or(DEFAULT_COORDINATE),
                description: place.description.clone(),
                reason: stop.reason.clone(),
                time: stop.duration_minutes,
            },
            None => {
                tracing::debug!(stop = %stop.name, "Stop not found in catalog");
                ItineraryPlace {
                    title: stop.name.clone(),
                    address: String::new(),
                    coord: DEFAULT_COORDINATE,
                    description: String::new(),
                    reason: stop.reason.clone(),
                    time: stop.duration_minutes,
                }
            }
        })
        .collect();

    Itinerary {
        start_point: start_point.to_string(),
        places,
        total_time: format_duration(route.total_duration_minutes),
        route_name: route.route_name.clone(),
        explanation: route.explanation.clone(),
        timeline: route.timeline.clone(),
        user_time: user_minutes,
    }
}

/// Render minutes as `"H ч M мин"`.
pub fn format_duration(minutes: u32) -> String {
    format!("{} ч {} мин", minutes / 60, minutes % 60)
}

/// Three-tier name match against the candidate titles.
fn find_place<'a>(name: &str, candidates: &'a [CandidatePlace]) -> Option<&'a Place> {
    let needle = name.to_lowercase();
    let needle = needle.trim();
    if needle.is_empty() {
        return None;
    }

    if let Some(found) = candidates
        .iter()
        .find(|c| c.place.title.to_lowercase() == needle)
    {
        return Some(&found.place);
    }

    if let Some(found) = candidates
        .iter()
        .find(|c| c.place.title.to_lowercase().contains(needle))
    {
        return Some(&found.place);
    }

    let needle_tokens: Vec<&str> = needle.split_whitespace().collect();
    if needle_tokens.is_empty() {
        return None;
    }

    let mut best: Option<(&Place, f64)> = None;
    for candidate in candidates {
        let title = candidate.place.title.to_lowercase();
        let shared = needle_tokens
            .iter()
            .filter(|t| title.split_whitespace().any(|w| w == **t))
            .count();
        let score = shared as f64 / needle_tokens.len() as f64;
        if score > TOKEN_OVERLAP_THRESHOLD && best.map_or(true, |(_, s)| score > s) {
            best = Some((&candidate.place, score));
        }
    }
    best.map(|(place, _)| place)
}

/// Parse a coordinate from `POINT(lat lon)` or bare `lat lon` text.
pub fn parse_coordinate(raw: &str) -> Option<[f64; 2]> {
    let trimmed = raw.trim();
    let inner = if trimmed.contains("POINT") {
        trimmed
            .trim_start_matches(|c| c != '(')
            .trim_start_matches('(')
            .trim_end_matches(')')
    } else {
        trimmed
    };

    let mut parts = inner.split_whitespace();
    let lat: f64 = parts.next()?.parse().ok()?;
    let lon: f64 = parts.next()?.parse().ok()?;
    Some([lat, lon])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::RouteStop;

    fn candidate(title: &str, coordinate: &str) -> CandidatePlace {
        CandidatePlace {
            place: Place {
                title: title.to_string(),
                address: format!("адрес {}", title),
                description: format!("описание {}", title),
                coordinate: coordinate.to_string(),
                category_id: Some(1),
            },
            score: 0.5,
        }
    }

    fn route_with_stop(name: &str) -> Route {
        Route {
            route_name: "Тестовый маршрут".to_string(),
            total_duration_minutes: 125,
            timeline: "план".to_string(),
            explanation: "объяснение".to_string(),
            stops: vec![RouteStop {
                name: name.to_string(),
                order: 1,
                duration_minutes: 40,
                reason: "причина".to_string(),
            }],
        }
    }

    #[test]
    fn test_parse_coordinate_variants() {
        assert_eq!(
            parse_coordinate("POINT(56.328624 44.002842)"),
            Some([56.328624, 44.002842])
        );
        assert_eq!(parse_coordinate("56.282 43.984"), Some([56.282, 43.984]));
        assert_eq!(parse_coordinate("  POINT( 56.1 44.1 ) "), Some([56.1, 44.1]));
        assert_eq!(parse_coordinate(""), None);
        assert_eq!(parse_coordinate("POINT(abc def)"), None);
        assert_eq!(parse_coordinate("56.3"), None);
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let candidates = vec![candidate("Парк Швейцария", "56.28 43.98")];
        let found = find_place("парк швейцария", &candidates).expect("match");
        assert_eq!(found.title, "Парк Швейцария");
    }

    #[test]
    fn test_substring_match() {
        let candidates = vec![candidate("Государственный музей фотографии", "56.3 44.0")];
        let found = find_place("музей фотографии", &candidates).expect("match");
        assert_eq!(found.title, "Государственный музей фотографии");
    }

    #[test]
    fn test_token_overlap_match() {
        let candidates = vec![
            candidate("Памятник Валерию Чкалову", "56.33 44.0"),
            candidate("Парк Кулибина", "56.31 43.99"),
        ];
        // Word order differs and one extra token; substring fails,
        // overlap is 2/3.
        let found = find_place("Чкалову памятник знаменитый", &candidates).expect("match");
        assert_eq!(found.title, "Памятник Валерию Чкалову");
    }

    #[test]
    fn test_weak_overlap_is_no_match() {
        let candidates = vec![candidate("Парк Кулибина", "56.31 43.99")];
        assert!(find_place("набережная Федоровского у реки", &candidates).is_none());
    }

    #[test]
    fn test_assemble_enriches_matched_stop() {
        let candidates = vec![candidate("Парк Швейцария", "POINT(56.282 43.984)")];
        let itinerary = assemble(&route_with_stop("Парк Швейцария"), &candidates, "центр", 180);

        assert_eq!(itinerary.places.len(), 1);
        assert_eq!(itinerary.places[0].address, "адрес Парк Швейцария");
        assert_eq!(itinerary.places[0].coord, [56.282, 43.984]);
        assert_eq!(itinerary.places[0].time, 40);
        assert_eq!(itinerary.total_time, "2 ч 5 мин");
        assert_eq!(itinerary.user_time, 180);
        assert_eq!(itinerary.start_point, "центр");
    }

    #[test]
    fn test_assemble_keeps_unmatched_stop_with_defaults() {
        let candidates = vec![candidate("Парк Швейцария", "56.28 43.98")];
        let itinerary = assemble(&route_with_stop("Выдуманное место"), &candidates, "центр", 60);

        assert_eq!(itinerary.places.len(), 1);
        assert_eq!(itinerary.places[0].address, "");
        assert_eq!(itinerary.places[0].coord, DEFAULT_COORDINATE);
        assert_eq!(itinerary.places[0].reason, "причина");
    }

    #[test]
    fn test_unparsable_coordinate_defaults() {
        let candidates = vec![candidate("Парк Швейцария", "нет координат")];
        let itinerary = assemble(&route_with_stop("Парк Швейцария"), &candidates, "центр", 60);
        assert_eq!(itinerary.places[0].coord, DEFAULT_COORDINATE);
    }

    #[test]
    fn test_serialized_field_names() {
        let itinerary = assemble(&route_with_stop("Место"), &[], "старт", 90);
        let json = serde_json::to_value(&itinerary).expect("serialize");
        assert!(json.get("startPoint").is_some());
        assert!(json.get("totalTime").is_some());
        assert!(json.get("userTime").is_some());
        assert!(json.get("route_name").is_some());
    }
}
