//! Deterministic Russian phrasing for routes.
//!
//! Everything a route needs to say when the generative path cannot be
//! trusted: per-category justification phrases, route-name themes, and
//! the Cyrillic character-class checks used to validate generated text.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

/// Per-category stock justifications, keyed by category id.
const FALLBACK_REASONS: &[(u32, &str)] = &[
    (1, "выбран потому что это исторический памятник, отражающий культурное наследие города"),
    (2, "включен в маршрут как природный объект для отдыха и прогулок"),
    (3, "добавлен как доступный макет для тактильного ознакомления"),
    (4, "выбран из-за живописной набережной с красивыми видами"),
    (5, "включен как архитектурная достопримечательность с богатой историей"),
    (6, "добавлен как общественное пространство для мероприятий и отдыха"),
    (7, "выбран потому что это музей с интересными экспозициями"),
    (8, "включен как культурное учреждение для досуга и развлечений"),
    (10, "добавлен как произведение монументального искусства"),
    (11, "выбран как заведение для полноценного питания и отдыха"),
    (12, "включен как уютное место для кофе-брейка и встреч"),
    (13, "добавлен как кондитерская со свежей выпечкой и сладостями"),
    (14, "выбран как торговый комплекс с разнообразными магазинами"),
    (15, "включен как развлекательное заведение для активного отдыха"),
];

const GENERIC_REASON: &str = "выбрано как интересное место для посещения";

/// Route-name themes for the dominant category.
const CATEGORY_THEMES: &[(u32, &str)] = &[
    (1, "Исторический"),
    (2, "Природный"),
    (5, "Архитектурный"),
    (7, "Музейный"),
    (11, "Гастрономический"),
    (12, "Кофейный"),
    (13, "Кондитерский"),
    (14, "Шопинг"),
    (15, "Развлекательный"),
];

const DEFAULT_ROUTE_NAME: &str = "Обзорный маршрут по Нижнему Новгороду";

fn russian_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[а-яА-ЯёЁ0-9\s.,!?;:()«»—-]+$").expect("russian pattern is valid")
    })
}

fn non_russian_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[^а-яА-ЯёЁ0-9\s.,!?;:()«»—-]").expect("non-russian pattern is valid")
    })
}

/// Script test: is the first stretch of `text` plain Russian prose?
///
/// Checks a 100-character sample with quotes stripped, mirroring the
/// latitude a generative model needs for punctuation.
pub fn is_russian_text(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let sample: String = text
        .chars()
        .take(100)
        .filter(|c| *c != '"' && *c != '\'')
        .collect();
    !sample.is_empty() && russian_pattern().is_match(&sample)
}

/// Strip everything outside the Russian character class and trim.
pub fn clean_russian_text(text: &str) -> String {
    non_russian_chars().replace_all(text, "").trim().to_string()
}

/// Stock justification for a stop, chosen by category and sharpened by
/// the user's stated interests when they line up with the category.
pub fn fallback_reason(category_id: Option<u32>, interests: &[String]) -> String {
    let base = category_id
        .and_then(|id| {
            FALLBACK_REASONS
                .iter()
                .find(|(key, _)| *key == id)
                .map(|(_, reason)| *reason)
        })
        .unwrap_or(GENERIC_REASON);

    let Some(id) = category_id else {
        return base.to_string();
    };

    let interests_str = interests.join(" ").to_lowercase();
    if interests_str.is_empty() {
        return base.to_string();
    }

    if contains_any(&interests_str, &["истори", "музей", "памятник"]) && [1, 5, 7].contains(&id) {
        return format!("выбран потому что соответствует вашему интересу к истории: {}", base);
    }
    if contains_any(&interests_str, &["еда", "кухн", "ресторан", "кофе", "питание"])
        && [11, 12, 13].contains(&id)
    {
        return format!("включен как гастрономическое место, соответствующее вашим интересам: {}", base);
    }
    if contains_any(&interests_str, &["покуп", "шоппинг", "торгов"]) && id == 14 {
        return format!("добавлен для шопинга по вашему запросу: {}", base);
    }
    if contains_any(&interests_str, &["развлек", "отдых", "досуг", "кино"])
        && [2, 6, 15].contains(&id)
    {
        return format!("выбран для развлечений и отдыха: {}", base);
    }

    base.to_string()
}

/// Deterministic route name from the dominant category, falling back to
/// interest keywords, then to the generic city-overview name.
pub fn route_name(category_ids: &[u32], interests: &[String]) -> String {
    if let Some(dominant) = dominant_category(category_ids) {
        if let Some((_, theme)) = CATEGORY_THEMES.iter().find(|(id, _)| *id == dominant) {
            return format!("{} маршрут по Нижнему Новгороду", theme);
        }
    }

    let interests_str = interests.join(" ").to_lowercase();
    if contains_any(&interests_str, &["истори", "музей"]) {
        return "Исторический маршрут по городу".to_string();
    }
    if contains_any(&interests_str, &["еда", "кухн", "ресторан", "кофе"]) {
        return "Гастрономический маршрут".to_string();
    }
    if contains_any(&interests_str, &["покуп", "шоппинг"]) {
        return "Торговый маршрут".to_string();
    }
    if contains_any(&interests_str, &["развлек", "отдых"]) {
        return "Развлекательный маршрут".to_string();
    }

    DEFAULT_ROUTE_NAME.to_string()
}

/// Most frequent category id; ties break toward the first encountered.
fn dominant_category(category_ids: &[u32]) -> Option<u32> {
    let mut counts: HashMap<u32, usize> = HashMap::new();
    for id in category_ids {
        *counts.entry(*id).or_insert(0) += 1;
    }
    let mut best: Option<(u32, usize)> = None;
    for id in category_ids {
        let count = counts.get(id).copied().unwrap_or(0);
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((*id, count)),
        }
    }
    best.map(|(id, _)| id)
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_russian_text() {
        assert!(is_russian_text("Исторический маршрут по городу"));
        assert!(is_russian_text("Маршрут из 4 мест, около 2 часов!"));
        assert!(!is_russian_text("A historical route"));
        assert!(!is_russian_text("Маршрут with English words"));
        assert!(!is_russian_text(""));
    }

    #[test]
    fn test_clean_russian_text() {
        assert_eq!(clean_russian_text("Кремль <b>XVI</b> века"), "Кремль  века");
        assert_eq!(clean_russian_text("  набережная  "), "набережная");
    }

    #[test]
    fn test_fallback_reason_interest_boost() {
        let interests = vec!["интересуюсь историей города".to_string()];
        let reason = fallback_reason(Some(7), &interests);
        assert!(reason.starts_with("выбран потому что соответствует вашему интересу к истории"));

        // Food interest does not boost a museum
        let food = vec!["хочу поесть".to_string()];
        let reason = fallback_reason(Some(7), &food);
        assert!(reason.starts_with("выбран потому что это музей"));
    }

    #[test]
    fn test_fallback_reason_unknown_category() {
        assert_eq!(fallback_reason(Some(99), &[]), GENERIC_REASON);
        assert_eq!(fallback_reason(None, &[]), GENERIC_REASON);
    }

    #[test]
    fn test_route_name_dominant_category() {
        assert_eq!(
            route_name(&[7, 7, 2], &[]),
            "Музейный маршрут по Нижнему Новгороду"
        );
    }

    #[test]
    fn test_route_name_from_interests() {
        // Dominant category 4 has no theme; interests decide.
        assert_eq!(
            route_name(&[4], &["люблю рестораны и кофе".to_string()]),
            "Гастрономический маршрут"
        );
    }

    #[test]
    fn test_route_name_default() {
        assert_eq!(route_name(&[], &[]), DEFAULT_ROUTE_NAME);
    }
}
