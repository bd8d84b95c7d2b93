//! Category Taxonomy
//!
//! Static lookup table mapping category ids to their Russian labels and
//! lexical trigger words. The id space is sparse by design: id 9
//! (infrastructure rows in the catalog) carries no triggers and never
//! surfaces in recommendations, and callers must tolerate ids with no
//! entry at all.
//!
//! Declaration order is significant: the embedding classifier embeds the
//! labels in this order, so row `i` of the embedding matrix corresponds
//! to `CATEGORIES[i].id`.

/// A single sightseeing category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    /// Stable small-integer identifier. Canonical id type for the whole
    /// engine; catalog rows normalize into this on load.
    pub id: u32,

    /// Human-readable Russian label, used in prompts and embeddings.
    pub label: &'static str,

    /// Lowercase stems matched as substrings by the lexical classifier.
    pub trigger_words: &'static [&'static str],
}

/// All known categories, in declaration order.
pub const CATEGORIES: &[Category] = &[
    Category {
        id: 1,
        label: "Памятники и скульптуры",
        trigger_words: &["памятник", "скульптур", "монумент", "бюст"],
    },
    Category {
        id: 2,
        label: "Парки, скверы и зоны отдыха",
        trigger_words: &["парк", "сквер", "природ", "зелен"],
    },
    Category {
        id: 3,
        label: "Макеты архитектурных объектов",
        trigger_words: &["макет", "тактильн"],
    },
    Category {
        id: 4,
        label: "Набережные",
        trigger_words: &["набережн", "волг", "ока"],
    },
    Category {
        id: 5,
        label: "Архитектура и исторические здания",
        trigger_words: &["архитектур", "здани", "усадьб", "кремл"],
    },
    Category {
        id: 6,
        label: "Культурно-досуговые центры и библиотеки",
        trigger_words: &["библиотек", "досуг"],
    },
    Category {
        id: 7,
        label: "Музеи и выставочные пространства",
        trigger_words: &["музе", "выставк", "экспозиц", "галере"],
    },
    Category {
        id: 8,
        label: "Театры и филармонии",
        trigger_words: &["театр", "филармон", "спектакл", "концерт"],
    },
    Category {
        id: 9,
        label: "Инфраструктура",
        trigger_words: &[],
    },
    Category {
        id: 10,
        label: "Монументально-декоративное искусство",
        trigger_words: &["мозаик", "панно", "фреск", "граффити"],
    },
    Category {
        id: 11,
        label: "Рестораны и кафе",
        trigger_words: &["ресторан", "кафе", "поесть", "кухн", "обед"],
    },
    Category {
        id: 12,
        label: "Кофейни",
        trigger_words: &["кофе", "капучино"],
    },
    Category {
        id: 13,
        label: "Кондитерские и пекарни",
        trigger_words: &["кондитерск", "пекарн", "десерт", "выпечк", "сладк"],
    },
    Category {
        id: 14,
        label: "Торговые центры",
        trigger_words: &["торгов", "магазин", "шоппинг", "покуп"],
    },
    Category {
        id: 15,
        label: "Места для развлечения",
        trigger_words: &["развлеч", "развлек", "кино", "аттракцион", "квест"],
    },
];

/// Look up a category by id. Returns `None` for reserved/unknown ids.
pub fn category_by_id(id: u32) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.id == id)
}

/// Human-readable label for a category id, with a generic fallback for
/// ids that have no entry.
pub fn label_or_generic(id: u32) -> &'static str {
    category_by_id(id)
        .map(|c| c.label)
        .unwrap_or("достопримечательность")
}

/// Labels in declaration order, for building the embedding matrix.
pub fn labels_in_order() -> Vec<String> {
    CATEGORIES.iter().map(|c| c.label.to_string()).collect()
}
