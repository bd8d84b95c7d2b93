//! Place catalog loading
//!
//! The catalog is a CSV file with the columns `title, address,
//! description, coordinate, category_id`. It is read fresh for every
//! route request so concurrent requests each work on their own snapshot.
//! The source data is sparse: category ids arrive as integers, floats, or
//! strings depending on how the sheet was exported, and some rows have no
//! id at all. Normalization happens once at load time; rows that fail it
//! keep `category_id: None` and simply never match a classification.

use std::path::Path;

use serde::Deserialize;

use crate::error::EngineError;

/// One row of the place catalog.
#[derive(Debug, Clone)]
pub struct Place {
    pub title: String,
    pub address: String,
    pub description: String,
    /// Raw coordinate text, either `POINT(lat lon)` or `lat lon`.
    pub coordinate: String,
    pub category_id: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawPlace {
    title: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    coordinate: String,
    #[serde(default)]
    category_id: String,
}

/// Load the catalog from a CSV file.
///
/// An unreadable file or an empty table is a hard error; everything else
/// (missing ids, blank addresses) loads leniently.
pub fn load_catalog(path: &Path) -> Result<Vec<Place>, EngineError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| EngineError::Catalog(format!("Failed to open catalog {}: {}", path.display(), e)))?;

    let mut places = Vec::new();
    for record in reader.deserialize::<RawPlace>() {
        let raw = record
            .map_err(|e| EngineError::Catalog(format!("Failed to parse catalog row: {}", e)))?;
        places.push(Place {
            category_id: normalize_category_id(&raw.category_id),
            title: raw.title,
            address: raw.address,
            description: raw.description,
            coordinate: raw.coordinate,
        });
    }

    if places.is_empty() {
        return Err(EngineError::Catalog("Catalog is empty".to_string()));
    }

    tracing::info!("Catalog loaded: {} places", places.len());
    Ok(places)
}

/// Normalize a category id that may be an integer, a float rendered as
/// text ("7.0"), or surrounded by whitespace. Anything else is `None`.
pub fn normalize_category_id(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(id) = trimmed.parse::<u32>() {
        return Some(id);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f >= 0.0 && f <= u32::MAX as f64 => Some(f as u32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_catalog(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[test]
    fn test_normalize_category_id_variants() {
        assert_eq!(normalize_category_id("7"), Some(7));
        assert_eq!(normalize_category_id(" 12 "), Some(12));
        assert_eq!(normalize_category_id("7.0"), Some(7));
        assert_eq!(normalize_category_id(""), None);
        assert_eq!(normalize_category_id("n/a"), None);
        assert_eq!(normalize_category_id("7.5"), None);
    }

    #[test]
    fn test_load_catalog() {
        let file = write_catalog(
            "title,address,description,coordinate,category_id\n\
             Кремль,Кремль 1,Крепость XVI века,POINT(56.328624 44.002842),5\n\
             Парк Швейцария,пр. Гагарина,Городской парк,56.282 43.984,2.0\n\
             Без категории,ул. Тестовая,,56.3 44.0,\n",
        );
        let places = load_catalog(file.path()).expect("catalog loads");
        assert_eq!(places.len(), 3);
        assert_eq!(places[0].category_id, Some(5));
        assert_eq!(places[1].category_id, Some(2));
        assert_eq!(places[2].category_id, None);
        assert_eq!(places[0].title, "Кремль");
    }

    #[test]
    fn test_load_empty_catalog_is_error() {
        let file = write_catalog("title,address,description,coordinate,category_id\n");
        let err = load_catalog(file.path()).expect_err("empty catalog rejected");
        assert!(matches!(err, EngineError::Catalog(_)));
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let err = load_catalog(Path::new("/nonexistent/dataset.csv"))
            .expect_err("missing file rejected");
        assert!(matches!(err, EngineError::Catalog(_)));
    }
}
