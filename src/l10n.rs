use crate::ports::Translator;
use anyhow::{Context, Result};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_LANGUAGE: &str = "en";

/// Flat key → text table. Unknown keys translate to themselves.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    language: String,
    entries: HashMap<String, String>,
}

impl Catalog {
    pub fn english() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            entries: HashMap::new(),
        }
    }

    /// Loads `<data_dir>/l10n/<language>.json`, falling back to English when
    /// the file does not exist.
    pub fn load(data_dir: &Path, language: &str) -> Result<Self> {
        let path = catalog_path(data_dir, language);
        if language == DEFAULT_LANGUAGE || !path.exists() {
            return Ok(Self::english());
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("read translations {}", path.display()))?;
        let entries: HashMap<String, String> =
            serde_json::from_str(&raw).context("parse translations")?;
        Ok(Self {
            language: language.to_string(),
            entries,
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

impl Translator for Catalog {
    fn translate(&self, key: &str) -> String {
        self.entries
            .get(key)
            .filter(|text| !text.is_empty())
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

pub fn catalog_path(data_dir: &Path, language: &str) -> PathBuf {
    data_dir.join("l10n").join(format!("{language}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_catalog_and_falls_back_per_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = catalog_path(dir.path(), "de");
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, r#"{"Error": "Fehler", "Cancel": ""}"#).expect("write");

        let catalog = Catalog::load(dir.path(), "de").expect("load");
        assert_eq!(catalog.language(), "de");
        assert_eq!(catalog.translate("Error"), "Fehler");
        assert_eq!(catalog.translate("Cancel"), "Cancel");
        assert_eq!(catalog.translate("Unknown key"), "Unknown key");
    }

    #[test]
    fn missing_catalog_is_english() {
        let dir = tempfile::tempdir().expect("tempdir");
        let catalog = Catalog::load(dir.path(), "fr").expect("load");
        assert_eq!(catalog.language(), DEFAULT_LANGUAGE);
        assert_eq!(catalog.translate("Error"), "Error");
    }

    #[test]
    fn malformed_catalog_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = catalog_path(dir.path(), "ru");
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, "[]").expect("write");
        assert!(Catalog::load(dir.path(), "ru").is_err());
    }
}
