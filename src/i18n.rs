//! The localization seam. The core only ever asks for a display string by key.

use ahash::AHashMap;

pub trait Localizer: Send + Sync {
    fn localize(&self, key: &str) -> String;
}

/// Echoes the key back; used when no translations are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLocalizer;

impl Localizer for NoLocalizer {
    fn localize(&self, key: &str) -> String {
        key.to_string()
    }
}

/// A fixed key → text table, falling back to the key when a translation is missing.
#[derive(Debug, Default, Clone)]
pub struct MapLocalizer {
    entries: AHashMap<String, String>,
}

impl MapLocalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, text: &str) -> Self {
        self.entries.insert(key.to_string(), text.to_string());
        self
    }
}

impl Localizer for MapLocalizer {
    fn localize(&self, key: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_the_key() {
        let localizer = MapLocalizer::new().with("userQuestion", "User question");
        assert_eq!(localizer.localize("userQuestion"), "User question");
        assert_eq!(localizer.localize("other"), "other");
        assert_eq!(NoLocalizer.localize("userQuestion"), "userQuestion");
    }
}
