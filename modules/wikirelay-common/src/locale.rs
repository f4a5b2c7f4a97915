use std::collections::HashMap;

use tracing::warn;

static EN: &str = include_str!("../i18n/en.json");

/// Keyed, language-selected message strings consumed by the formatter.
/// Unknown keys echo back so a missing translation never breaks output.
pub struct Locale {
    messages: HashMap<String, String>,
}

impl Locale {
    pub fn load(lang: &str) -> Self {
        let raw = match lang {
            "en" => EN,
            other => {
                warn!(lang = other, "No bundled locale, falling back to en");
                EN
            }
        };
        let messages =
            serde_json::from_str(raw).expect("bundled locale table must be valid JSON");
        Self { messages }
    }

    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.messages.get(key).map(String::as_str).unwrap_or(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_keys_resolve() {
        let locale = Locale::load("en");
        assert_eq!(locale.get("eventstreams-diff"), "diff");
        assert_eq!(locale.get("eventstreams-talk"), "talk");
        assert_eq!(locale.get("eventstreams-contribs"), "contribs");
    }

    #[test]
    fn unknown_keys_echo_back() {
        let locale = Locale::load("en");
        assert_eq!(locale.get("eventstreams-nonexistent"), "eventstreams-nonexistent");
    }

    #[test]
    fn unknown_lang_falls_back_to_en() {
        let locale = Locale::load("xx");
        assert_eq!(locale.get("eventstreams-diff"), "diff");
    }
}
