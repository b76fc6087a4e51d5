//! Static language table: display names and the codes the service expects

use serde::{Deserialize, Serialize};
use std::fmt;

/// Languages known to the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Bulgarian,
    Chinese,
    Czech,
    Danish,
    Dutch,
    English,
    BritishEnglish,
    AmericanEnglish,
    Estonian,
    Finnish,
    French,
    German,
    Greek,
    Hungarian,
    Italian,
    Japanese,
    Latvian,
    Lithuanian,
    Polish,
    Portuguese,
    BrazilianPortuguese,
    EuropeanPortuguese,
    Romanian,
    Russian,
    Slovak,
    Slovenian,
    Spanish,
    Swedish,
}

/// Every variant, in table order; variants without a region are valid as
/// source languages, regional variants only as targets
const LANGUAGES: &[Language] = &[
    Language::Bulgarian,
    Language::Chinese,
    Language::Czech,
    Language::Danish,
    Language::Dutch,
    Language::English,
    Language::BritishEnglish,
    Language::AmericanEnglish,
    Language::Estonian,
    Language::Finnish,
    Language::French,
    Language::German,
    Language::Greek,
    Language::Hungarian,
    Language::Italian,
    Language::Japanese,
    Language::Latvian,
    Language::Lithuanian,
    Language::Polish,
    Language::Portuguese,
    Language::BrazilianPortuguese,
    Language::EuropeanPortuguese,
    Language::Romanian,
    Language::Russian,
    Language::Slovak,
    Language::Slovenian,
    Language::Spanish,
    Language::Swedish,
];

impl Language {
    /// Code sent as `source_lang` / `target_lang`
    pub fn code(&self) -> &'static str {
        match self {
            Language::Bulgarian => "BG",
            Language::Chinese => "ZH",
            Language::Czech => "CS",
            Language::Danish => "DA",
            Language::Dutch => "NL",
            Language::English => "EN",
            Language::BritishEnglish => "EN-GB",
            Language::AmericanEnglish => "EN-US",
            Language::Estonian => "ET",
            Language::Finnish => "FI",
            Language::French => "FR",
            Language::German => "DE",
            Language::Greek => "EL",
            Language::Hungarian => "HU",
            Language::Italian => "IT",
            Language::Japanese => "JA",
            Language::Latvian => "LV",
            Language::Lithuanian => "LT",
            Language::Polish => "PL",
            Language::Portuguese => "PT",
            Language::BrazilianPortuguese => "PT-BR",
            Language::EuropeanPortuguese => "PT-PT",
            Language::Romanian => "RO",
            Language::Russian => "RU",
            Language::Slovak => "SK",
            Language::Slovenian => "SL",
            Language::Spanish => "ES",
            Language::Swedish => "SV",
        }
    }

    /// English display name
    pub fn name(&self) -> &'static str {
        match self {
            Language::Bulgarian => "Bulgarian",
            Language::Chinese => "Chinese",
            Language::Czech => "Czech",
            Language::Danish => "Danish",
            Language::Dutch => "Dutch",
            Language::English => "English",
            Language::BritishEnglish => "English (British)",
            Language::AmericanEnglish => "English (American)",
            Language::Estonian => "Estonian",
            Language::Finnish => "Finnish",
            Language::French => "French",
            Language::German => "German",
            Language::Greek => "Greek",
            Language::Hungarian => "Hungarian",
            Language::Italian => "Italian",
            Language::Japanese => "Japanese",
            Language::Latvian => "Latvian",
            Language::Lithuanian => "Lithuanian",
            Language::Polish => "Polish",
            Language::Portuguese => "Portuguese",
            Language::BrazilianPortuguese => "Portuguese (Brazilian)",
            Language::EuropeanPortuguese => "Portuguese (European)",
            Language::Romanian => "Romanian",
            Language::Russian => "Russian",
            Language::Slovak => "Slovak",
            Language::Slovenian => "Slovenian",
            Language::Spanish => "Spanish",
            Language::Swedish => "Swedish",
        }
    }

    /// Look up by code, case-insensitively
    pub fn from_code(code: &str) -> Option<Language> {
        let code = code.trim().replace('_', "-");
        Language::all().find(|lang| lang.code().eq_ignore_ascii_case(&code))
    }

    /// Look up by display name or variant name, case-insensitively
    pub fn from_name(name: &str) -> Option<Language> {
        let name = name.trim();
        Language::all().find(|lang| {
            lang.name().eq_ignore_ascii_case(name) || format!("{:?}", lang).eq_ignore_ascii_case(name)
        })
    }

    /// Every known language
    pub fn all() -> impl Iterator<Item = Language> {
        LANGUAGES.iter().copied()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Resolve a user-supplied language to a code.
///
/// Known codes and names map to the canonical code; anything else is
/// passed through upper-cased so newer languages the table does not know
/// yet still reach the server.
pub fn resolve_language(name_or_code: &str) -> String {
    let trimmed = name_or_code.trim();
    Language::from_code(trimmed)
        .or_else(|| Language::from_name(trimmed))
        .map(|lang| lang.code().to_string())
        .unwrap_or_else(|| trimmed.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_language_round_trips_through_its_code() {
        let mut codes = std::collections::HashSet::new();
        for lang in Language::all() {
            assert!(codes.insert(lang.code()), "duplicate code {}", lang.code());
            assert_eq!(Language::from_code(lang.code()), Some(lang));
            assert_eq!(Language::from_name(lang.name()), Some(lang));
        }
        assert_eq!(codes.len(), 28);
    }

    #[test]
    fn test_lookup() {
        assert_eq!(Language::from_code("de"), Some(Language::German));
        assert_eq!(Language::from_code("en_gb"), Some(Language::BritishEnglish));
        assert_eq!(Language::from_name("german"), Some(Language::German));
        assert_eq!(Language::from_name("BrazilianPortuguese"), Some(Language::BrazilianPortuguese));
        assert_eq!(Language::from_name("Klingon"), None);
        assert_eq!(Language::German.to_string(), "German");
    }

    #[test]
    fn test_resolve_language() {
        assert_eq!(resolve_language("German"), "DE");
        assert_eq!(resolve_language("en-us"), "EN-US");
        assert_eq!(resolve_language(" ja "), "JA");
        assert_eq!(resolve_language("uk"), "UK");
    }
}
