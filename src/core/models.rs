//! Core data models for translation

use serde::{Deserialize, Serialize};
use std::fmt;

/// One translated text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    /// Language the service detected (or was told) the input was written in
    pub detected_source_language: String,
    /// Translated text
    pub text: String,
}

/// Envelope returned by `POST /translate`
#[derive(Debug, Deserialize)]
pub(crate) struct TranslateResponse {
    pub translations: Vec<Translation>,
}

/// Handle of an uploaded document.
///
/// The key decrypts the document server-side, so it is kept out of `Debug`
/// output and log events.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTranslation {
    pub document_id: String,
    pub document_key: String,
}

impl DocumentTranslation {
    pub fn new(document_id: impl Into<String>, document_key: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            document_key: document_key.into(),
        }
    }
}

impl fmt::Debug for DocumentTranslation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentTranslation")
            .field("document_id", &self.document_id)
            .field("document_key", &"<redacted>")
            .finish()
    }
}

/// Server-side state of a document job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentState {
    Queued,
    Translating,
    Done,
    Error,
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentState::Queued => write!(f, "queued"),
            DocumentState::Translating => write!(f, "translating"),
            DocumentState::Done => write!(f, "done"),
            DocumentState::Error => write!(f, "error"),
        }
    }
}

/// Snapshot returned by one status poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStatus {
    pub document_id: String,
    pub status: DocumentState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds_remaining: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billed_characters: Option<u64>,
    /// Only present when `status` is `error`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl DocumentStatus {
    pub fn is_done(&self) -> bool {
        self.status == DocumentState::Done
    }

    pub fn is_error(&self) -> bool {
        self.status == DocumentState::Error
    }

    /// Done or Error; no further polling changes the outcome
    pub fn is_terminal(&self) -> bool {
        self.is_done() || self.is_error()
    }
}

/// Character usage of the account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStatistics {
    pub character_count: u64,
    pub character_limit: u64,
}

impl UsageStatistics {
    pub fn remaining(&self) -> u64 {
        self.character_limit.saturating_sub(self.character_count)
    }

    pub fn limit_reached(&self) -> bool {
        self.character_limit > 0 && self.character_count >= self.character_limit
    }
}

/// Catalog entry from `GET /languages`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedLanguage {
    #[serde(rename = "language")]
    pub code: String,
    pub name: String,
}

/// Server-side sentence segmentation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitSentences {
    /// Treat every text as a single sentence
    Off,
    /// Split on punctuation and newlines
    #[default]
    All,
    /// Split on punctuation only
    NoNewlines,
}

impl SplitSentences {
    pub fn as_param(&self) -> &'static str {
        match self {
            SplitSentences::Off => "0",
            SplitSentences::All => "1",
            SplitSentences::NoNewlines => "nonewlines",
        }
    }
}

/// Tone of the translation; only some target languages honor it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Formality {
    #[default]
    Default,
    More,
    Less,
}

impl Formality {
    pub fn as_param(&self) -> &'static str {
        match self {
            Formality::Default => "default",
            Formality::More => "more",
            Formality::Less => "less",
        }
    }
}

impl std::str::FromStr for Formality {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Formality::Default),
            "more" => Ok(Formality::More),
            "less" => Ok(Formality::Less),
            other => Err(format!("unknown formality: {}", other)),
        }
    }
}

impl std::str::FromStr for SplitSentences {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "0" | "none" => Ok(SplitSentences::Off),
            "1" | "all" => Ok(SplitSentences::All),
            "nonewlines" => Ok(SplitSentences::NoNewlines),
            other => Err(format!("unknown sentence splitting mode: {}", other)),
        }
    }
}

/// XML tag handling hints; setting any of these sends `tag_handling=xml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlHandling {
    pub non_splitting_tags: Vec<String>,
    pub splitting_tags: Vec<String>,
    pub ignore_tags: Vec<String>,
    pub outline_detection: bool,
}

impl XmlHandling {
    /// XML handling with outline detection on, matching the service default
    pub fn new() -> Self {
        Self {
            outline_detection: true,
            ..Default::default()
        }
    }

    pub fn with_non_splitting_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.non_splitting_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_splitting_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.splitting_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ignore_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_outline_detection(mut self, enabled: bool) -> Self {
        self.outline_detection = enabled;
        self
    }
}

/// Options for text translation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateOptions {
    pub split_sentences: SplitSentences,
    pub preserve_formatting: bool,
    pub formality: Formality,
    pub xml_handling: Option<XmlHandling>,
}

impl TranslateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_split_sentences(mut self, split_sentences: SplitSentences) -> Self {
        self.split_sentences = split_sentences;
        self
    }

    pub fn with_preserve_formatting(mut self, preserve: bool) -> Self {
        self.preserve_formatting = preserve;
        self
    }

    pub fn with_formality(mut self, formality: Formality) -> Self {
        self.formality = formality;
        self
    }

    pub fn with_xml_handling(mut self, xml_handling: XmlHandling) -> Self {
        self.xml_handling = Some(xml_handling);
        self
    }
}

/// Options for document upload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentOptions {
    pub source_lang: Option<String>,
    pub formality: Formality,
}

impl DocumentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_lang(mut self, source_lang: impl Into<String>) -> Self {
        self.source_lang = Some(source_lang.into());
        self
    }

    pub fn with_formality(mut self, formality: Formality) -> Self {
        self.formality = formality;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_key_is_redacted_in_debug() {
        let handle = DocumentTranslation::new("DOC1", "super-secret-key");
        let printed = format!("{:?}", handle);
        assert!(printed.contains("DOC1"));
        assert!(!printed.contains("super-secret-key"));
    }

    #[test]
    fn test_status_parsing() {
        let status: DocumentStatus = serde_json::from_str(
            r#"{"document_id":"D","status":"translating","seconds_remaining":2}"#,
        )
        .unwrap();
        assert_eq!(status.status, DocumentState::Translating);
        assert_eq!(status.seconds_remaining, Some(2));
        assert_eq!(status.billed_characters, None);
        assert!(!status.is_terminal());

        let status: DocumentStatus = serde_json::from_str(
            r#"{"document_id":"D","status":"done","billed_characters":1337}"#,
        )
        .unwrap();
        assert!(status.is_done());
        assert_eq!(status.billed_characters, Some(1337));
    }

    #[test]
    fn test_usage_remaining() {
        let usage = UsageStatistics {
            character_count: 180_118,
            character_limit: 1_250_000,
        };
        assert_eq!(usage.remaining(), 1_069_882);
        assert!(!usage.limit_reached());

        let exhausted = UsageStatistics {
            character_count: 500_001,
            character_limit: 500_000,
        };
        assert_eq!(exhausted.remaining(), 0);
        assert!(exhausted.limit_reached());
    }

    #[test]
    fn test_supported_language_field_names() {
        let langs: Vec<SupportedLanguage> =
            serde_json::from_str(r#"[{"language":"DE","name":"German"}]"#).unwrap();
        assert_eq!(langs[0].code, "DE");
        assert_eq!(langs[0].name, "German");
    }

    #[test]
    fn test_option_params() {
        assert_eq!(SplitSentences::NoNewlines.as_param(), "nonewlines");
        assert_eq!(SplitSentences::default().as_param(), "1");
        assert_eq!(Formality::Less.as_param(), "less");
        assert_eq!("MORE".parse::<Formality>().unwrap(), Formality::More);
        assert!("polite".parse::<Formality>().is_err());
    }
}
