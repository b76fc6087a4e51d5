//! DeepL Client - async Rust client for the DeepL translation API
//!
//! This library formats requests, attaches authentication and parses
//! responses for text translation, usage statistics, the language catalog
//! and the upload/poll/download document workflow.

#![forbid(unsafe_code)]

pub mod cli;
pub mod core;

// Re-export key types for convenience
pub use self::core::{
    client::Translator,
    config::ClientConfig,
    document::PollPolicy,
    errors::{Result, TranslationError},
    languages::{resolve_language, Language},
    models::{
        DocumentOptions, DocumentState, DocumentStatus, DocumentTranslation, Formality,
        SplitSentences, SupportedLanguage, TranslateOptions, Translation, UsageStatistics,
        XmlHandling,
    },
};

pub use tokio_util::sync::CancellationToken;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
