//! CLI command definitions and handlers

use clap::Subcommand;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::core::client::Translator;
use crate::core::config::ClientConfig;
use crate::core::languages::resolve_language;
use crate::core::models::{DocumentOptions, Formality, SplitSentences, TranslateOptions};

/// Commands for the DeepL command-line client
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate one or more texts
    Translate {
        /// Authentication key of the account
        auth_key: String,

        /// Target language, as a code (DE, EN-GB) or name (German)
        target_lang: String,

        /// Texts to translate
        #[arg(required = true)]
        texts: Vec<String>,

        /// Source language (auto-detect if not specified)
        #[arg(short, long)]
        source_lang: Option<String>,

        /// Formality: default, more or less
        #[arg(long, default_value = "default")]
        formality: Formality,

        /// Sentence splitting: 0, 1 or nonewlines
        #[arg(long, default_value = "1")]
        split_sentences: SplitSentences,

        /// Keep the original formatting of the texts
        #[arg(long)]
        preserve_formatting: bool,
    },

    /// Translate a document file
    TranslateDocument {
        /// Authentication key of the account
        auth_key: String,

        /// Document to translate
        input: PathBuf,

        /// Where to write the translated document (must not exist)
        output: PathBuf,

        /// Target language, as a code (DE, EN-GB) or name (German)
        target_lang: String,

        /// Source language (auto-detect if not specified)
        #[arg(short, long)]
        source_lang: Option<String>,

        /// Formality: default, more or less
        #[arg(long, default_value = "default")]
        formality: Formality,
    },

    /// Show the characters used and allowed in the current period
    GetUsageStatistics {
        /// Authentication key of the account
        auth_key: String,
    },

    /// List the languages the service supports
    GetSupportedLanguages {
        /// Authentication key of the account
        auth_key: String,
    },
}

/// Build a client for `auth_key`; `DEEPL_SERVER_URL` redirects it
fn build_translator(auth_key: String, use_free_api: bool) -> anyhow::Result<Translator> {
    let mut config = ClientConfig::new(auth_key, use_free_api);
    if let Ok(url) = std::env::var("DEEPL_SERVER_URL") {
        if !url.trim().is_empty() {
            config = config.with_server_url(url.trim());
        }
    }
    Ok(Translator::new(config)?)
}

/// Run one parsed command
pub async fn run(command: Commands, use_free_api: bool, cancel: &CancellationToken) -> anyhow::Result<()> {
    match command {
        Commands::Translate {
            auth_key,
            target_lang,
            texts,
            source_lang,
            formality,
            split_sentences,
            preserve_formatting,
        } => {
            let options = TranslateOptions::new()
                .with_formality(formality)
                .with_split_sentences(split_sentences)
                .with_preserve_formatting(preserve_formatting);
            let translator = build_translator(auth_key, use_free_api)?;
            handle_translate(&translator, texts, source_lang, target_lang, options, cancel).await
        }
        Commands::TranslateDocument {
            auth_key,
            input,
            output,
            target_lang,
            source_lang,
            formality,
        } => {
            let mut options = DocumentOptions::new().with_formality(formality);
            if let Some(source_lang) = source_lang {
                options = options.with_source_lang(resolve_language(&source_lang));
            }
            let translator = build_translator(auth_key, use_free_api)?;
            handle_translate_document(&translator, input, output, target_lang, options, cancel).await
        }
        Commands::GetUsageStatistics { auth_key } => {
            let translator = build_translator(auth_key, use_free_api)?;
            handle_usage(&translator, cancel).await
        }
        Commands::GetSupportedLanguages { auth_key } => {
            let translator = build_translator(auth_key, use_free_api)?;
            handle_languages(&translator, cancel).await
        }
    }
}

/// Handle text translation command
pub async fn handle_translate(
    translator: &Translator,
    texts: Vec<String>,
    source_lang: Option<String>,
    target_lang: String,
    options: TranslateOptions,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let target_lang = resolve_language(&target_lang);
    let source_lang = source_lang.map(|s| resolve_language(&s));

    info!("Translating {} texts into {}", texts.len(), target_lang);

    let translations = translator
        .translate(&texts, source_lang.as_deref(), &target_lang, &options, cancel)
        .await?;

    for translation in translations {
        info!("Detected source language: {}", translation.detected_source_language);
        println!("{}", translation.text);
    }

    Ok(())
}

/// Handle document translation command
pub async fn handle_translate_document(
    translator: &Translator,
    input: PathBuf,
    output: PathBuf,
    target_lang: String,
    options: DocumentOptions,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};

    let start_time = Instant::now();
    let target_lang = resolve_language(&target_lang);

    info!("Starting document translation");
    info!("Input: {}", input.display());
    info!("Output: {}", output.display());
    info!("Target language: {}", target_lang);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(format!("Translating {}", input.display()));
    pb.enable_steady_tick(Duration::from_millis(120));

    let result = translator
        .translate_document_file(&input, &output, &target_lang, &options, cancel)
        .await;

    match result {
        Ok(status) => {
            pb.finish_with_message("Completed");
            let duration = start_time.elapsed();
            info!("Completed {} in {:?}", status.document_id, duration);

            println!("\n✅ Document translation completed!");
            println!("   Output: {}", output.display());
            if let Some(billed) = status.billed_characters {
                println!("   Billed characters: {}", billed);
            }
            println!("   Time: {:?}", duration);
            Ok(())
        }
        Err(e) => {
            pb.abandon_with_message("Failed");
            Err(e.into())
        }
    }
}

/// Handle usage statistics command
pub async fn handle_usage(translator: &Translator, cancel: &CancellationToken) -> anyhow::Result<()> {
    let usage = translator.usage(cancel).await?;

    println!("Character count: {}", usage.character_count);
    println!("Character limit: {}", usage.character_limit);
    println!("Remaining: {}", usage.remaining());

    Ok(())
}

/// Handle supported languages command
pub async fn handle_languages(translator: &Translator, cancel: &CancellationToken) -> anyhow::Result<()> {
    let languages = translator.supported_languages(cancel).await?;

    for language in languages {
        println!("{}\t{}", language.code, language.name);
    }

    Ok(())
}
