//! Async client for the translation service

use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::config::ClientConfig;
use crate::core::document::{poll_until_done, PollPolicy};
use crate::core::errors::{Result, TranslationError};
use crate::core::models::{
    DocumentOptions, DocumentStatus, DocumentTranslation, SupportedLanguage, TranslateOptions,
    TranslateResponse, Translation, UsageStatistics,
};
use crate::core::request::RequestBuilder;

/// Race `fut` against the token; a fired token wins
async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TranslationError::Cancelled),
        result = fut => result,
    }
}

async fn create_new_file(path: &Path) -> std::io::Result<tokio::fs::File> {
    tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
}

fn file_error(path: &Path, e: std::io::Error) -> TranslationError {
    TranslationError::FileError {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!("Could not remove partial output {}: {}", path.display(), e);
    }
}

fn flag(value: bool) -> String {
    let value = if value { "1" } else { "0" };
    value.to_string()
}

/// Client for one account.
///
/// Holds immutable configuration and a pooled `reqwest::Client`; clones
/// share the pool and can be used from many tasks at once.
#[derive(Debug, Clone)]
pub struct Translator {
    client: reqwest::Client,
    requests: RequestBuilder,
    /// Replaces the client-wide timeout for uploads and result downloads
    transfer_timeout: Duration,
    poll: PollPolicy,
}

impl Translator {
    /// Create a new translator
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let timeout = Duration::from_millis(config.timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .pool_max_idle_per_host(10)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let requests = RequestBuilder::new(
            config.auth_key.clone(),
            config.use_free_api,
            config.server_url.as_deref(),
        );

        debug!("Translator targets {}", requests.base_url());

        Ok(Self {
            client,
            requests,
            transfer_timeout: Duration::from_millis(config.transfer_timeout_ms),
            poll: config.poll,
        })
    }

    /// Create with default settings for one auth key
    pub fn with_auth_key(auth_key: impl Into<String>, use_free_api: bool) -> Result<Self> {
        Self::new(ClientConfig::new(auth_key, use_free_api))
    }

    /// Create from environment
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn poll_policy(&self) -> &PollPolicy {
        &self.poll
    }

    /// Send a request and turn non-success statuses into errors.
    ///
    /// `label` names the endpoint in log events; URLs are never logged
    /// because GET requests carry the auth key in the query string.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        label: &str,
        cancel: &CancellationToken,
    ) -> Result<reqwest::Response> {
        debug!("Sending request to {}", label);

        cancellable(cancel, async {
            let response = request.send().await.map_err(|e| TranslationError::NetworkError {
                message: e.without_url().to_string(),
            })?;

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let status_code = status.as_u16();
            let error_text = response.text().await.unwrap_or_default();
            warn!("{} answered with HTTP {}", label, status_code);

            Err(TranslationError::from_status(status_code, &error_text))
        })
        .await
    }

    /// Read and parse a JSON body
    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let body = cancellable(cancel, async {
            response.bytes().await.map_err(|e| TranslationError::NetworkError {
                message: e.without_url().to_string(),
            })
        })
        .await?;

        serde_json::from_slice(&body).map_err(|e| TranslationError::InvalidResponseError {
            message: e.to_string(),
        })
    }

    /// Translate `texts` into `target_lang`.
    ///
    /// Results come back in input order, one per text. When `source_lang`
    /// is `None` (or blank) the service detects it. Nothing is sent if a
    /// text or the target language is empty.
    pub async fn translate<S: AsRef<str>>(
        &self,
        texts: &[S],
        source_lang: Option<&str>,
        target_lang: &str,
        options: &TranslateOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<Translation>> {
        if texts.is_empty() {
            return Err(TranslationError::invalid_argument("texts", "at least one text is required"));
        }
        if let Some(index) = texts.iter().position(|t| t.as_ref().is_empty()) {
            return Err(TranslationError::invalid_argument(
                "texts",
                format!("text at index {} is empty", index),
            ));
        }
        if target_lang.trim().is_empty() {
            return Err(TranslationError::invalid_argument("target_lang", "must not be empty"));
        }

        let mut params: Vec<(&str, String)> = texts
            .iter()
            .map(|t| ("text", t.as_ref().to_string()))
            .collect();

        if let Some(source_lang) = source_lang.map(str::trim).filter(|s| !s.is_empty()) {
            params.push(("source_lang", source_lang.to_string()));
        }
        params.push(("target_lang", target_lang.trim().to_string()));
        params.push(("split_sentences", options.split_sentences.as_param().to_string()));
        params.push(("preserve_formatting", flag(options.preserve_formatting)));
        params.push(("formality", options.formality.as_param().to_string()));

        if let Some(xml) = &options.xml_handling {
            params.push(("tag_handling", "xml".to_string()));
            if !xml.non_splitting_tags.is_empty() {
                params.push(("non_splitting_tags", xml.non_splitting_tags.join(",")));
            }
            if !xml.splitting_tags.is_empty() {
                params.push(("splitting_tags", xml.splitting_tags.join(",")));
            }
            if !xml.ignore_tags.is_empty() {
                params.push(("ignore_tags", xml.ignore_tags.join(",")));
            }
            params.push(("outline_detection", flag(xml.outline_detection)));
        }

        let url = self.requests.url("translate", &[])?;
        let request = self.client.post(url).form(&self.requests.form(params));
        let response = self.send(request, "translate", cancel).await?;
        let parsed: TranslateResponse = Self::read_json(response, cancel).await?;

        if parsed.translations.len() != texts.len() {
            return Err(TranslationError::InvalidResponseError {
                message: format!(
                    "expected {} translations, got {}",
                    texts.len(),
                    parsed.translations.len()
                ),
            });
        }

        debug!("Translated {} texts into {}", texts.len(), target_lang);
        Ok(parsed.translations)
    }

    /// Translate a single text
    pub async fn translate_text(
        &self,
        text: &str,
        source_lang: Option<&str>,
        target_lang: &str,
        options: &TranslateOptions,
        cancel: &CancellationToken,
    ) -> Result<Translation> {
        let mut translations = self
            .translate(&[text], source_lang, target_lang, options, cancel)
            .await?;
        translations.pop().ok_or_else(|| TranslationError::InvalidResponseError {
            message: "no translation in response".to_string(),
        })
    }

    /// Characters used and allowed in the current billing period
    pub async fn usage(&self, cancel: &CancellationToken) -> Result<UsageStatistics> {
        let url = self.requests.query_url("usage", &[], &[])?;
        let response = self.send(self.client.get(url), "usage", cancel).await?;
        Self::read_json(response, cancel).await
    }

    /// Languages the service accepts
    pub async fn supported_languages(&self, cancel: &CancellationToken) -> Result<Vec<SupportedLanguage>> {
        let url = self.requests.query_url("languages", &[], &[])?;
        let response = self.send(self.client.get(url), "languages", cancel).await?;
        Self::read_json(response, cancel).await
    }

    /// Upload a document from disk and start translating it
    pub async fn upload_document(
        &self,
        path: &Path,
        target_lang: &str,
        options: &DocumentOptions,
        cancel: &CancellationToken,
    ) -> Result<DocumentTranslation> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| TranslationError::NullArgument {
                name: "file_name".to_string(),
            })?;

        let bytes = tokio::fs::read(path).await.map_err(|e| TranslationError::FileError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        self.upload_document_bytes(bytes, &file_name, target_lang, options, cancel)
            .await
    }

    /// Upload document contents; `file_name` tells the service the format
    pub async fn upload_document_bytes(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        target_lang: &str,
        options: &DocumentOptions,
        cancel: &CancellationToken,
    ) -> Result<DocumentTranslation> {
        if file_name.trim().is_empty() {
            return Err(TranslationError::invalid_argument("file_name", "must not be empty"));
        }
        if target_lang.trim().is_empty() {
            return Err(TranslationError::invalid_argument("target_lang", "must not be empty"));
        }

        let size = bytes.len();
        let file = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let mut form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("target_lang", target_lang.trim().to_string())
            .text("formality", options.formality.as_param());

        if let Some(source_lang) = options
            .source_lang
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            form = form.text("source_lang", source_lang.to_string());
        }

        let url = self.requests.url("document", &[])?;
        let request = self
            .client
            .post(url)
            .timeout(self.transfer_timeout)
            .multipart(self.requests.multipart(form));
        let response = self.send(request, "document upload", cancel).await?;
        let handle: DocumentTranslation = Self::read_json(response, cancel).await?;

        info!(
            "Uploaded {} ({} bytes) as document {}",
            file_name, size, handle.document_id
        );
        Ok(handle)
    }

    /// One status snapshot of an uploaded document
    pub async fn document_status(
        &self,
        handle: &DocumentTranslation,
        cancel: &CancellationToken,
    ) -> Result<DocumentStatus> {
        let url = self.requests.url("document", &[handle.document_id.as_str()])?;
        let form = self
            .requests
            .form(vec![("document_key", handle.document_key.clone())]);
        let response = self
            .send(self.client.post(url).form(&form), "document status", cancel)
            .await?;
        Self::read_json(response, cancel).await
    }

    /// Poll until the document is done; fails if the server reports an error
    pub async fn wait_until_done(
        &self,
        handle: &DocumentTranslation,
        cancel: &CancellationToken,
    ) -> Result<DocumentStatus> {
        poll_until_done(&self.poll, cancel, || self.document_status(handle, cancel)).await
    }

    /// Stream the translated document into `writer`, returning the byte count
    pub async fn download_document_to<W>(
        &self,
        handle: &DocumentTranslation,
        writer: &mut W,
        cancel: &CancellationToken,
    ) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let url = self.requests.url("document", &[handle.document_id.as_str(), "result"])?;
        let form = self
            .requests
            .form(vec![("document_key", handle.document_key.clone())]);
        let request = self
            .client
            .post(url)
            .timeout(self.transfer_timeout)
            .form(&form);
        let response = self.send(request, "document result", cancel).await?;

        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TranslationError::Cancelled),
                chunk = stream.next() => chunk,
            };

            match chunk {
                Some(chunk) => {
                    let chunk = chunk.map_err(|e| TranslationError::NetworkError {
                        message: e.without_url().to_string(),
                    })?;
                    writer.write_all(&chunk).await?;
                    written += chunk.len() as u64;
                }
                None => break,
            }
        }

        writer.flush().await?;
        info!("Downloaded document {} ({} bytes)", handle.document_id, written);
        Ok(written)
    }

    /// Download the translated document into memory
    pub async fn download_document(
        &self,
        handle: &DocumentTranslation,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.download_document_to(handle, &mut buffer, cancel).await?;
        Ok(buffer)
    }

    /// Download the translated document to `path`, creating or truncating it.
    ///
    /// On failure the file is removed only if this call created it.
    pub async fn download_document_to_file(
        &self,
        handle: &DocumentTranslation,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        let (file, created) = match create_new_file(path).await {
            Ok(file) => (file, true),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let file = tokio::fs::File::create(path)
                    .await
                    .map_err(|e| file_error(path, e))?;
                (file, false)
            }
            Err(e) => return Err(file_error(path, e)),
        };

        self.download_into_file(handle, file, path, created, cancel)
            .await
    }

    async fn download_into_file(
        &self,
        handle: &DocumentTranslation,
        mut file: tokio::fs::File,
        path: &Path,
        created: bool,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        let result = self.download_document_to(handle, &mut file, cancel).await;
        if result.is_err() && created {
            drop(file);
            remove_partial(path).await;
        }
        result
    }

    /// Upload, wait, download: translate document contents held in memory
    pub async fn translate_document(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        target_lang: &str,
        options: &DocumentOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let handle = self
            .upload_document_bytes(bytes, file_name, target_lang, options, cancel)
            .await?;
        self.wait_until_done(&handle, cancel).await?;
        self.download_document(&handle, cancel).await
    }

    /// Upload, wait, download: translate `input` into a new file at `output`.
    ///
    /// Refuses to overwrite an existing `output`. Returns the final status so
    /// callers can read the billed character count.
    pub async fn translate_document_file(
        &self,
        input: &Path,
        output: &Path,
        target_lang: &str,
        options: &DocumentOptions,
        cancel: &CancellationToken,
    ) -> Result<DocumentStatus> {
        // Reserve the output before uploading so a file that shows up while
        // the job runs is never truncated or removed.
        let file = create_new_file(output).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                TranslationError::FileError {
                    path: output.display().to_string(),
                    message: "output file already exists".to_string(),
                }
            } else {
                file_error(output, e)
            }
        })?;

        let job = async {
            let handle = self
                .upload_document(input, target_lang, options, cancel)
                .await?;
            let status = self.wait_until_done(&handle, cancel).await?;
            Ok::<_, TranslationError>((handle, status))
        };

        let (handle, status) = match job.await {
            Ok(job) => job,
            Err(e) => {
                drop(file);
                remove_partial(output).await;
                return Err(e);
            }
        };

        self.download_into_file(&handle, file, output, true, cancel)
            .await?;

        Ok(status)
    }
}
