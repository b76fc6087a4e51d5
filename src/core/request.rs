//! Request assembly: base URL selection, path joining and auth parameters

use reqwest::Url;

use crate::core::errors::{Result, TranslationError};

/// Base URL of the paid API
pub const PRO_API_URL: &str = "https://api.deepl.com/v2";

/// Base URL of the free API
pub const FREE_API_URL: &str = "https://api-free.deepl.com/v2";

/// Builds request URLs and parameter lists for one account.
///
/// Every parameter list produced here ends with `auth_key`; callers never
/// add it themselves.
#[derive(Clone)]
pub struct RequestBuilder {
    base_url: String,
    auth_key: String,
}

impl std::fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RequestBuilder {
    /// Select the base URL from the free-tier flag unless `server_url` overrides it
    pub fn new(auth_key: impl Into<String>, use_free_api: bool, server_url: Option<&str>) -> Self {
        let base_url = match server_url {
            Some(url) => url.to_string(),
            None if use_free_api => FREE_API_URL.to_string(),
            None => PRO_API_URL.to_string(),
        };

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_key: auth_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/{path}/{segment}...` with each segment percent-encoded
    pub fn url(&self, path: &str, segments: &[&str]) -> Result<Url> {
        let path = path.trim_matches('/');
        if path.is_empty() {
            return Err(TranslationError::invalid_argument("path", "must not be empty"));
        }

        let mut url = Url::parse(&format!("{}/{}", self.base_url, path)).map_err(|e| {
            TranslationError::ConfigError {
                message: format!("invalid server url {}: {}", self.base_url, e),
            }
        })?;

        if !segments.is_empty() {
            let mut parts = url.path_segments_mut().map_err(|_| TranslationError::ConfigError {
                message: format!("server url {} cannot carry a path", self.base_url),
            })?;
            for segment in segments {
                if segment.is_empty() {
                    return Err(TranslationError::invalid_argument("segment", "must not be empty"));
                }
                parts.push(segment);
            }
        }

        Ok(url)
    }

    /// URL with `params` and the auth key encoded into the query string
    pub fn query_url(&self, path: &str, segments: &[&str], params: &[(&str, String)]) -> Result<Url> {
        let mut url = self.url(path, segments)?;
        {
            let mut query = url.query_pairs_mut();
            for (name, value) in params {
                query.append_pair(name, value);
            }
            query.append_pair("auth_key", &self.auth_key);
        }
        Ok(url)
    }

    /// Form fields with the auth key appended
    pub fn form<'a>(&self, mut params: Vec<(&'a str, String)>) -> Vec<(&'a str, String)> {
        params.push(("auth_key", self.auth_key.clone()));
        params
    }

    /// Auth key as a multipart text field
    pub fn multipart(&self, form: reqwest::multipart::Form) -> reqwest::multipart::Form {
        form.text("auth_key", self.auth_key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_selection() {
        assert_eq!(RequestBuilder::new("k", false, None).base_url(), PRO_API_URL);
        assert_eq!(RequestBuilder::new("k", true, None).base_url(), FREE_API_URL);
        assert_eq!(
            RequestBuilder::new("k", true, Some("http://127.0.0.1:9000/")).base_url(),
            "http://127.0.0.1:9000"
        );
    }

    #[test]
    fn test_url_with_segments() {
        let builder = RequestBuilder::new("k", false, None);
        let url = builder.url("document", &["ABC123", "result"]).unwrap();
        assert_eq!(url.as_str(), "https://api.deepl.com/v2/document/ABC123/result");

        let url = builder.url("/translate", &[]).unwrap();
        assert_eq!(url.as_str(), "https://api.deepl.com/v2/translate");
    }

    #[test]
    fn test_segments_are_encoded() {
        let builder = RequestBuilder::new("k", true, None);
        let url = builder.url("document", &["a/b c"]).unwrap();
        assert_eq!(url.as_str(), "https://api-free.deepl.com/v2/document/a%2Fb%20c");
    }

    #[test]
    fn test_empty_path_is_rejected() {
        let builder = RequestBuilder::new("k", false, None);
        for path in ["", "/", "//"] {
            assert!(matches!(
                builder.url(path, &[]),
                Err(TranslationError::InvalidArgument { .. })
            ));
        }
    }

    #[test]
    fn test_auth_key_always_appended() {
        let builder = RequestBuilder::new("secret", false, None);
        let url = builder.query_url("usage", &[], &[]).unwrap();
        assert_eq!(url.query(), Some("auth_key=secret"));

        let form = builder.form(vec![("target_lang", "DE".to_string())]);
        assert_eq!(form.last(), Some(&("auth_key", "secret".to_string())));
        assert_eq!(form.len(), 2);
    }

    #[test]
    fn test_debug_hides_auth_key() {
        let builder = RequestBuilder::new("secret", false, None);
        assert!(!format!("{:?}", builder).contains("secret"));
    }
}
