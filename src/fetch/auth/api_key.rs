use crate::fetch::client::HttpClient;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that injects an API key as an HTTP header.
///
/// The header is validated once at construction, so a malformed name or key
/// is reported up front instead of on every request. The value is marked
/// sensitive and never printed by `reqwest`'s debug output.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    key: HeaderValue,
}

impl<C> ApiKey<C> {
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())?;
        let mut key = HeaderValue::from_str(key)?;
        key.set_sensitive(true);
        Ok(Self {
            inner,
            header_name,
            key,
        })
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.key.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopClient;

    #[async_trait]
    impl HttpClient for NoopClient {
        async fn execute(&self, _req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            unreachable!("not called")
        }
    }

    #[test]
    fn test_rejects_bad_header() {
        assert!(ApiKey::new(NoopClient, "api key", "secret").is_err());
        assert!(ApiKey::new(NoopClient, "apiKey", "bad\nvalue").is_err());
        assert!(ApiKey::new(NoopClient, "apiKey", "secret").is_ok());
    }
}
