//! HTTP plumbing shared by every service.

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::{ClientConfig, ConfigError};
use crate::error::{ApiError, ApiResult};

/// Header carrying the pair code on endpoints that accept it.
pub(crate) const PAIR_CODE_HEADER: &str = "X-tichu-pair-code";

/// One connection pool plus the request conventions of the tournament API:
/// percent-encoded path segments, the optional pair-code header, and the
/// error capture the rejection normalization feeds on.
#[derive(Debug, Clone)]
pub(crate) struct Transport {
    client: Client,
    base_url: Url,
    default_pair_code: Option<String>,
}

impl Transport {
    /// Build the shared client from the configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&config.base_url).map_err(|source| ConfigError::BaseUrl {
            url: config.base_url.clone(),
            source,
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::CannotBeABase {
                url: config.base_url.clone(),
            });
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| ConfigError::HttpClient { source })?;
        Ok(Self {
            client,
            base_url,
            default_pair_code: config.pair_code.clone(),
        })
    }

    /// The pair code a request should authenticate with: the explicit one
    /// when given, else the configured default.
    pub fn effective_pair_code<'a>(&'a self, explicit: Option<&'a str>) -> Option<&'a str> {
        explicit.or(self.default_pair_code.as_deref())
    }

    /// Absolute URL for the given path segments, each percent-encoded.
    fn url_for(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .expect("base URL was checked to be a base at construction")
            .pop_if_empty()
            .extend(segments);
        url
    }

    /// Encoded request path for the given segments, as logged and carried in
    /// errors.
    pub fn path_for(&self, segments: &[&str]) -> String {
        self.url_for(segments).path().to_owned()
    }

    fn request(&self, method: Method, url: Url, pair_code: Option<&str>) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match pair_code {
            Some(code) => builder.header(PAIR_CODE_HEADER, code),
            None => builder,
        }
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        path: &str,
    ) -> ApiResult<reqwest::Response> {
        let response = builder.send().await.map_err(|source| ApiError::Transport {
            path: path.to_owned(),
            source,
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            path: path.to_owned(),
            status,
            body,
        })
    }

    async fn decode<T>(response: reqwest::Response, path: &str) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        response.json().await.map_err(|source| ApiError::Decode {
            path: path.to_owned(),
            source,
        })
    }

    /// `GET` expecting a JSON body.
    pub async fn get<T>(&self, segments: &[&str], pair_code: Option<&str>) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let url = self.url_for(segments);
        let path = url.path().to_owned();
        let response = self
            .send(self.request(Method::GET, url, pair_code), &path)
            .await?;
        Self::decode(response, &path).await
    }

    /// `GET` where 204 means "nothing there"; any other success carries JSON.
    pub async fn get_optional<T>(
        &self,
        segments: &[&str],
        pair_code: Option<&str>,
    ) -> ApiResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let url = self.url_for(segments);
        let path = url.path().to_owned();
        let response = self
            .send(self.request(Method::GET, url, pair_code), &path)
            .await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        Self::decode(response, &path).await.map(Some)
    }

    /// `POST` with a JSON body, expecting a JSON body back.
    pub async fn post<B, T>(&self, segments: &[&str], body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url_for(segments);
        let path = url.path().to_owned();
        let response = self
            .send(self.request(Method::POST, url, None).json(body), &path)
            .await?;
        Self::decode(response, &path).await
    }

    /// `PUT` with a JSON body, expecting no body back.
    pub async fn put_no_content<B>(
        &self,
        segments: &[&str],
        body: &B,
        pair_code: Option<&str>,
    ) -> ApiResult<()>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url_for(segments);
        let path = url.path().to_owned();
        self.send(self.request(Method::PUT, url, pair_code).json(body), &path)
            .await?;
        Ok(())
    }

    /// `DELETE`, expecting no body back.
    pub async fn delete_no_content(
        &self,
        segments: &[&str],
        pair_code: Option<&str>,
    ) -> ApiResult<()> {
        let url = self.url_for(segments);
        let path = url.path().to_owned();
        self.send(self.request(Method::DELETE, url, pair_code), &path)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base_url: &str) -> Transport {
        Transport::new(&ClientConfig::new(base_url)).expect("config should build")
    }

    #[test]
    fn path_segments_are_percent_encoded() {
        let transport = transport("http://localhost:8080");
        assert_eq!(
            transport.path_for(&["api", "tournaments", "a/b c", "movement", "7"]),
            "/api/tournaments/a%2Fb%20c/movement/7",
        );
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let transport = transport("http://localhost:8080/proxy/");
        assert_eq!(
            transport.path_for(&["api", "tournaments"]),
            "/proxy/api/tournaments",
        );
    }

    #[test]
    fn explicit_pair_code_beats_the_default() {
        let config = ClientConfig::new("http://localhost:8080").with_pair_code("ABCD");
        let transport = Transport::new(&config).expect("config should build");
        assert_eq!(transport.effective_pair_code(Some("WXYZ")), Some("WXYZ"));
        assert_eq!(transport.effective_pair_code(None), Some("ABCD"));
    }

    #[test]
    fn data_urls_are_rejected() {
        let err = Transport::new(&ClientConfig::new("data:text/plain,hi"))
            .expect_err("cannot-be-a-base URL should fail");
        assert!(matches!(err, ConfigError::CannotBeABase { .. }));
    }
}
