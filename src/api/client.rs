//! Backend API Client
//!
//! Two variants share one implementation:
//! - the authenticated client signs every request with the resolver's token
//!   and ends the session on a 401;
//! - the bootstrap client (login and registration only) never consults the
//!   resolver, so establishing a token does not wait on the identity
//!   provider.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::api::error::{extract_detail, ApiError};
use crate::api::interceptor::SessionTerminator;
use crate::auth::resolver::SessionResolver;
use crate::config::ApiConfig;

struct RequestAuth {
    resolver: Arc<SessionResolver>,
    terminator: Arc<SessionTerminator>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    auth: Option<Arc<RequestAuth>>,
}

impl ApiClient {
    /// Client for login and registration calls only
    pub fn bootstrap(config: &ApiConfig) -> Result<Self, ApiError> {
        Ok(Self {
            http: build_http_client(config)?,
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            auth: None,
        })
    }

    /// Client for every other backend call
    pub fn authenticated(
        config: &ApiConfig,
        resolver: Arc<SessionResolver>,
        terminator: Arc<SessionTerminator>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            auth: Some(Arc::new(RequestAuth { resolver, terminator })),
            ..Self::bootstrap(config)?
        })
    }

    #[cfg(test)]
    fn is_authenticated_variant(&self) -> bool {
        self.auth.is_some()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.request(Method::GET, path), None).await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send(self.request(Method::GET, path).query(query), None).await
    }

    /// GET signed with `token` instead of the resolver's choice
    pub async fn get_with_token<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T, ApiError> {
        self.send(self.request(Method::GET, path), Some(token)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(Method::POST, path).json(body), None).await
    }

    /// POST without a body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.request(Method::POST, path), None).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(Method::PUT, path).json(body), None).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.request(Method::DELETE, path), None).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        explicit_token: Option<&str>,
    ) -> Result<T, ApiError> {
        // Taken before the token so a session swapped in meanwhile is never blamed.
        let epoch = self.auth.as_ref().map(|auth| auth.terminator.epoch());
        let token = match (explicit_token, &self.auth) {
            (Some(token), _) => Some(token.to_string()),
            (None, Some(auth)) => auth.resolver.bearer_token().await,
            (None, None) => None,
        };
        let request = match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(ApiError::from_reqwest)?;
        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url().path());

        if status == StatusCode::UNAUTHORIZED {
            if let (Some(auth), Some(epoch)) = (&self.auth, epoch) {
                auth.terminator.terminate(epoch);
                return Err(ApiError::Unauthorized);
            }
        }

        if !status.is_success() {
            let detail = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| extract_detail(&body));
            return Err(ApiError::Status { status, detail });
        }

        response.json::<T>().await.map_err(ApiError::from_reqwest)
    }
}

fn build_http_client(config: &ApiConfig) -> Result<Client, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Client::builder()
        .timeout(config.request_timeout)
        .default_headers(headers)
        .build()
        .map_err(ApiError::Request)
}
