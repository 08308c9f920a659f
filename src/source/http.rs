//! HTTP implementation of the catalog sources.
//!
//! [`ApiClient`] talks to the catalog REST API with [`reqwest`] and
//! implements every source trait.  If the [`TokenStore`] holds a session,
//! each request carries it as a bearer token.
//!
//! Endpoints, relative to the configured base URL:
//!
//! | Method | Path           | Body / query                       |
//! |--------|----------------|------------------------------------|
//! | POST   | `auth/login`   | `{ "login", "password" }`          |
//! | GET    | `dishes`       | `?page=&pageSize=[&search=]`       |
//! | GET    | `dishes/{id}`  |                                    |

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    Authenticator, DishDetail, DishDetailSource, DishListSource, FetchError, LoginRequest,
    LoginResponse, PageRequest, PageResult,
};
use crate::auth::TokenStore;

/// A catalog API client.
///
/// Cheap to share behind an `Arc`; the underlying [`reqwest::Client`] pools
/// connections.
pub struct ApiClient {
    http: Client,
    base_url: String,
    tokens: TokenStore,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `http://host:8447/api/`).
    ///
    /// `timeout` bounds every request end to end.
    pub fn new(base_url: impl Into<String>, timeout: Duration, tokens: TokenStore) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            tokens,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.tokens.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, FetchError> {
        let response = self.authorize(builder).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        response
            .json::<T>()
            .await
            .map_err(|err| FetchError::Body(err.to_string()))
    }

    /// Query string for a page request; `search` is left out when unset.
    pub fn page_query(request: &PageRequest) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("page", request.page.to_string()),
            ("pageSize", request.page_size.to_string()),
        ];
        if let Some(search) = &request.search {
            query.push(("search", search.clone()));
        }
        query
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Body(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[async_trait]
impl DishListSource for ApiClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageResult, FetchError> {
        debug!(page = request.page, search = ?request.search, "GET dishes");
        let builder = self
            .http
            .get(self.url("dishes"))
            .query(&Self::page_query(request));
        self.send(builder).await
    }
}

#[async_trait]
impl DishDetailSource for ApiClient {
    async fn fetch_detail(&self, dish_id: i64) -> Result<DishDetail, FetchError> {
        debug!(dish_id, "GET dish detail");
        let builder = self.http.get(self.url(&format!("dishes/{dish_id}")));
        self.send(builder).await
    }
}

#[async_trait]
impl Authenticator for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, FetchError> {
        debug!(login = %request.login, "POST auth/login");
        let builder = self.http.post(self.url("auth/login")).json(request);
        self.send(builder).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        extract::{Path, Query},
        http::{header::AUTHORIZATION, HeaderMap, StatusCode},
        response::{IntoResponse, Response},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    use super::*;
    use crate::auth::Session;

    const TOKEN: &str = "tok";

    async fn list_dishes(
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> Response {
        let bearer = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        if bearer != Some("Bearer tok") {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        let page: i64 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(0);
        let name = params.get("search").cloned().unwrap_or_else(|| "all".into());
        Json(json!({
            "items": [{"id": page, "name": name, "description": "", "hasImage": false}],
            "totalCount": 42,
            "page": page,
            "pageSize": params.get("pageSize"),
        }))
        .into_response()
    }

    async fn dish_detail(Path(id): Path<i64>) -> Response {
        if id != 3 {
            return StatusCode::NOT_FOUND.into_response();
        }
        Json(json!({
            "id": 3,
            "name": "Olivier",
            "description": "Salad",
            "hasImage": true,
            "ingredients": [{"id": 1, "name": "Potato", "weightGrams": 200}],
        }))
        .into_response()
    }

    async fn login(Json(body): Json<Value>) -> Response {
        if body["login"] == "chef" && body["password"] == "secret" {
            Json(json!({"token": TOKEN, "login": "chef", "role": "Admin"})).into_response()
        } else {
            (StatusCode::UNAUTHORIZED, Json(json!({"message": "Invalid login or password"})))
                .into_response()
        }
    }

    async fn broken() -> &'static str {
        "not json"
    }

    async fn spawn_server() -> anyhow::Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = Router::new()
            .route("/api/dishes", get(list_dishes))
            .route("/api/dishes/:id", get(dish_detail))
            .route("/api/auth/login", post(login))
            .route("/broken/dishes", get(broken));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(format!("http://{addr}"))
    }

    fn client(base_url: &str, dir: &tempfile::TempDir, token: Option<&str>) -> ApiClient {
        let tokens = TokenStore::new(dir.path().join("session.json"));
        if let Some(token) = token {
            tokens
                .save(&Session {
                    token: token.to_string(),
                    login: "chef".into(),
                    role: "Admin".into(),
                })
                .unwrap();
        }
        ApiClient::new(base_url, Duration::from_secs(5), tokens).unwrap()
    }

    fn request(page: u32, search: Option<&str>) -> PageRequest {
        PageRequest {
            page,
            page_size: 10,
            search: search.map(String::from),
        }
    }

    #[test]
    fn page_query_omits_absent_search() {
        assert_eq!(
            ApiClient::page_query(&request(2, None)),
            vec![("page", "2".to_string()), ("pageSize", "10".to_string())]
        );
        let with_search = ApiClient::page_query(&request(1, Some(" pasta ")));
        assert_eq!(with_search[2], ("search", " pasta ".to_string()));
    }

    #[test]
    fn url_joins_with_or_without_trailing_slash() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            client("http://h/api/", &dir, None).url("dishes"),
            "http://h/api/dishes"
        );
        assert_eq!(
            client("http://h/api", &dir, None).url("dishes/4"),
            "http://h/api/dishes/4"
        );
    }

    #[tokio::test]
    async fn fetch_page_sends_query_and_bearer_token() {
        let base = spawn_server().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let api = client(&format!("{base}/api/"), &dir, Some(TOKEN));

        let page = api.fetch_page(&request(2, Some("pasta"))).await.unwrap();

        assert_eq!(page.total_count, 42);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, 2);
        assert_eq!(page.items[0].name, "pasta");
    }

    #[tokio::test]
    async fn fetch_page_without_token_is_a_status_error() {
        let base = spawn_server().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let api = client(&format!("{base}/api"), &dir, None);

        let err = api.fetch_page(&request(1, None)).await.unwrap_err();
        assert_eq!(err, FetchError::Status(401));
    }

    #[tokio::test]
    async fn malformed_body_is_a_body_error() {
        let base = spawn_server().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let api = client(&format!("{base}/broken"), &dir, Some(TOKEN));

        let err = api.fetch_page(&request(1, None)).await.unwrap_err();
        assert!(matches!(err, FetchError::Body(_)), "got {err:?}");
        assert!(err.describe("Failed to load dishes").starts_with("Network error: "));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let dir = tempfile::tempdir().unwrap();
        let api = client(&format!("http://{addr}/api"), &dir, None);

        let err = api.fetch_page(&request(1, None)).await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)), "got {err:?}");
        assert!(err.describe("Failed to load dishes").starts_with("Network error: "));
    }

    #[tokio::test]
    async fn fetch_detail_decodes_ingredients() {
        let base = spawn_server().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let api = client(&format!("{base}/api"), &dir, Some(TOKEN));

        let detail = api.fetch_detail(3).await.unwrap();
        assert_eq!(detail.dish.name, "Olivier");
        assert!(detail.dish.has_image);
        assert_eq!(detail.ingredients[0].name, "Potato");

        assert_eq!(api.fetch_detail(99).await.unwrap_err(), FetchError::Status(404));
    }

    #[tokio::test]
    async fn login_returns_token_or_rejects() {
        let base = spawn_server().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let api = client(&format!("{base}/api"), &dir, None);

        let ok = api
            .login(&LoginRequest {
                login: "chef".into(),
                password: "secret".into(),
            })
            .await
            .unwrap();
        assert_eq!(ok.token, TOKEN);
        assert_eq!(ok.role, "Admin");

        let err = api
            .login(&LoginRequest {
                login: "chef".into(),
                password: "wrong".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Status(401));
    }
}
