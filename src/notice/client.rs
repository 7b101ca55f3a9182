use crate::config::Config;
use crate::notice::api_types::{
  decode_rows, ApiErrorBody, ApiHealth, ApiLoginRequest, ApiLoginResponse, ApiNotice,
};
use crate::notice::store::{NoticeStore, StoreError};
use crate::notice::types::{Notice, NoticeDraft, NoticeFilter, NoticeId};
use color_eyre::{eyre::eyre, Result};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Credentials handed out by the login endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSession {
  pub username: String,
  pub token: String,
}

/// HTTP client for the notice service
#[derive(Clone)]
pub struct NoticeClient {
  http: reqwest::Client,
  base_url: Url,
  token: Arc<RwLock<Option<String>>>,
}

impl NoticeClient {
  pub fn new(config: &Config) -> Result<Self> {
    Self::with_base_url(&config.api.url, Duration::from_secs(config.api.timeout_secs))
  }

  pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
    let mut base_url =
      Url::parse(base_url).map_err(|e| eyre!("Invalid API url '{}': {}", base_url, e))?;

    // Endpoints are joined relative to the base, which needs a trailing slash
    if !base_url.path().ends_with('/') {
      let path = format!("{}/", base_url.path());
      base_url.set_path(&path);
    }

    let http = reqwest::Client::builder()
      .timeout(timeout)
      .user_agent(concat!("noticeboard/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url,
      token: Arc::new(RwLock::new(None)),
    })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  /// Bearer token used for mutating calls
  pub fn token(&self) -> Option<String> {
    self
      .token
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  pub fn set_token(&self, token: Option<String>) {
    *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
  }

  pub fn is_authenticated(&self) -> bool {
    self.token().is_some()
  }

  fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
    self
      .base_url
      .join(path)
      .map_err(|e| StoreError::Invalid(format!("bad endpoint {}: {}", path, e)))
  }

  fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, StoreError> {
    match self.token() {
      Some(token) => Ok(request.bearer_auth(token)),
      None => Err(StoreError::Unauthorized("not logged in".to_string())),
    }
  }

  /// Turn a non-2xx response into the matching store error
  async fn check(
    &self,
    response: Response,
    id: Option<&NoticeId>,
    authenticated: bool,
  ) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
      .map(|b| b.message())
      .unwrap_or_else(|_| {
        if body.trim().is_empty() {
          status.to_string()
        } else {
          body
        }
      });

    if status == StatusCode::NOT_FOUND {
      if let Some(id) = id {
        return Err(StoreError::NotFound(id.clone()));
      }
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
      if authenticated {
        // The session is no good any more
        warn!(%status, "session rejected by server, dropping token");
        self.set_token(None);
      }
      return Err(StoreError::Unauthorized(message));
    }

    Err(StoreError::Server {
      status: status.as_u16(),
      message,
    })
  }

  async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode(e.to_string()))
  }

  /// Exchange username and password for a bearer token.
  ///
  /// On success the token is kept for subsequent calls.
  pub async fn login(&self, username: &str, password: &str) -> Result<LoginSession, StoreError> {
    let response = self
      .http
      .post(self.endpoint("api/auth/login")?)
      .json(&ApiLoginRequest { username, password })
      .send()
      .await?;

    let response = self.check(response, None, false).await?;
    let login: ApiLoginResponse = Self::decode(response).await?;

    info!(username = %login.username, "logged in");
    self.set_token(Some(login.token.clone()));

    Ok(LoginSession {
      username: login.username,
      token: login.token,
    })
  }

  /// Forget the token locally. The service keeps no server-side session.
  pub fn logout(&self) {
    self.set_token(None);
  }

  /// Ping the service health endpoint
  pub async fn health(&self) -> Result<String, StoreError> {
    let response = self.http.get(self.endpoint("health")?).send().await?;
    let response = self.check(response, None, false).await?;
    let health: ApiHealth = Self::decode(response).await?;
    Ok(health.status)
  }
}

impl NoticeStore for NoticeClient {
  async fn list_notices(&self, filter: &NoticeFilter) -> Result<Vec<Notice>, StoreError> {
    let mut request = self.http.get(self.endpoint("api/circulars")?);
    if filter.featured_only {
      request = request.query(&[("featured", "true")]);
    } else if let Some(dept) = filter.department.filter(|d| !d.is_wildcard()) {
      request = request.query(&[("department", dept.label())]);
    }

    let response = self.check(request.send().await?, None, false).await?;
    let rows: Vec<serde_json::Value> = Self::decode(response).await?;
    let notices = decode_rows(rows);

    debug!(count = notices.len(), "listed notices");
    Ok(notices)
  }

  async fn get_notice(&self, id: &NoticeId) -> Result<Notice, StoreError> {
    let url = self.endpoint(&format!("api/circulars/{}", id))?;
    let response = self.http.get(url).send().await?;
    let response = self.check(response, Some(id), false).await?;
    Ok(Self::decode::<ApiNotice>(response).await?.into())
  }

  async fn create_notice(&self, draft: &NoticeDraft) -> Result<Notice, StoreError> {
    draft.validate().map_err(StoreError::Invalid)?;

    let request = self
      .authorized(self.http.post(self.endpoint("api/circulars")?))?
      .json(draft);
    let response = self.check(request.send().await?, None, true).await?;
    let notice: Notice = Self::decode::<ApiNotice>(response).await?.into();

    info!(id = %notice.id, title = %notice.title, "created notice");
    Ok(notice)
  }

  async fn update_notice(&self, id: &NoticeId, draft: &NoticeDraft) -> Result<Notice, StoreError> {
    draft.validate().map_err(StoreError::Invalid)?;

    let url = self.endpoint(&format!("api/circulars/{}", id))?;
    let request = self.authorized(self.http.put(url))?.json(draft);
    let response = self.check(request.send().await?, Some(id), true).await?;
    let notice: Notice = Self::decode::<ApiNotice>(response).await?.into();

    info!(id = %notice.id, "updated notice");
    Ok(notice)
  }

  async fn delete_notice(&self, id: &NoticeId) -> Result<(), StoreError> {
    let url = self.endpoint(&format!("api/circulars/{}", id))?;
    let request = self.authorized(self.http.delete(url))?;
    self.check(request.send().await?, Some(id), true).await?;

    info!(%id, "deleted notice");
    Ok(())
  }

  async fn set_featured(&self, id: &NoticeId) -> Result<Notice, StoreError> {
    let url = self.endpoint(&format!("api/circulars/{}/featured", id))?;
    let request = self.authorized(self.http.patch(url))?;
    let response = self.check(request.send().await?, Some(id), true).await?;
    let notice: Notice = Self::decode::<ApiNotice>(response).await?.into();

    info!(%id, "featured notice");
    Ok(notice)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::notice::types::Department;
  use chrono::NaiveDate;
  use wiremock::matchers::{body_json, header, method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn row(id: &str, featured: bool) -> serde_json::Value {
    serde_json::json!({
      "id": id,
      "title": format!("Title {}", id),
      "date": "2024-05-01T00:00:00.000Z",
      "subject": "Subject",
      "department": "CS",
      "body": "<p>Hello</p>",
      "attachments": [],
      "created_at": "2024-04-30T10:00:00.000Z",
      "is_featured": featured
    })
  }

  fn draft() -> NoticeDraft {
    NoticeDraft {
      title: "Holiday".to_string(),
      date: NaiveDate::from_ymd_opt(2024, 8, 15).unwrap(),
      subject: "Independence Day".to_string(),
      department: Department::All,
      body: "<p>College closed</p>".to_string(),
      attachments: Vec::new(),
    }
  }

  fn client(server: &MockServer) -> NoticeClient {
    NoticeClient::with_base_url(&server.uri(), Duration::from_secs(5)).unwrap()
  }

  #[tokio::test]
  async fn test_list_passes_department_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/circulars"))
      .and(query_param("department", "Fee Dues"))
      .respond_with(ResponseTemplate::new(200).set_body_json(vec![row("1", true), row("2", false)]))
      .expect(1)
      .mount(&server)
      .await;

    let notices = client(&server)
      .list_notices(&NoticeFilter::department(Department::FeeDues))
      .await
      .unwrap();

    assert_eq!(notices.len(), 2);
    assert!(notices[0].is_featured);
    assert_eq!(notices[1].id.as_str(), "2");
  }

  #[tokio::test]
  async fn test_list_keeps_rows_around_an_unknown_department() {
    let server = MockServer::start().await;
    let mut odd = row("2", false);
    odd["department"] = serde_json::json!("Hostel");
    Mock::given(method("GET"))
      .and(path("/api/circulars"))
      .respond_with(ResponseTemplate::new(200).set_body_json(vec![row("1", false), odd, row("3", false)]))
      .mount(&server)
      .await;

    let notices = client(&server)
      .list_notices(&NoticeFilter::default())
      .await
      .unwrap();

    let ids: Vec<&str> = notices.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "3"]);
  }

  #[tokio::test]
  async fn test_get_missing_notice_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/circulars/99"))
      .respond_with(
        ResponseTemplate::new(404).set_body_json(serde_json::json!({"error": "Circular not found"})),
      )
      .mount(&server)
      .await;

    let err = client(&server)
      .get_notice(&NoticeId::from("99"))
      .await
      .unwrap_err();
    assert!(err.is_not_found());
  }

  #[tokio::test]
  async fn test_mutation_without_token_fails_locally() {
    let server = MockServer::start().await;
    let err = client(&server)
      .delete_notice(&NoticeId::from("1"))
      .await
      .unwrap_err();
    assert!(err.is_unauthorized());
    assert!(server.received_requests().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_login_then_create_sends_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/auth/login"))
      .and(body_json(serde_json::json!({"username": "admin", "password": "secret"})))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(serde_json::json!({"token": "tok-123", "username": "admin"})),
      )
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/api/circulars"))
      .and(header("Authorization", "Bearer tok-123"))
      .respond_with(ResponseTemplate::new(201).set_body_json(row("7", false)))
      .expect(1)
      .mount(&server)
      .await;

    let client = client(&server);
    let session = client.login("admin", "secret").await.unwrap();
    assert_eq!(session.token, "tok-123");

    let created = client.create_notice(&draft()).await.unwrap();
    assert_eq!(created.id.as_str(), "7");
  }

  #[tokio::test]
  async fn test_bad_credentials_are_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/auth/login"))
      .respond_with(
        ResponseTemplate::new(401).set_body_json(serde_json::json!({"error": "Invalid credentials"})),
      )
      .mount(&server)
      .await;

    let err = client(&server).login("admin", "nope").await.unwrap_err();
    assert_eq!(err.to_string(), "unauthorized: Invalid credentials");
  }

  #[tokio::test]
  async fn test_rejected_token_is_dropped() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
      .and(path("/api/circulars/3/featured"))
      .respond_with(
        ResponseTemplate::new(403).set_body_json(serde_json::json!({"error": "Invalid token"})),
      )
      .mount(&server)
      .await;

    let client = client(&server);
    client.set_token(Some("expired".to_string()));

    let err = client.set_featured(&NoticeId::from("3")).await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(!client.is_authenticated());
  }

  #[tokio::test]
  async fn test_server_error_carries_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/circulars"))
      .respond_with(
        ResponseTemplate::new(500).set_body_json(serde_json::json!({"error": "Server error"})),
      )
      .mount(&server)
      .await;

    let err = client(&server)
      .list_notices(&NoticeFilter::default())
      .await
      .unwrap_err();
    assert_eq!(err.to_string(), "server returned 500: Server error");
  }

  #[tokio::test]
  async fn test_invalid_draft_is_rejected_before_sending() {
    let server = MockServer::start().await;
    let client = client(&server);
    client.set_token(Some("tok".to_string()));

    let mut bad = draft();
    bad.title.clear();
    let err = client.create_notice(&bad).await.unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
  }

  #[test]
  fn test_base_url_with_prefix_keeps_path() {
    let client =
      NoticeClient::with_base_url("https://example.org/board", Duration::from_secs(1)).unwrap();
    assert_eq!(
      client.endpoint("api/circulars").unwrap().as_str(),
      "https://example.org/board/api/circulars"
    );
  }
}
