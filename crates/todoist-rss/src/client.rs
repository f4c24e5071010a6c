//! REST client for the Todoist task API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, RequestBuilder, Response, StatusCode};
use tracing::{debug, instrument, warn};

use crate::config::{Config, DEFAULT_API_URL, DEFAULT_CLOSE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::error::TodoistError;
use crate::models::{Task, TaskPage};

/// Source of feed tasks.
///
/// The server only talks to Todoist through this trait.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Tasks carrying `label`, in upstream order.
    async fn list_tasks_by_label(&self, label: &str) -> Result<Vec<Task>, TodoistError>;

    /// Mark one task completed.
    async fn close_task(&self, task_id: &str) -> Result<(), TodoistError>;
}

/// Todoist REST client.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct TodoistClient {
    client: reqwest::Client,
    token: Option<String>,
    api_url: String,
    close_url: String,
}

impl TodoistClient {
    /// Create a client against the public Todoist API.
    ///
    /// A missing token is not an error here; every call fails with
    /// [`TodoistError::AuthRejected`] instead.
    pub fn new(token: Option<String>) -> Result<Self, TodoistError> {
        Self::with_urls(
            token,
            DEFAULT_API_URL,
            DEFAULT_CLOSE_URL,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Create a client with custom endpoints and timeout.
    pub fn with_urls(
        token: Option<String>,
        api_url: &str,
        close_url: &str,
        timeout: Duration,
    ) -> Result<Self, TodoistError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            token: token.filter(|t| !t.is_empty()),
            api_url: api_url.trim_end_matches('/').to_string(),
            close_url: close_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from service configuration.
    pub fn from_config(config: &Config) -> Result<Self, TodoistError> {
        Self::with_urls(
            config.token.clone(),
            &config.api_url,
            &config.close_url,
            config.request_timeout(),
        )
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, TodoistError> {
        let token = self.token.as_ref().ok_or_else(|| TodoistError::AuthRejected {
            reason: "no API token configured".to_string(),
        })?;
        Ok(request.header(AUTHORIZATION, format!("Bearer {token}")))
    }

    /// Map non-success statuses to errors, passing successful responses through.
    async fn check_status(response: Response) -> Result<Response, TodoistError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TodoistError::AuthRejected {
                reason: format!("{status}: {body}"),
            });
        }

        Err(TodoistError::UnexpectedStatus { status, body })
    }
}

#[async_trait]
impl TaskSource for TodoistClient {
    #[instrument(skip(self), fields(label = %label))]
    async fn list_tasks_by_label(&self, label: &str) -> Result<Vec<Task>, TodoistError> {
        let request = self
            .client
            .get(format!("{}/tasks", self.api_url))
            .query(&[("label", label)]);

        let response = self.authorize(request)?.send().await?;
        let response = Self::check_status(response).await?;
        let body = response.bytes().await?;
        let page: TaskPage = serde_json::from_slice(&body)?;

        // Only the first page is served.
        if let Some(cursor) = page.next_cursor.as_deref().filter(|c| !c.is_empty()) {
            warn!(
                label = %label,
                next_cursor = %cursor,
                returned = page.results.len(),
                "More tasks match the label than fit in one page; the rest are omitted"
            );
        }

        debug!(count = page.results.len(), "Fetched tasks");
        Ok(page.results)
    }

    #[instrument(skip(self), fields(task_id = %task_id))]
    async fn close_task(&self, task_id: &str) -> Result<(), TodoistError> {
        let request = self
            .client
            .post(format!("{}/tasks/{task_id}/close", self.close_url));

        let response = self.authorize(request)?.send().await?;
        Self::check_status(response).await?;

        debug!("Closed task");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, token: Option<&str>) -> TodoistClient {
        TodoistClient::with_urls(
            token.map(str::to_string),
            &server.uri(),
            &server.uri(),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[test]
    fn test_client_creation() {
        assert!(TodoistClient::new(Some("test-token".to_string())).is_ok());
        assert!(TodoistClient::new(None).is_ok());
    }

    #[tokio::test]
    async fn test_list_tasks_sends_label_and_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .and(query_param("label", "rss"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {
                        "id": "1",
                        "content": "[Buy milk](https://example.com/milk)",
                        "description": "urgent",
                        "added_at": "2024-01-02T10:00:00Z"
                    },
                    {
                        "id": "2",
                        "content": "Call mom",
                        "description": "",
                        "added_at": "2024-01-03T08:30:00Z"
                    }
                ],
                "next_cursor": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("secret"));
        let tasks = client.list_tasks_by_label("rss").await.unwrap();

        let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(tasks[0].description, "urgent");
    }

    #[tokio::test]
    async fn test_list_tasks_ignores_next_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    { "id": "1", "content": "a", "added_at": "2024-01-02T10:00:00Z" }
                ],
                "next_cursor": "cursor-2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("secret"));
        let tasks = client.list_tasks_by_label("rss").await.unwrap();
        assert_eq!(tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_list_tasks_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Forbidden"))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("wrong"));
        let err = client.list_tasks_by_label("rss").await.unwrap_err();
        assert!(matches!(err, TodoistError::AuthRejected { .. }));
    }

    #[tokio::test]
    async fn test_list_tasks_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("secret"));
        let err = client.list_tasks_by_label("rss").await.unwrap_err();
        assert!(matches!(err, TodoistError::Decode(_)));
    }

    #[tokio::test]
    async fn test_list_tasks_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("secret"));
        let err = client.list_tasks_by_label("rss").await.unwrap_err();
        match err {
            TodoistError::UnexpectedStatus { status, body } => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_token_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let err = client.list_tasks_by_label("rss").await.unwrap_err();
        assert!(matches!(err, TodoistError::AuthRejected { .. }));

        let err = client.close_task("1").await.unwrap_err();
        assert!(matches!(err, TodoistError::AuthRejected { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_upstream() {
        // Nothing listens on the discard port.
        let client = TodoistClient::with_urls(
            Some("secret".to_string()),
            "http://127.0.0.1:9",
            "http://127.0.0.1:9",
            Duration::from_secs(2),
        )
        .unwrap();

        let err = client.list_tasks_by_label("rss").await.unwrap_err();
        assert!(matches!(err, TodoistError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_close_task_posts_to_close_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tasks/42/close"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("secret"));
        client.close_task("42").await.unwrap();
    }

    #[tokio::test]
    async fn test_close_task_ignores_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tasks/42/close"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("secret"));
        assert!(client.close_task("42").await.is_ok());
    }

    #[tokio::test]
    async fn test_close_task_failure_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tasks/42/close"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Task not found"))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("secret"));
        let err = client.close_task("42").await.unwrap_err();
        assert!(matches!(err, TodoistError::UnexpectedStatus { .. }));
    }
}
