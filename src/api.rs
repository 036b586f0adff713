//! REST client for the task service
//!
//! The backend is a list-style JSON API (`GET /tasks` with `_page`/`_limit`
//! paging and an `x-total-count` header). Responses are normalized before
//! they reach the cache: items missing a numeric id/order, a known column,
//! or string title/description are rejected rather than coerced; a missing
//! or unknown priority defaults to medium.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::task::{CreateTaskInput, Task, TaskColumn, TaskPage, TaskPriority, UpdateTaskInput};

/// Seam between the board and the transport. The TUI, CLI, and tests all
/// drive mutations through this trait.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn fetch_page(
        &self,
        column: TaskColumn,
        search_term: &str,
        page: u32,
        limit: usize,
    ) -> Result<TaskPage>;

    async fn create(&self, input: &CreateTaskInput) -> Result<Task>;

    async fn update(&self, input: &UpdateTaskInput) -> Result<Task>;

    async fn delete(&self, id: i64) -> Result<()>;
}

/// `TaskApi` over HTTP (reqwest).
pub struct HttpTaskApi {
    client: Client,
    base_url: String,
    retry_transient: bool,
}

impl HttpTaskApi {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry_transient: config.retry_transient,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64().filter(|n| n.is_finite()),
        Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

/// Normalize one wire item into a `Task`, or reject it.
pub fn normalize_task(value: &Value) -> Option<Task> {
    let record = value.as_object()?;

    let id = parse_number(record.get("id")?)? as i64;
    let order = parse_number(record.get("order")?)?;

    let column: TaskColumn = record.get("column")?.as_str()?.parse().ok()?;

    let title = record.get("title")?.as_str()?.to_string();
    let description = record.get("description")?.as_str()?.to_string();

    let priority = record
        .get("priority")
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse::<TaskPriority>().ok())
        .unwrap_or_default();

    Some(Task {
        id,
        title,
        description,
        column,
        order,
        priority,
    })
}

fn response_items(payload: &Value) -> Vec<Value> {
    if let Some(items) = payload.as_array() {
        return items.clone();
    }
    if let Some(items) = payload.get("data").and_then(Value::as_array) {
        return items.clone();
    }
    Vec::new()
}

fn response_total(payload: &Value, header_value: Option<&str>) -> Option<u64> {
    if let Some(total) = header_value.and_then(|raw| parse_number(&Value::String(raw.to_string())))
    {
        return Some(total as u64);
    }

    payload
        .get("items")
        .and_then(parse_number)
        .map(|total| total as u64)
}

/// Assemble a `TaskPage` from a list response body and total header.
pub fn page_from_response(
    payload: &Value,
    header_total: Option<&str>,
    page: u32,
    limit: usize,
) -> TaskPage {
    let items: Vec<Task> = response_items(payload)
        .iter()
        .filter_map(normalize_task)
        .collect();
    let total = response_total(payload, header_total);
    let has_more = match total {
        Some(total) => (page as u64) * (limit as u64) < total,
        None => items.len() == limit,
    };

    TaskPage {
        items,
        page,
        limit,
        total,
        has_more,
    }
}

async fn error_from_response(response: Response) -> Error {
    let status = response.status();
    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| {
            body.get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("request failed with status {status}"));

    Error::Api {
        status: Some(status.as_u16()),
        message,
    }
}

async fn task_from_response(response: Response) -> Result<Task> {
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }

    let payload: Value = response.json().await?;
    normalize_task(&payload)
        .ok_or_else(|| Error::MalformedResponse("task payload failed validation".to_string()))
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn fetch_page(
        &self,
        column: TaskColumn,
        search_term: &str,
        page: u32,
        limit: usize,
    ) -> Result<TaskPage> {
        let mut params: Vec<(&str, String)> = vec![
            ("column", column.as_str().to_string()),
            ("_sort", "order".to_string()),
            ("_order", "asc".to_string()),
            ("_page", page.to_string()),
            ("_limit", limit.to_string()),
        ];
        let term = search_term.trim();
        if !term.is_empty() {
            params.push(("q", term.to_string()));
        }

        let request = self.client.get(self.url("/tasks")).query(&params);
        let response = match request.try_clone() {
            Some(retry) if self.retry_transient => match request.send().await {
                Ok(response) => response,
                Err(err) if err.is_connect() || err.is_timeout() => {
                    debug!(column = %column, page, "retrying fetch after transient error");
                    retry.send().await?
                }
                Err(err) => return Err(err.into()),
            },
            _ => request.send().await?,
        };

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let header_total = response
            .headers()
            .get("x-total-count")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let payload: Value = response.json().await?;

        Ok(page_from_response(
            &payload,
            header_total.as_deref(),
            page,
            limit,
        ))
    }

    async fn create(&self, input: &CreateTaskInput) -> Result<Task> {
        let response = self
            .client
            .post(self.url("/tasks"))
            .json(input)
            .send()
            .await?;
        task_from_response(response).await
    }

    async fn update(&self, input: &UpdateTaskInput) -> Result<Task> {
        let response = self
            .client
            .patch(self.url(&format!("/tasks/{}", input.id)))
            .json(input)
            .send()
            .await?;
        task_from_response(response).await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/tasks/{id}")))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }
}
