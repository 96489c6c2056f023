use std::path::Path;

use anyhow::{Context, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response, multipart};
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

/// Error body returned by the registry on failure.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

/// Where a download currently points.
#[derive(Debug, PartialEq, Eq)]
pub enum Source {
    Local,
    Mirror(String),
}

/// Blocking client for the registry HTTP API.
pub struct ApiClient {
    base: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base: &str) -> anyhow::Result<Self> {
        let http = Client::builder()
            .redirect(Policy::none())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn list(&self) -> anyhow::Result<Vec<Value>> {
        let res = self.send(self.http.get(self.url("/api/datasets")))?;
        Ok(res.json()?)
    }

    pub fn upload(&self, title: &str, description: &str, file: &Path) -> anyhow::Result<Value> {
        let form = multipart::Form::new()
            .text("title", title.to_string())
            .text("description", description.to_string())
            .file("file", file)
            .with_context(|| format!("Failed to read {}", file.display()))?;

        let res = self.send(self.http.post(self.url("/api/uploadDataset")).multipart(form))?;
        let body: Value = res.json()?;
        Ok(body["dataset"].clone())
    }

    pub fn edit(
        &self,
        id: &str,
        title: Option<&str>,
        description: Option<&str>,
    ) -> anyhow::Result<String> {
        let mut body = json!({ "id": id });
        if let Some(title) = title {
            body["title"] = json!(title);
        }
        if let Some(description) = description {
            body["description"] = json!(description);
        }
        let res = self.send(self.http.patch(self.url("/api/dataset")).json(&body))?;
        message_of(res)
    }

    pub fn delete(&self, id: &str) -> anyhow::Result<String> {
        let res = self.send(self.http.delete(self.url(&format!("/api/dataset/{id}"))))?;
        message_of(res)
    }

    pub fn contribute(
        &self,
        dataset_id: &str,
        name: &str,
        email: &str,
        host_link: &str,
    ) -> anyhow::Result<String> {
        let body = json!({
            "datasetId": dataset_id,
            "name": name,
            "email": email,
            "hostLink": host_link,
        });
        let res = self.send(self.http.post(self.url("/api/contribute")).json(&body))?;
        message_of(res)
    }

    /// Ask where `/api/files/{id}` currently serves from without downloading.
    pub fn source(&self, id: &str) -> anyhow::Result<Source> {
        let res = self.send(self.http.get(self.url(&format!("/api/files/{id}"))))?;
        if res.status() == StatusCode::FOUND {
            let location = res
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .context("Redirect without a Location header")?;
            return Ok(Source::Mirror(location.to_string()));
        }
        Ok(Source::Local)
    }

    fn send(&self, req: reqwest::blocking::RequestBuilder) -> anyhow::Result<Response> {
        let res = req.send().context("Request to registry failed")?;
        let status = res.status();
        debug!(%status, url = %res.url(), "Registry responded");
        if status.is_success() || status.is_redirection() {
            return Ok(res);
        }
        let text = res.text().unwrap_or_default();
        bail!("{}", describe_failure(status, &text))
    }
}

fn message_of(res: Response) -> anyhow::Result<String> {
    let body: Value = res.json()?;
    Ok(body["message"].as_str().unwrap_or_default().to_string())
}

/// Render a failed response, preferring the structured error body.
pub fn describe_failure(status: StatusCode, text: &str) -> String {
    match serde_json::from_str::<ApiError>(text) {
        Ok(err) => format!("{} ({}): {}", err.code, status.as_u16(), err.message),
        Err(_) if text.trim().is_empty() => format!("request failed with status {status}"),
        Err(_) => format!("request failed with status {status}: {}", text.trim()),
    }
}
