//! Jira Cloud REST v2 adapter for [`TicketSystem`].

use crate::error::{Result, TixError};
use crate::tracker::TicketSystem;
use crate::types::{CreateTicketRequest, ExistingChildTicket, Ticket};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::{json, Value};
use std::time::Duration;

pub struct JiraClient {
    http: Client,
    base_url: String,
    email: String,
    token: String,
    story_points_field: String,
}

impl JiraClient {
    /// `email` empty means `token` is sent as a bearer token (Jira Data
    /// Center PATs); otherwise basic auth with email + API token.
    pub fn new(
        base_url: impl Into<String>,
        email: impl Into<String>,
        token: impl Into<String>,
        story_points_field: impl Into<String>,
    ) -> Self {
        JiraClient {
            http: Client::builder()
                .connect_timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            email: email.into(),
            token: token.into(),
            story_points_field: story_points_field.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/rest/api/2/{path}", self.base_url)
    }

    fn auth(&self, req: RequestBuilder) -> RequestBuilder {
        let req = req.header("Accept", "application/json");
        if self.email.is_empty() {
            req.bearer_auth(&self.token)
        } else {
            req.basic_auth(&self.email, Some(&self.token))
        }
    }

    fn send(&self, operation: &str, req: RequestBuilder) -> Result<Response> {
        tracing::debug!(operation, "jira request");
        let resp = self
            .auth(req)
            .send()
            .map_err(|e| TixError::tracker(operation, e))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().unwrap_or_default();
        Err(TixError::tracker(
            operation,
            format!("{} {}", status.as_u16(), error_summary(&body)),
        ))
    }

    fn send_json(&self, operation: &str, req: RequestBuilder) -> Result<Value> {
        self.send(operation, req)?
            .json::<Value>()
            .map_err(|e| TixError::tracker(operation, e))
    }

    fn fields(&self) -> String {
        format!(
            "summary,description,issuetype,status,parent,{}",
            self.story_points_field
        )
    }

    fn ticket_from_json(&self, issue: &Value) -> Result<Ticket> {
        let key = issue["key"]
            .as_str()
            .ok_or_else(|| TixError::tracker("decode issue", "issue has no key"))?;
        let fields = &issue["fields"];
        let issue_type = fields["issuetype"]["name"].as_str().unwrap_or("").to_string();
        Ok(Ticket {
            key: key.to_string(),
            summary: fields["summary"].as_str().unwrap_or("").to_string(),
            description: fields["description"].as_str().map(str::to_string),
            is_epic: issue_type.eq_ignore_ascii_case("epic"),
            issue_type,
            status: fields["status"]["name"].as_str().unwrap_or("").to_string(),
            story_points: points_value(&fields[self.story_points_field.as_str()]),
            parent_key: fields["parent"]["key"].as_str().map(str::to_string),
        })
    }

    fn update_fields(&self, operation: &str, key: &str, fields: Value) -> Result<()> {
        let req = self
            .http
            .put(self.url(&format!("issue/{key}")))
            .json(&json!({ "fields": fields }));
        self.send(operation, req)?;
        Ok(())
    }
}

/// Story points arrive as a JSON number (often `3.0`) or null.
fn points_value(v: &Value) -> Option<u32> {
    v.as_f64()
        .filter(|p| *p >= 0.0)
        .map(|p| p.round() as u32)
}

/// Jira errors come back as `{"errorMessages": [...], "errors": {field: msg}}`.
fn error_summary(body: &str) -> String {
    let Ok(v) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };
    let mut parts: Vec<String> = v["errorMessages"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|m| m.as_str().map(str::to_string))
        .collect();
    if let Some(errors) = v["errors"].as_object() {
        for (field, msg) in errors {
            parts.push(format!("{field}: {}", msg.as_str().unwrap_or_default()));
        }
    }
    if parts.is_empty() {
        body.trim().to_string()
    } else {
        parts.join("; ")
    }
}

impl TicketSystem for JiraClient {
    fn get_ticket(&self, key: &str) -> Result<Ticket> {
        let req = self
            .http
            .get(self.url(&format!("issue/{key}")))
            .query(&[("fields", self.fields())]);
        let issue = self.send_json("get ticket", req)?;
        self.ticket_from_json(&issue)
    }

    fn search(&self, jql: &str, max_results: usize) -> Result<Vec<Ticket>> {
        let fields: Vec<String> = self.fields().split(',').map(str::to_string).collect();
        let req = self.http.post(self.url("search")).json(&json!({
            "jql": jql,
            "maxResults": max_results,
            "fields": fields,
        }));
        let body = self.send_json("search", req)?;
        body["issues"]
            .as_array()
            .into_iter()
            .flatten()
            .map(|issue| self.ticket_from_json(issue))
            .collect()
    }

    fn children(&self, parent_key: &str) -> Result<Vec<ExistingChildTicket>> {
        let jql = format!("parent = {parent_key} ORDER BY created ASC");
        Ok(self
            .search(&jql, 200)?
            .into_iter()
            .map(|t| ExistingChildTicket {
                key: t.key,
                summary: t.summary,
                story_points: t.story_points.unwrap_or(0),
                issue_type: t.issue_type,
            })
            .collect())
    }

    fn create_ticket(&self, request: &CreateTicketRequest) -> Result<String> {
        let mut fields = json!({
            "project": { "key": request.project },
            "summary": request.summary,
            "issuetype": { "name": request.issue_type },
        });
        if let Some(desc) = &request.description {
            fields["description"] = json!(desc);
        }
        if let Some(parent) = &request.parent_key {
            fields["parent"] = json!({ "key": parent });
        }
        if let Some(points) = request.story_points {
            fields[self.story_points_field.as_str()] = json!(points);
        }
        let req = self.http.post(self.url("issue")).json(&json!({ "fields": fields }));
        let body = self.send_json("create ticket", req)?;
        let key = body["key"]
            .as_str()
            .ok_or_else(|| TixError::tracker("create ticket", "response has no key"))?;
        tracing::info!(key, summary = %request.summary, "created ticket");
        Ok(key.to_string())
    }

    fn update_description(&self, key: &str, description: &str) -> Result<()> {
        self.update_fields("update description", key, json!({ "description": description }))?;
        tracing::info!(key, "updated description");
        Ok(())
    }

    fn update_story_points(&self, key: &str, points: u32) -> Result<()> {
        let mut fields = json!({});
        fields[self.story_points_field.as_str()] = json!(points);
        self.update_fields("update story points", key, fields)?;
        tracing::info!(key, points, "updated story points");
        Ok(())
    }

    fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{key}", self.base_url)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
