// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod error;
mod session;

pub use error::*;
pub use session::*;

use anyhow::{Context, Result, bail};
use fleetdesk_app::search::records_from_payload;
use fleetdesk_app::{Record, RecordId, SelectOption, UpdateMethod};
use reqwest::Method;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

pub const SEARCH_PARAM: &str = "search";

/// Boundary to the remote record store. Endpoints are the configuration's
/// templates with any identifier already substituted.
pub trait RecordStore {
    fn create(&self, credential: &Credential, endpoint: &str, payload: &Record)
    -> ApiResult<Value>;

    fn update(
        &self,
        credential: &Credential,
        endpoint: &str,
        method: UpdateMethod,
        payload: &Record,
    ) -> ApiResult<Value>;

    fn search(&self, credential: &Credential, endpoint: &str, query: &str)
    -> ApiResult<Vec<Record>>;

    fn fetch_options(&self, credential: &Credential, endpoint: &str)
    -> ApiResult<Vec<SelectOption>>;

    fn deactivate(&self, credential: &Credential, endpoint: &str) -> ApiResult<Value>;
}

/// Substitutes `id` into an identifier-bearing template. `{id}` and `:id`
/// placeholders are replaced; templates without one get the id appended as
/// a trailing path segment.
pub fn endpoint_for_id(template: &str, id: &RecordId) -> String {
    let segment = match id {
        RecordId::Int(value) => value.to_string(),
        RecordId::Text(text) => path_segment(text),
    };

    if template.contains("{id}") {
        return template.replace("{id}", &segment);
    }
    if let Some(position) = find_colon_id(template) {
        let mut out = template.to_owned();
        out.replace_range(position..position + 3, &segment);
        return out;
    }
    format!("{}/{}", template.trim_end_matches('/'), segment)
}

/// Percent-encodes `text` as a single URL path segment.
fn path_segment(text: &str) -> String {
    let Ok(mut scratch) = Url::parse("http://segment.invalid/") else {
        return text.to_owned();
    };
    if let Ok(mut segments) = scratch.path_segments_mut() {
        segments.clear().push(text);
    }
    scratch.path().trim_start_matches('/').to_owned()
}

fn find_colon_id(template: &str) -> Option<usize> {
    template.match_indices(":id").find_map(|(position, _)| {
        let rest = &template[position + 3..];
        let ends_segment = rest.is_empty() || rest.starts_with('/') || rest.starts_with('?');
        let starts_segment = template[..position].ends_with('/');
        (starts_segment && ends_segment).then_some(position)
    })
}

/// Option lists come back either as bare strings or as objects carrying an
/// id/value plus a display name.
pub fn options_from_payload(payload: Value) -> Option<Vec<SelectOption>> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(Value::Array(items)) => items,
            _ => return None,
        },
        _ => return None,
    };

    let options = items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(text) => Some(SelectOption::new(text.clone(), text)),
            Value::Object(object) => {
                let value = ["id", "value"]
                    .iter()
                    .find_map(|key| object.get(*key).cloned())?;
                let label = ["nombre", "name", "label", "descripcion"]
                    .iter()
                    .find_map(|key| object.get(*key).and_then(Value::as_str))
                    .map(str::to_owned)
                    .unwrap_or_else(|| fleetdesk_app::rules::value_text(&value));
                Some(SelectOption { value, label })
            }
            _ => None,
        })
        .collect();
    Some(options)
}

#[derive(Debug, Clone)]
pub struct HttpRecordStore {
    base_url: String,
    http: HttpClient,
}

impl HttpRecordStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("api.base_url must not be empty");
        }
        Url::parse(&base_url).with_context(|| format!("api.base_url {base_url:?} is not a URL"))?;

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, endpoint: &str) -> ApiResult<Url> {
        let raw = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_owned()
        } else if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        };
        Url::parse(&raw).map_err(|error| ApiError::Decode {
            url: raw.clone(),
            detail: format!("invalid endpoint: {error}"),
        })
    }

    fn request(&self, method: Method, url: Url, credential: &Credential) -> RequestBuilder {
        log::debug!("{method} {url}");
        self.http
            .request(method, url)
            .bearer_auth(credential.token())
    }

    fn execute(&self, request: RequestBuilder, url: &Url) -> ApiResult<Value> {
        let response = request.send().map_err(|error| ApiError::Connection {
            base_url: self.base_url.clone(),
            detail: error.to_string(),
        })?;

        let status = response.status();
        let body = response.text().map_err(|error| ApiError::Decode {
            url: url.to_string(),
            detail: error.to_string(),
        })?;

        if !status.is_success() {
            let error = ApiError::from_status(status.as_u16(), &body);
            log::debug!("{url} failed: {error}");
            return Err(error);
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|error| ApiError::Decode {
            url: url.to_string(),
            detail: error.to_string(),
        })
    }
}

impl RecordStore for HttpRecordStore {
    fn create(
        &self,
        credential: &Credential,
        endpoint: &str,
        payload: &Record,
    ) -> ApiResult<Value> {
        let url = self.url_for(endpoint)?;
        let request = self
            .request(Method::POST, url.clone(), credential)
            .json(payload);
        self.execute(request, &url)
    }

    fn update(
        &self,
        credential: &Credential,
        endpoint: &str,
        method: UpdateMethod,
        payload: &Record,
    ) -> ApiResult<Value> {
        let url = self.url_for(endpoint)?;
        let method = match method {
            UpdateMethod::Put => Method::PUT,
            UpdateMethod::Post => Method::POST,
        };
        let request = self.request(method, url.clone(), credential).json(payload);
        self.execute(request, &url)
    }

    fn search(
        &self,
        credential: &Credential,
        endpoint: &str,
        query: &str,
    ) -> ApiResult<Vec<Record>> {
        let mut url = self.url_for(endpoint)?;
        url.query_pairs_mut().append_pair(SEARCH_PARAM, query);
        let payload = self.execute(self.request(Method::GET, url.clone(), credential), &url)?;
        records_from_payload(payload).ok_or_else(|| ApiError::Decode {
            url: url.to_string(),
            detail: "expected a list of records".to_owned(),
        })
    }

    fn fetch_options(
        &self,
        credential: &Credential,
        endpoint: &str,
    ) -> ApiResult<Vec<SelectOption>> {
        let url = self.url_for(endpoint)?;
        let payload = self.execute(self.request(Method::GET, url.clone(), credential), &url)?;
        options_from_payload(payload).ok_or_else(|| ApiError::Decode {
            url: url.to_string(),
            detail: "expected a list of options".to_owned(),
        })
    }

    fn deactivate(&self, credential: &Credential, endpoint: &str) -> ApiResult<Value> {
        let url = self.url_for(endpoint)?;
        self.execute(self.request(Method::POST, url.clone(), credential), &url)
    }
}
