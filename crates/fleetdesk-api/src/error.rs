// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub const SERVER_ERROR_MESSAGE: &str = "Ocurrió un error en el servidor, intente nuevamente";
pub const FORBIDDEN_MESSAGE: &str = "No tiene permisos para realizar esta operación";
pub const UNAUTHORIZED_MESSAGE: &str = "Su sesión expiró, inicie sesión nuevamente";

/// Normalized failure of a call against the remote record store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("unauthorized (401): session missing or expired")]
    Unauthorized,
    #[error("forbidden (403){}", detail_suffix(.message))]
    Forbidden { message: Option<String> },
    #[error("validation failed ({status}): {message}")]
    Validation {
        status: u16,
        message: String,
        fields: BTreeMap<String, String>,
    },
    #[error("not found (404)")]
    NotFound,
    #[error("server error ({status})")]
    Server { status: u16 },
    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("cannot reach {base_url} -- check [api].base_url and that the server is running ({detail})")]
    Connection { base_url: String, detail: String },
    #[error("decode response from {url}: {detail}")]
    Decode { url: String, detail: String },
}

impl ApiError {
    pub fn from_status(status: u16, body: &str) -> Self {
        let parsed = ErrorBody::parse(body);
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden {
                message: parsed.message,
            },
            404 => Self::NotFound,
            422 => Self::Validation {
                status,
                message: parsed
                    .message
                    .unwrap_or_else(|| "Los datos enviados no son válidos".to_owned()),
                fields: parsed.fields,
            },
            400 if parsed.message.is_some() || !parsed.fields.is_empty() => Self::Validation {
                status,
                message: parsed
                    .message
                    .unwrap_or_else(|| "Los datos enviados no son válidos".to_owned()),
                fields: parsed.fields,
            },
            500..=599 => Self::Server { status },
            _ => Self::Status {
                status,
                message: parsed.message.unwrap_or_else(|| short_body(body)),
            },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound => Some(404),
            Self::Validation { status, .. }
            | Self::Server { status }
            | Self::Status { status, .. } => Some(*status),
            Self::Connection { .. } | Self::Decode { .. } => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Single message fit for showing to the person at the screen.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized => UNAUTHORIZED_MESSAGE.to_owned(),
            Self::Forbidden { message } => message
                .clone()
                .unwrap_or_else(|| FORBIDDEN_MESSAGE.to_owned()),
            Self::Validation { message, .. } => message.clone(),
            Self::NotFound => "El registro solicitado no existe".to_owned(),
            Self::Server { .. } => SERVER_ERROR_MESSAGE.to_owned(),
            Self::Status { message, .. } => message.clone(),
            Self::Connection { .. } => {
                "No se pudo conectar con el servidor, revise su conexión".to_owned()
            }
            Self::Decode { .. } => "El servidor envió una respuesta inesperada".to_owned(),
        }
    }

    /// Server-supplied per-field messages, when the failure carries any.
    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Validation { fields, .. } if !fields.is_empty() => Some(fields),
            _ => None,
        }
    }
}

fn detail_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|message| format!(": {message}"))
        .unwrap_or_default()
}

fn short_body(body: &str) -> String {
    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() < 100 && !trimmed.contains('{') {
        return trimmed.to_owned();
    }
    "El servidor rechazó la operación".to_owned()
}

#[derive(Debug, Default)]
struct ErrorBody {
    message: Option<String>,
    fields: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
    error: Option<Value>,
    errors: Option<BTreeMap<String, Value>>,
}

impl ErrorBody {
    fn parse(body: &str) -> Self {
        let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) else {
            return Self::default();
        };

        let error_text = match envelope.error {
            Some(Value::String(text)) => Some(text),
            Some(Value::Object(object)) => object
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned),
            _ => None,
        };
        let message = envelope
            .message
            .or(error_text)
            .filter(|message| !message.trim().is_empty());

        let fields = envelope
            .errors
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(field, value)| {
                let text = match value {
                    Value::String(text) => text,
                    Value::Array(items) => items.first()?.as_str()?.to_owned(),
                    _ => return None,
                };
                Some((field, text))
            })
            .collect();

        Self { message, fields }
    }
}
