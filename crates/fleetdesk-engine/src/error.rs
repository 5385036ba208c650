// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use fleetdesk_api::{ApiError, SessionContext};
use fleetdesk_app::{FieldErrors, FormMode};
use fleetdesk_app::search::QUERY_TOO_SHORT_MESSAGE;

pub const INVALID_FORM_MESSAGE: &str = "Revise los campos marcados antes de guardar";
pub const NOT_PERMITTED_MESSAGE: &str = "Solo un gerente puede realizar esta operación";
pub const BUSY_MESSAGE: &str = "Espere a que termine la operación en curso";

/// Why a screen operation did not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScreenError {
    #[error("form has {} invalid field(s)", invalid_count(.errors))]
    Validation { errors: FieldErrors },
    #[error("search query must have at least 2 characters")]
    QueryTooShort,
    #[error("another request is still in flight")]
    Busy,
    #[error("{operation} requires the {role} role")]
    NotPermitted {
        operation: &'static str,
        role: &'static str,
    },
    #[error("{operation} is not available in {} mode", mode_name(.mode))]
    WrongMode {
        operation: &'static str,
        mode: FormMode,
    },
    #[error("{entity} has no {endpoint} endpoint -- add endpoints.{endpoint} to its configuration")]
    Unsupported {
        entity: String,
        endpoint: &'static str,
    },
    #[error("response belongs to a form that has since changed")]
    Stale,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ScreenError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { errors } => errors
                .general()
                .first()
                .cloned()
                .unwrap_or_else(|| INVALID_FORM_MESSAGE.to_owned()),
            Self::QueryTooShort => QUERY_TOO_SHORT_MESSAGE.to_owned(),
            Self::Busy => BUSY_MESSAGE.to_owned(),
            Self::NotPermitted { .. } => NOT_PERMITTED_MESSAGE.to_owned(),
            Self::WrongMode { .. } => "Abra el formulario de edición para buscar".to_owned(),
            Self::Unsupported { .. } => "Esta operación no está disponible".to_owned(),
            Self::Stale => String::new(),
            Self::Api(error) => error.user_message(),
        }
    }
}

fn mode_name(mode: &FormMode) -> &'static str {
    mode.as_str()
}

fn invalid_count(errors: &FieldErrors) -> usize {
    errors.fields().len().max(errors.general().len())
}

/// Converts a store failure into a screen error. A 401 closes the session
/// here, so every caller logs out exactly once per rejected call.
pub(crate) fn surface(session: &dyn SessionContext, error: ApiError) -> ScreenError {
    if error.is_unauthorized() {
        log::warn!("store rejected the credential; closing session");
        session.logout();
    }
    ScreenError::Api(error)
}
