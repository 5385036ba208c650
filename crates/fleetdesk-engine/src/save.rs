// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use fleetdesk_api::{ApiError, ApiResult, Credential, RecordStore, SessionContext, endpoint_for_id};
use fleetdesk_app::{
    EntityConfiguration, FieldErrors, ID_FIELD, MessageKind, ModeCommand, Record, RecordId,
    ScreenState, UpdateMethod,
};
use serde_json::Value;

use crate::error::{ScreenError, surface};

/// The single store call a submission turns into.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveRequest {
    Create {
        endpoint: String,
        payload: Record,
    },
    Update {
        id: RecordId,
        endpoint: String,
        method: UpdateMethod,
        payload: Record,
    },
}

impl SaveRequest {
    /// Picks update when `form_data.id` is truthy, create otherwise. Creates
    /// never carry the `id` key.
    pub fn plan(config: &EntityConfiguration, form_data: &Record) -> Self {
        match form_data.get(ID_FIELD).and_then(RecordId::from_value) {
            Some(id) => Self::Update {
                endpoint: endpoint_for_id(&config.endpoints.update, &id),
                method: config.endpoints.update_method,
                payload: form_data.clone(),
                id,
            },
            None => {
                let mut payload = form_data.clone();
                payload.remove(ID_FIELD);
                Self::Create {
                    endpoint: config.endpoints.create.clone(),
                    payload,
                }
            }
        }
    }

    pub fn is_update(&self) -> bool {
        matches!(self, Self::Update { .. })
    }

    pub fn payload(&self) -> &Record {
        match self {
            Self::Create { payload, .. } | Self::Update { payload, .. } => payload,
        }
    }

    pub fn payload_mut(&mut self) -> &mut Record {
        match self {
            Self::Create { payload, .. } | Self::Update { payload, .. } => payload,
        }
    }

    fn success_kind(&self) -> MessageKind {
        if self.is_update() {
            MessageKind::Updated
        } else {
            MessageKind::Created
        }
    }
}

/// A submission in flight, bound to the epoch it started in.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveTicket {
    epoch: u64,
    request: SaveRequest,
}

impl SaveTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub kind: MessageKind,
    pub message: String,
    pub response: Value,
}

/// Claims the loading flag for `request`. Local errors block the call.
pub fn begin(
    state: &mut ScreenState,
    errors: FieldErrors,
    request: SaveRequest,
) -> Result<SaveTicket, ScreenError> {
    if state.form.loading {
        return Err(ScreenError::Busy);
    }
    if !errors.is_empty() {
        state.form.errors = errors.clone();
        return Err(ScreenError::Validation { errors });
    }

    state.form.errors.clear();
    state.form.loading = true;
    Ok(SaveTicket {
        epoch: state.epoch(),
        request,
    })
}

pub fn send(
    store: &dyn RecordStore,
    credential: Option<Credential>,
    ticket: &SaveTicket,
) -> ApiResult<Value> {
    let credential = credential.ok_or(ApiError::Unauthorized)?;
    match &ticket.request {
        SaveRequest::Create { endpoint, payload } => store.create(&credential, endpoint, payload),
        SaveRequest::Update {
            endpoint,
            method,
            payload,
            ..
        } => store.update(&credential, endpoint, *method, payload),
    }
}

/// Applies the store's answer. Success resets the form and closes it; a
/// failure leaves the form editable with any server field errors attached.
pub fn finish(
    config: &EntityConfiguration,
    state: &mut ScreenState,
    session: &dyn SessionContext,
    ticket: SaveTicket,
    result: ApiResult<Value>,
) -> Result<SaveOutcome, ScreenError> {
    if !state.is_current(ticket.epoch) {
        log::debug!(
            "{}: dropping save response from epoch {}",
            config.entity_name,
            ticket.epoch
        );
        return Err(ScreenError::Stale);
    }
    state.form.loading = false;

    match result {
        Ok(response) => {
            let kind = ticket.request.success_kind();
            log::info!(
                "{} {}",
                config.entity_name,
                if kind == MessageKind::Updated {
                    "updated"
                } else {
                    "created"
                }
            );
            state.dispatch(config, ModeCommand::Close);
            Ok(SaveOutcome {
                kind,
                message: config.message(kind),
                response,
            })
        }
        Err(error) => {
            if let Some(fields) = error.field_errors() {
                state.form.errors = FieldErrors::from_fields(fields.clone());
            }
            log::warn!("{} save failed: {error}", config.entity_name);
            Err(surface(session, error))
        }
    }
}

pub fn run(
    config: &EntityConfiguration,
    state: &mut ScreenState,
    store: &dyn RecordStore,
    session: &dyn SessionContext,
    errors: FieldErrors,
    request: SaveRequest,
) -> Result<SaveOutcome, ScreenError> {
    let ticket = begin(state, errors, request)?;
    let result = send(store, session.credential(), &ticket);
    finish(config, state, session, ticket, result)
}

/// Posts to `endpoints.deactivate` for `id`. When the open form holds that
/// record it is closed afterwards.
pub fn deactivate(
    config: &EntityConfiguration,
    state: &mut ScreenState,
    store: &dyn RecordStore,
    session: &dyn SessionContext,
    id: &RecordId,
) -> Result<String, ScreenError> {
    let Some(template) = config.endpoints.deactivate.as_deref() else {
        return Err(ScreenError::Unsupported {
            entity: config.entity_name.clone(),
            endpoint: "deactivate",
        });
    };
    if state.form.loading {
        return Err(ScreenError::Busy);
    }

    let endpoint = endpoint_for_id(template, id);
    state.form.loading = true;
    let result = match session.credential() {
        Some(credential) => store.deactivate(&credential, &endpoint),
        None => Err(ApiError::Unauthorized),
    };
    state.form.loading = false;
    result.map_err(|error| surface(session, error))?;

    log::info!("{} {id} deactivated", config.entity_name);
    if state.form.record_id().as_ref() == Some(id) {
        state.dispatch(config, ModeCommand::Close);
    }
    Ok(config.message(MessageKind::Deactivated))
}
