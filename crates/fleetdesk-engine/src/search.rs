// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use fleetdesk_api::{ApiError, ApiResult, Credential, RecordStore, SessionContext};
use fleetdesk_app::search::{SearchSequence, SearchTicket, copy_selection, usable_query};
use fleetdesk_app::{EntityConfiguration, FormMode, Record, RecordId, ScreenState};

use crate::error::{ScreenError, surface};

/// An issued search waiting for its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub ticket: SearchTicket,
    pub endpoint: String,
    pub query: String,
}

/// Drives the edit-mode lookup: query gating, sequencing so only the newest
/// response lands, and copying a chosen row into the form.
#[derive(Debug, Clone, Default)]
pub struct RemoteSearchController {
    sequence: SearchSequence,
}

impl RemoteSearchController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(
        &mut self,
        config: &EntityConfiguration,
        state: &mut ScreenState,
        query: &str,
    ) -> Result<SearchRequest, ScreenError> {
        if state.mode != FormMode::Edit {
            return Err(ScreenError::WrongMode {
                operation: "search",
                mode: state.mode,
            });
        }
        if state.form.loading {
            return Err(ScreenError::Busy);
        }
        state.form.search_query = query.to_owned();
        let Some(query) = usable_query(query) else {
            return Err(ScreenError::QueryTooShort);
        };

        let ticket = self.sequence.issue(state.epoch());
        log::debug!(
            "{} search #{} for {query:?}",
            config.entity_name,
            ticket.seq()
        );
        Ok(SearchRequest {
            ticket,
            endpoint: config.search_endpoint().to_owned(),
            query: query.to_owned(),
        })
    }

    /// Applies a response. Responses for anything but the newest request, or
    /// for a form that has since changed mode, are dropped as `Stale`.
    pub fn finish(
        &self,
        state: &mut ScreenState,
        session: &dyn SessionContext,
        request: &SearchRequest,
        result: ApiResult<Vec<Record>>,
    ) -> Result<usize, ScreenError> {
        if !self.sequence.is_latest(request.ticket) || !state.is_current(request.ticket.epoch()) {
            log::debug!(
                "discarding search #{} response for {:?}",
                request.ticket.seq(),
                request.query
            );
            return Err(ScreenError::Stale);
        }

        let results = result.map_err(|error| surface(session, error))?;
        let count = results.len();
        state.form.search_results = results;
        state.form.modal_open = true;
        Ok(count)
    }

    pub fn run(
        &mut self,
        config: &EntityConfiguration,
        state: &mut ScreenState,
        store: &dyn RecordStore,
        session: &dyn SessionContext,
        query: &str,
    ) -> Result<usize, ScreenError> {
        let request = self.begin(config, state, query)?;
        let result = send(store, session.credential(), &request);
        self.finish(state, session, &request, result)
    }

    /// Copies result `index` into the form and closes the selection surface.
    pub fn select(
        &self,
        config: &EntityConfiguration,
        state: &mut ScreenState,
        index: usize,
    ) -> Option<RecordId> {
        let selected = state.form.search_results.get(index)?.clone();
        let id = copy_selection(&config.initial_data, &selected, &mut state.form.form_data);
        state.form.errors.clear();
        close(state);
        id
    }
}

pub fn send(
    store: &dyn RecordStore,
    credential: Option<Credential>,
    request: &SearchRequest,
) -> ApiResult<Vec<Record>> {
    let credential = credential.ok_or(ApiError::Unauthorized)?;
    store.search(&credential, &request.endpoint, &request.query)
}

/// Clears query and results; form data is left alone.
pub fn close(state: &mut ScreenState) {
    state.form.clear_search();
}
