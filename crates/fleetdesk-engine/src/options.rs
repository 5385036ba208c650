// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use fleetdesk_api::{ApiError, RecordStore, SessionContext};
use fleetdesk_app::rules::value_text;
use fleetdesk_app::{EntityConfiguration, MaterializedConfiguration, SelectOption};

use crate::error::surface;

/// A dynamic field whose options could not be fetched. The field keeps its
/// configured placeholder options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionWarning {
    pub field: String,
    pub endpoint: String,
    pub error: ApiError,
}

impl OptionWarning {
    pub fn message(&self) -> String {
        format!(
            "No se pudieron cargar las opciones de {}: {}",
            self.field,
            self.error.user_message()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub materialized: MaterializedConfiguration,
    pub warnings: Vec<OptionWarning>,
}

/// Builds the per-screen copy of `config` with every dynamic field's options
/// fetched from the store. Failures never abort: the failing field keeps its
/// placeholders and a warning is returned alongside the copy. A rejected
/// credential closes the session once; later fields are not fetched.
pub fn resolve(
    config: &EntityConfiguration,
    store: &dyn RecordStore,
    session: &dyn SessionContext,
) -> Resolution {
    let mut materialized = MaterializedConfiguration::from_canonical(config);
    let mut warnings = Vec::new();
    let mut credential = session.credential();

    for field in config.fields.iter().filter(|field| field.dynamic) {
        let Some(endpoint) = field
            .options_endpoint
            .as_deref()
            .or(config.endpoints.categories.as_deref())
        else {
            continue;
        };

        let sent = credential.is_some();
        let fetched = match credential.as_ref() {
            Some(credential) => store.fetch_options(credential, endpoint),
            None => Err(ApiError::Unauthorized),
        };
        if sent && fetched.as_ref().is_err_and(ApiError::is_unauthorized) {
            surface(session, ApiError::Unauthorized);
            credential = None;
        }

        match fetched {
            Ok(options) => {
                log::debug!(
                    "{}.{}: {} option(s) from {endpoint}",
                    config.entity_name,
                    field.name,
                    options.len()
                );
                materialized.set_options(&field.name, merge_placeholders(&field.options, options));
            }
            Err(error) => {
                log::warn!(
                    "{}.{}: options from {endpoint} unavailable, keeping placeholders: {error}",
                    config.entity_name,
                    field.name
                );
                warnings.push(OptionWarning {
                    field: field.name.clone(),
                    endpoint: endpoint.to_owned(),
                    error,
                });
            }
        }
    }

    Resolution {
        materialized,
        warnings,
    }
}

/// Placeholder entries are the configured options with a blank value; they
/// stay at the head of the list.
fn merge_placeholders(
    configured: &[SelectOption],
    fetched: Vec<SelectOption>,
) -> Vec<SelectOption> {
    configured
        .iter()
        .filter(|option| value_text(&option.value).trim().is_empty())
        .cloned()
        .chain(fetched)
        .collect()
}
