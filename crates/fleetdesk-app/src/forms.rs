// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::Value;
use std::collections::BTreeMap;

use crate::{EntityConfiguration, ID_FIELD, Record, RecordId, ValidationMode};

/// Field-keyed error messages plus free-form messages that belong to the
/// form as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    fields: BTreeMap<String, String>,
    general: Vec<String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: BTreeMap<String, String>) -> Self {
        Self {
            fields,
            general: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.general.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn general(&self) -> &[String] {
        &self.general
    }

    /// Keeps the first message recorded for a field.
    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_owned())
            .or_insert_with(|| message.into());
    }

    pub fn push_general(&mut self, message: impl Into<String>) {
        self.general.push(message.into());
    }

    pub fn remove(&mut self, field: &str) -> bool {
        self.fields.remove(field).is_some()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
        self.general.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    Committed,
    /// The live filter refused the candidate; the stored value is unchanged.
    Rejected,
    UnknownField,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub form_data: Record,
    pub errors: FieldErrors,
    pub loading: bool,
    pub search_query: String,
    pub search_results: Vec<Record>,
    pub modal_open: bool,
}

impl FormState {
    pub fn new(config: &EntityConfiguration) -> Self {
        Self {
            form_data: config.blank_form(),
            errors: FieldErrors::new(),
            loading: false,
            search_query: String::new(),
            search_results: Vec::new(),
            modal_open: false,
        }
    }

    pub fn reset(&mut self, config: &EntityConfiguration) {
        *self = Self::new(config);
    }

    pub fn clear_search(&mut self) {
        self.search_query.clear();
        self.search_results.clear();
        self.modal_open = false;
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.form_data.get(ID_FIELD).and_then(RecordId::from_value)
    }

    /// Replaces form data wholesale, back-filling any key from
    /// `initial_data` the new mapping lacks.
    pub fn replace_form_data(&mut self, config: &EntityConfiguration, data: Record) {
        let mut merged = config.blank_form();
        for (key, value) in data {
            merged.insert(key, value);
        }
        self.form_data = merged;
    }

    /// Runs the live filter for `field` and commits `candidate` when it
    /// passes. A committed edit drops any outstanding error on that field.
    pub fn apply_input(
        &mut self,
        config: &EntityConfiguration,
        field: &str,
        candidate: Value,
    ) -> InputOutcome {
        if !config.initial_data.contains_key(field) {
            return InputOutcome::UnknownField;
        }
        if !live_accepts(config, field, &candidate) {
            return InputOutcome::Rejected;
        }

        self.form_data.insert(field.to_owned(), candidate);
        self.errors.remove(field);
        InputOutcome::Committed
    }
}

pub fn live_accepts(config: &EntityConfiguration, field: &str, candidate: &Value) -> bool {
    if config.validation_mode == ValidationMode::Permissive {
        return true;
    }
    config
        .live_validations
        .get(field)
        .is_none_or(|rule| rule.accepts(candidate))
}

/// Submit-time validation. Required fields that are blank always fail with
/// `"<label> es obligatorio"`; declared validations add their own messages.
pub fn validate_strict(config: &EntityConfiguration, form_data: &Record) -> FieldErrors {
    let mut errors = FieldErrors::new();

    for field in config.fields.iter().filter(|field| field.required) {
        if form_data.get(&field.name).is_none_or(is_blank) {
            errors.insert(
                &field.name,
                format!("{} es obligatorio", field.display_label()),
            );
        }
    }

    if config.validation_mode == ValidationMode::Permissive {
        return errors;
    }

    for (name, validation) in &config.validations {
        let value = form_data.get(name).unwrap_or(&Value::Null);
        if !validation.rule.accepts(value) {
            let message = validation
                .message
                .clone()
                .unwrap_or_else(|| format!("{} no es válido", config.label_for(name)));
            errors.insert(name, message);
        }
    }

    errors
}

pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Bool(_) | Value::Number(_) | Value::Object(_) => false,
    }
}
