// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::Value;

use crate::rules::value_text;
use crate::{ID_FIELD, Record, RecordId};

pub const MIN_QUERY_CHARS: usize = 2;
pub const QUERY_TOO_SHORT_MESSAGE: &str = "Ingrese al menos 2 caracteres para buscar";

/// Returns the trimmed query when it is long enough to send.
pub fn usable_query(query: &str) -> Option<&str> {
    let trimmed = query.trim();
    (trimmed.chars().count() >= MIN_QUERY_CHARS).then_some(trimmed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket {
    seq: u64,
    epoch: u64,
}

impl SearchTicket {
    pub fn seq(self) -> u64 {
        self.seq
    }

    pub fn epoch(self) -> u64 {
        self.epoch
    }
}

/// Numbers outgoing searches so that only the newest response is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchSequence {
    issued: u64,
}

impl SearchSequence {
    pub fn issue(&mut self, epoch: u64) -> SearchTicket {
        self.issued += 1;
        SearchTicket {
            seq: self.issued,
            epoch,
        }
    }

    pub fn is_latest(&self, ticket: SearchTicket) -> bool {
        ticket.seq == self.issued
    }
}

/// Copies the selected record into `form_data`. Only keys declared in
/// `initial_data` are taken; the record id is always copied, and a record
/// without one clears any id left from an earlier selection. Returns the id
/// that was copied, if the record had one.
pub fn copy_selection(
    initial_data: &Record,
    selected: &Record,
    form_data: &mut Record,
) -> Option<RecordId> {
    for key in initial_data.keys() {
        if let Some(value) = selected.get(key) {
            form_data.insert(key.clone(), value.clone());
        }
    }

    match selected.get(ID_FIELD).and_then(RecordId::from_value) {
        Some(id) => {
            form_data.insert(ID_FIELD.to_owned(), id.to_value());
            Some(id)
        }
        None => {
            match initial_data.get(ID_FIELD) {
                Some(default) => form_data.insert(ID_FIELD.to_owned(), default.clone()),
                None => form_data.remove(ID_FIELD),
            };
            None
        }
    }
}

/// Text shown for a result row in the selection list.
pub fn result_label(record: &Record, display_field: &str) -> String {
    let label = record
        .get(display_field)
        .map(value_text)
        .unwrap_or_default();
    match record.get(ID_FIELD).and_then(RecordId::from_value) {
        Some(id) if !label.is_empty() => format!("{label} (#{id})"),
        Some(id) => format!("#{id}"),
        None => label,
    }
}

/// Accepts either a bare array or a `{ "data": [...] }` envelope.
pub fn records_from_payload(payload: Value) -> Option<Vec<Record>> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(Value::Array(items)) => items,
            _ => return None,
        },
        _ => return None,
    };
    Some(
        items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(record) => Some(record),
                _ => None,
            })
            .collect(),
    )
}
