// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use fleetdesk_app::rules::value_text;
use fleetdesk_app::{FieldErrors, Record, Rule, is_blank};
use serde_json::Value;

pub const PASSWORD_MIN_CHARS: usize = 6;
pub const USERNAME_MIN_CHARS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeIssue {
    pub field: &'static str,
    pub message: String,
}

impl EmployeeIssue {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Checks an employee form and lists every problem in plain language. The
/// password is only demanded when `creating`.
pub fn employee_issues(form_data: &Record, creating: bool) -> Vec<EmployeeIssue> {
    let mut issues = Vec::new();
    let text = |field: &str| {
        form_data
            .get(field)
            .map(value_text)
            .unwrap_or_default()
            .trim()
            .to_owned()
    };
    let blank = |field: &str| form_data.get(field).is_none_or(is_blank);

    if blank("nombre") {
        issues.push(EmployeeIssue::new("nombre", "El nombre es obligatorio"));
    }
    if blank("apellido") {
        issues.push(EmployeeIssue::new("apellido", "El apellido es obligatorio"));
    }

    let email = text("email");
    if email.is_empty() {
        issues.push(EmployeeIssue::new(
            "email",
            "El correo electrónico es obligatorio",
        ));
    } else if !Rule::Email.accepts(&Value::from(email.as_str())) {
        issues.push(EmployeeIssue::new(
            "email",
            "El correo electrónico no tiene un formato válido",
        ));
    }

    let phone = text("telefono");
    if !phone.is_empty() && !Rule::Phone.accepts(&Value::from(phone.as_str())) {
        issues.push(EmployeeIssue::new("telefono", "El teléfono no es válido"));
    }

    let username = text("usuario");
    if username.is_empty() {
        issues.push(EmployeeIssue::new(
            "usuario",
            "El nombre de usuario es obligatorio",
        ));
    } else if username.chars().any(char::is_whitespace) {
        issues.push(EmployeeIssue::new(
            "usuario",
            "El nombre de usuario no puede contener espacios",
        ));
    } else if username.chars().count() < USERNAME_MIN_CHARS {
        issues.push(EmployeeIssue::new(
            "usuario",
            format!("El nombre de usuario debe tener al menos {USERNAME_MIN_CHARS} caracteres"),
        ));
    }

    // Not trimmed: leading or trailing spaces are part of a password.
    let password = form_data.get("password").map(value_text).unwrap_or_default();
    if password.is_empty() {
        if creating {
            issues.push(EmployeeIssue::new("password", "La contraseña es obligatoria"));
        }
    } else if password.chars().count() < PASSWORD_MIN_CHARS {
        issues.push(EmployeeIssue::new(
            "password",
            format!("La contraseña debe tener al menos {PASSWORD_MIN_CHARS} caracteres"),
        ));
    }

    if blank("rol") {
        issues.push(EmployeeIssue::new("rol", "Seleccione un rol"));
    }

    issues
}

/// Issues become general messages and, for screens that mark fields, the
/// first issue per field is also keyed by name.
pub fn issues_to_errors(issues: &[EmployeeIssue]) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for issue in issues {
        errors.push_general(issue.message.clone());
        errors.insert(issue.field, issue.message.clone());
    }
    errors
}
