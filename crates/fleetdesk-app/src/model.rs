// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::rules::Rule;

/// Field name -> value mapping used for defaults, form data, and raw records.
pub type Record = serde_json::Map<String, Value>;

pub const ID_FIELD: &str = "id";
const ENTITY_PLACEHOLDER: &str = "{entity}";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    #[default]
    Standard,
    Employee,
}

impl EntityKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Employee => "employee",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    #[default]
    Strict,
    /// Only the required-field baseline runs; live filters and custom
    /// validations are skipped.
    Permissive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormMode {
    None,
    New,
    Edit,
}

impl FormMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::New => "new",
            Self::Edit => "edit",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(Self::None),
            "new" => Some(Self::New),
            "edit" => Some(Self::Edit),
            _ => None,
        }
    }

    pub const fn is_open(self) -> bool {
        matches!(self, Self::New | Self::Edit)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    #[default]
    Text,
    Textarea,
    Email,
    Tel,
    Number,
    Date,
    Select,
    Checkbox,
    Password,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: Value,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: Option<String>,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<SelectOption>,
    #[serde(default)]
    pub dynamic: bool,
    pub options_endpoint: Option<String>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub min: Option<f64>,
    pub step: Option<f64>,
}

impl FieldDescriptor {
    /// Label shown next to the field; falls back to the upper-cased name.
    pub fn display_label(&self) -> String {
        match &self.label {
            Some(label) if !label.trim().is_empty() => label.clone(),
            _ => self.name.to_uppercase(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    pub rule: Rule,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMethod {
    #[default]
    Put,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub create: String,
    pub update: String,
    pub search: String,
    pub categories: Option<String>,
    pub deactivate: Option<String>,
    #[serde(default)]
    pub update_method: UpdateMethod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub create_success: String,
    pub update_success: String,
    pub deactivate_success: String,
    pub error: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            create_success: "{entity} creado correctamente".to_owned(),
            update_success: "{entity} actualizado correctamente".to_owned(),
            deactivate_success: "{entity} desactivado correctamente".to_owned(),
            error: "Error al guardar {entity}".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Buttons {
    pub new: String,
    pub edit: String,
    pub create: String,
    pub update: String,
    pub cancel: String,
    pub search: String,
}

impl Default for Buttons {
    fn default() -> Self {
        Self {
            new: "Nuevo".to_owned(),
            edit: "Editar".to_owned(),
            create: "Guardar".to_owned(),
            update: "Actualizar".to_owned(),
            cancel: "Cancelar".to_owned(),
            search: "Buscar".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormTitles {
    pub new: String,
    pub edit: String,
}

impl Default for FormTitles {
    fn default() -> Self {
        Self {
            new: "Nuevo {entity}".to_owned(),
            edit: "Editar {entity}".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub endpoint: Option<String>,
    #[serde(default)]
    pub placeholder: String,
    pub display_field: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Created,
    Updated,
    Deactivated,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityConfiguration {
    pub entity_name: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub kind: EntityKind,
    #[serde(default)]
    pub validation_mode: ValidationMode,
    pub initial_data: Record,
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub live_validations: BTreeMap<String, Rule>,
    #[serde(default)]
    pub validations: BTreeMap<String, Validation>,
    pub endpoints: Endpoints,
    #[serde(default)]
    pub messages: Messages,
    #[serde(default)]
    pub buttons: Buttons,
    #[serde(default)]
    pub form_titles: FormTitles,
    pub search: SearchConfig,
}

impl EntityConfiguration {
    pub fn from_toml_str(raw: &str, origin: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).with_context(|| format!("parse entity configuration {origin}"))?;
        config
            .validate()
            .with_context(|| format!("invalid entity configuration {origin}"))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.entity_name.trim().is_empty() {
            bail!("entity_name must not be empty");
        }
        if self.endpoints.create.trim().is_empty() || self.endpoints.update.trim().is_empty() {
            bail!(
                "{} endpoints.create and endpoints.update are required",
                self.entity_name
            );
        }

        let mut seen = BTreeSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                bail!("{} declares field {:?} twice", self.entity_name, field.name);
            }
            if !self.initial_data.contains_key(&field.name) {
                bail!(
                    "{} field {:?} is missing from initial_data -- add a default value for it",
                    self.entity_name,
                    field.name
                );
            }
            if field.dynamic
                && field.options_endpoint.is_none()
                && self.endpoints.categories.is_none()
            {
                bail!(
                    "{} field {:?} is dynamic but neither options_endpoint nor endpoints.categories is set",
                    self.entity_name,
                    field.name
                );
            }
        }

        for name in self.live_validations.keys().chain(self.validations.keys()) {
            if !self.initial_data.contains_key(name) {
                bail!(
                    "{} has a validation for undeclared field {:?}",
                    self.entity_name,
                    name
                );
            }
        }

        if self.search.display_field.trim().is_empty() {
            bail!("{} search.display_field must not be empty", self.entity_name);
        }
        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn label_for(&self, name: &str) -> String {
        self.field(name)
            .map(FieldDescriptor::display_label)
            .unwrap_or_else(|| name.to_uppercase())
    }

    pub fn search_endpoint(&self) -> &str {
        self.search
            .endpoint
            .as_deref()
            .unwrap_or(&self.endpoints.search)
    }

    pub fn blank_form(&self) -> Record {
        self.initial_data.clone()
    }

    pub fn message(&self, kind: MessageKind) -> String {
        let template = match kind {
            MessageKind::Created => &self.messages.create_success,
            MessageKind::Updated => &self.messages.update_success,
            MessageKind::Deactivated => &self.messages.deactivate_success,
            MessageKind::Failed => &self.messages.error,
        };
        self.render(template)
    }

    pub fn form_title(&self, mode: FormMode) -> Option<String> {
        match mode {
            FormMode::None => None,
            FormMode::New => Some(self.render(&self.form_titles.new)),
            FormMode::Edit => Some(self.render(&self.form_titles.edit)),
        }
    }

    fn render(&self, template: &str) -> String {
        template.replace(ENTITY_PLACEHOLDER, &self.title)
    }
}

/// Per-session copy of a configuration whose dynamic fields carry fetched
/// option lists. The canonical configuration it was cloned from is left alone.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedConfiguration {
    config: EntityConfiguration,
}

impl MaterializedConfiguration {
    pub fn from_canonical(config: &EntityConfiguration) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &EntityConfiguration {
        &self.config
    }

    pub fn options_for(&self, field: &str) -> Option<&[SelectOption]> {
        self.config.field(field).map(|field| field.options.as_slice())
    }

    /// Replaces the options of `field`. Returns `false` when no such field
    /// exists.
    pub fn set_options(&mut self, field: &str, options: Vec<SelectOption>) -> bool {
        match self
            .config
            .fields
            .iter_mut()
            .find(|descriptor| descriptor.name == field)
        {
            Some(descriptor) => {
                descriptor.options = options;
                true
            }
            None => false,
        }
    }
}
