// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use fleetdesk_api::{RecordStore, SessionContext};
use fleetdesk_app::{
    EntityConfiguration, EntityKind, FieldErrors, InputOutcome, MaterializedConfiguration,
    Record, RecordId, ScreenState, is_blank, validate_strict,
};
use serde_json::Value;

use crate::employee::{employee_issues, issues_to_errors};
use crate::error::ScreenError;
use crate::save::{self, SaveOutcome, SaveRequest};

pub const MANAGER_ROLE: &str = "gerente";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Search,
    Deactivate,
}

impl Operation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Search => "search",
            Self::Deactivate => "deactivate",
        }
    }
}

/// Remote store and caller identity, handed to every call that may leave
/// the process.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub store: &'a dyn RecordStore,
    pub session: &'a dyn SessionContext,
}

/// Working configuration plus the state of the form built from it.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityForm {
    pub config: MaterializedConfiguration,
    pub state: ScreenState,
}

impl EntityForm {
    pub fn new(config: MaterializedConfiguration) -> Self {
        let state = ScreenState::new(config.config());
        Self { config, state }
    }

    pub fn creating(&self) -> bool {
        self.state.form.record_id().is_none()
    }
}

/// One record type's rules for editing and saving. Every screen talks to
/// this shape whatever the entity kind.
pub trait EntityRecordStrategy {
    fn kind(&self) -> EntityKind;

    fn form(&self) -> &EntityForm;

    fn form_mut(&mut self) -> &mut EntityForm;

    /// Gate run before every store call.
    fn authorize(
        &self,
        session: &dyn SessionContext,
        operation: Operation,
    ) -> Result<(), ScreenError>;

    /// Submit-time errors for the current form data.
    fn collect_errors(&self) -> FieldErrors;

    fn prepare(&self, _request: &mut SaveRequest) {}

    fn config(&self) -> &EntityConfiguration {
        self.form().config.config()
    }

    fn form_data(&self) -> &Record {
        &self.form().state.form.form_data
    }

    fn set_form_data(&mut self, data: Record) {
        let EntityForm { config, state } = self.form_mut();
        state.form.replace_form_data(config.config(), data);
    }

    fn errors(&self) -> &FieldErrors {
        &self.form().state.form.errors
    }

    fn loading(&self) -> bool {
        self.form().state.form.loading
    }

    fn handle_input_change(&mut self, field: &str, value: Value) -> InputOutcome {
        let EntityForm { config, state } = self.form_mut();
        state.form.apply_input(config.config(), field, value)
    }

    /// Back to `initial_data` without leaving the current mode.
    fn reset_form(&mut self) {
        let EntityForm { config, state } = self.form_mut();
        state.form.reset(config.config());
    }

    fn validate_form(&mut self) -> bool {
        let errors = self.collect_errors();
        let valid = errors.is_empty();
        self.form_mut().state.form.errors = errors;
        valid
    }

    fn save_entity(
        &mut self,
        collaborators: Collaborators<'_>,
    ) -> Result<SaveOutcome, ScreenError> {
        let mut request = SaveRequest::plan(self.config(), self.form_data());
        let operation = if request.is_update() {
            Operation::Update
        } else {
            Operation::Create
        };
        self.authorize(collaborators.session, operation)?;

        let errors = self.collect_errors();
        self.prepare(&mut request);
        let EntityForm { config, state } = self.form_mut();
        save::run(
            config.config(),
            state,
            collaborators.store,
            collaborators.session,
            errors,
            request,
        )
    }

    fn deactivate(
        &mut self,
        collaborators: Collaborators<'_>,
        id: &RecordId,
    ) -> Result<String, ScreenError> {
        self.authorize(collaborators.session, Operation::Deactivate)?;
        let EntityForm { config, state } = self.form_mut();
        save::deactivate(
            config.config(),
            state,
            collaborators.store,
            collaborators.session,
            id,
        )
    }
}

/// Configuration-driven path shared by every ordinary entity.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericStrategy {
    form: EntityForm,
}

impl GenericStrategy {
    pub fn new(config: MaterializedConfiguration) -> Self {
        Self {
            form: EntityForm::new(config),
        }
    }
}

impl EntityRecordStrategy for GenericStrategy {
    fn kind(&self) -> EntityKind {
        EntityKind::Standard
    }

    fn form(&self) -> &EntityForm {
        &self.form
    }

    fn form_mut(&mut self) -> &mut EntityForm {
        &mut self.form
    }

    fn authorize(
        &self,
        _session: &dyn SessionContext,
        _operation: Operation,
    ) -> Result<(), ScreenError> {
        Ok(())
    }

    fn collect_errors(&self) -> FieldErrors {
        validate_strict(self.config(), self.form_data())
    }
}

/// Employee records: manager-only, with their own validator.
#[derive(Debug, Clone, PartialEq)]
pub struct PrivilegedEmployeeStrategy {
    form: EntityForm,
}

impl PrivilegedEmployeeStrategy {
    pub fn new(config: MaterializedConfiguration) -> Self {
        Self {
            form: EntityForm::new(config),
        }
    }
}

impl EntityRecordStrategy for PrivilegedEmployeeStrategy {
    fn kind(&self) -> EntityKind {
        EntityKind::Employee
    }

    fn form(&self) -> &EntityForm {
        &self.form
    }

    fn form_mut(&mut self) -> &mut EntityForm {
        &mut self.form
    }

    fn authorize(
        &self,
        session: &dyn SessionContext,
        operation: Operation,
    ) -> Result<(), ScreenError> {
        if session.has_role(MANAGER_ROLE) {
            return Ok(());
        }
        log::warn!(
            "{} {} denied: caller lacks the {MANAGER_ROLE} role",
            self.config().entity_name,
            operation.as_str()
        );
        Err(ScreenError::NotPermitted {
            operation: operation.as_str(),
            role: MANAGER_ROLE,
        })
    }

    /// Plain-language issues first; any other required field the
    /// configuration declares falls back to the baseline message.
    fn collect_errors(&self) -> FieldErrors {
        let mut errors = issues_to_errors(&employee_issues(
            self.form_data(),
            self.form.creating(),
        ));
        for (field, message) in validate_strict(self.config(), self.form_data()).fields() {
            errors.insert(field, message.clone());
        }
        errors
    }

    /// An untouched password on edit means "keep the current one".
    fn prepare(&self, request: &mut SaveRequest) {
        if !request.is_update() {
            return;
        }
        let payload = request.payload_mut();
        if payload.get("password").is_some_and(is_blank) {
            payload.remove("password");
        }
    }
}

/// Picks the strategy for a configuration's declared kind.
pub fn strategy_for(config: MaterializedConfiguration) -> Box<dyn EntityRecordStrategy> {
    match config.config().kind {
        EntityKind::Standard => Box::new(GenericStrategy::new(config)),
        EntityKind::Employee => Box::new(PrivilegedEmployeeStrategy::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::{Collaborators, EntityRecordStrategy, Operation, strategy_for};
    use crate::error::ScreenError;
    use anyhow::Result;
    use fleetdesk_api::ApiError;
    use fleetdesk_app::catalog::builtin_names;
    use fleetdesk_app::{
        EntityKind, InputOutcome, MaterializedConfiguration, ModeCommand, RecordId,
    };
    use fleetdesk_testkit::{FleetFaker, RecordingSession, ScriptedStore, StoreCall, builtin_config};
    use serde_json::json;

    fn strategy(name: &str) -> Result<Box<dyn EntityRecordStrategy>> {
        let config = builtin_config(name)?;
        let mut strategy = strategy_for(MaterializedConfiguration::from_canonical(&config));
        let form = strategy.form_mut();
        form.state.dispatch(form.config.config(), ModeCommand::OpenNew);
        Ok(strategy)
    }

    #[test]
    fn kind_selects_the_implementation() -> Result<()> {
        assert_eq!(strategy("clientes")?.kind(), EntityKind::Standard);
        assert_eq!(strategy("empleados")?.kind(), EntityKind::Employee);
        Ok(())
    }

    #[test]
    fn required_fields_block_the_network_for_every_entity() -> Result<()> {
        let store = ScriptedStore::new();
        let session = RecordingSession::manager();
        let collaborators = Collaborators {
            store: &store,
            session: &session,
        };

        for name in builtin_names() {
            let mut strategy = strategy(name)?;
            let config = strategy.config().clone();
            for field in config.fields.iter().filter(|field| field.required) {
                let mut data = config.initial_data.clone();
                data.insert(field.name.clone(), json!(""));
                strategy.set_form_data(data);

                let error = strategy
                    .save_entity(collaborators)
                    .expect_err("blank required field should fail");
                assert!(matches!(error, ScreenError::Validation { .. }));
                assert!(
                    strategy.errors().contains(&field.name),
                    "{name}.{} should be reported",
                    field.name
                );
            }
        }
        assert_eq!(store.call_count(), 0);
        Ok(())
    }

    #[test]
    fn input_changes_go_through_the_live_filter() -> Result<()> {
        let mut strategy = strategy("clientes")?;
        assert_eq!(
            strategy.handle_input_change("telefono", json!("55")),
            InputOutcome::Committed
        );
        assert_eq!(
            strategy.handle_input_change("telefono", json!("55x")),
            InputOutcome::Rejected
        );
        assert_eq!(strategy.form_data()["telefono"], json!("55"));

        strategy.reset_form();
        assert_eq!(strategy.form_data(), &strategy.config().initial_data);
        Ok(())
    }

    #[test]
    fn generic_strategy_never_checks_roles() -> Result<()> {
        let strategy = strategy("clientes")?;
        let session = RecordingSession::unknown_role();
        for operation in [
            Operation::Create,
            Operation::Update,
            Operation::Search,
            Operation::Deactivate,
        ] {
            assert!(strategy.authorize(&session, operation).is_ok());
        }
        Ok(())
    }

    #[test]
    fn employee_operations_fail_closed_without_manager_role() -> Result<()> {
        let store = ScriptedStore::new();
        let mut faker = FleetFaker::new(5);

        for session in [RecordingSession::operator(), RecordingSession::unknown_role()] {
            let collaborators = Collaborators {
                store: &store,
                session: &session,
            };
            let mut strategy = strategy("empleados")?;
            let mut employee = faker.employee();
            employee.insert("password".to_owned(), json!("secreto1"));
            strategy.set_form_data(employee);

            let error = strategy
                .save_entity(collaborators)
                .expect_err("non-managers cannot save");
            assert_eq!(
                error,
                ScreenError::NotPermitted {
                    operation: "update",
                    role: "gerente",
                }
            );
            let error = strategy
                .deactivate(collaborators, &RecordId::Int(1))
                .expect_err("non-managers cannot deactivate");
            assert!(matches!(error, ScreenError::NotPermitted { .. }));
            assert!(strategy.authorize(&session, Operation::Search).is_err());
        }
        assert_eq!(store.call_count(), 0);
        Ok(())
    }

    #[test]
    fn employee_validation_stores_issues_both_ways() -> Result<()> {
        let mut strategy = strategy("empleados")?;
        assert!(!strategy.validate_form());
        let errors = strategy.errors();
        assert!(errors.general().contains(&"La contraseña es obligatoria".to_owned()));
        assert_eq!(errors.get("password"), Some("La contraseña es obligatoria"));
        assert_eq!(errors.get("nombre"), Some("El nombre es obligatorio"));
        Ok(())
    }

    #[test]
    fn employee_update_without_password_keeps_the_current_one() -> Result<()> {
        let store = ScriptedStore::new();
        let session = RecordingSession::manager();
        let collaborators = Collaborators {
            store: &store,
            session: &session,
        };
        let mut strategy = strategy("empleados")?;
        let mut employee = FleetFaker::new(9).employee();
        employee.insert("password".to_owned(), json!(""));
        strategy.set_form_data(employee);

        let outcome = strategy.save_entity(collaborators)?;
        assert_eq!(outcome.message, "Empleado actualizado correctamente");
        match &store.calls()[..] {
            [StoreCall::Update { endpoint, payload, .. }] => {
                assert_eq!(endpoint, "/empleados/1");
                assert!(!payload.contains_key("password"));
            }
            other => panic!("expected one update, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn employee_create_requires_password_then_succeeds() -> Result<()> {
        let store = ScriptedStore::new();
        let session = RecordingSession::manager();
        let collaborators = Collaborators {
            store: &store,
            session: &session,
        };
        let mut strategy = strategy("empleados")?;
        let mut employee = FleetFaker::new(9).employee();
        employee.remove("id");
        strategy.set_form_data(employee.clone());

        let error = strategy
            .save_entity(collaborators)
            .expect_err("new employees need a password");
        assert_eq!(error.user_message(), "La contraseña es obligatoria");

        strategy.handle_input_change("password", json!("secreto1"));
        strategy.save_entity(collaborators)?;
        assert!(matches!(store.calls().as_slice(), [StoreCall::Create { .. }]));
        Ok(())
    }

    #[test]
    fn unauthorized_save_logs_out_exactly_once() -> Result<()> {
        let store = ScriptedStore::new();
        store.push_write(Err(ApiError::Unauthorized));
        let session = RecordingSession::manager();
        let collaborators = Collaborators {
            store: &store,
            session: &session,
        };
        let mut strategy = strategy("proveedores")?;
        let config = strategy.config().clone();
        for field in config.fields.iter().filter(|field| field.required) {
            strategy.handle_input_change(&field.name, json!("Refacciones Sierra"));
        }

        let error = strategy
            .save_entity(collaborators)
            .expect_err("401 should fail");
        assert_eq!(error, ScreenError::Api(ApiError::Unauthorized));
        assert_eq!(session.logout_count(), 1);
        assert_eq!(store.call_count(), 1);
        Ok(())
    }
}
