// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use fleetdesk_api::{RecordStore, SessionContext};
use fleetdesk_app::search::result_label;
use fleetdesk_app::{
    EntityConfiguration, FieldErrors, FormMode, InputOutcome, ModeCommand, ModeEvent, Record,
    RecordId,
};
use serde_json::Value;

use crate::error::ScreenError;
use crate::options::{OptionWarning, resolve};
use crate::save::SaveOutcome;
use crate::search::{self, RemoteSearchController};
use crate::strategy::{
    Collaborators, EntityForm, EntityRecordStrategy, Operation, strategy_for,
};

pub const SWITCH_MODE_MESSAGE: &str = "Cierre el formulario actual antes de cambiar de modo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "ok",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A message for the person at the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// One entity's management surface: options, mode, form, search and save,
/// wired to a record store and a session for its whole lifetime.
pub struct ManagementScreen<'a> {
    canonical: EntityConfiguration,
    strategy: Box<dyn EntityRecordStrategy>,
    search: RemoteSearchController,
    collaborators: Collaborators<'a>,
    warnings: Vec<OptionWarning>,
    notices: Vec<Notice>,
}

impl<'a> ManagementScreen<'a> {
    /// Resolves dynamic options and builds the strategy for the
    /// configuration's kind. Option failures become warnings, never errors.
    pub fn open(
        config: &EntityConfiguration,
        store: &'a dyn RecordStore,
        session: &'a dyn SessionContext,
    ) -> Self {
        let resolution = resolve(config, store, session);
        let mut screen = Self {
            canonical: config.clone(),
            strategy: strategy_for(resolution.materialized),
            search: RemoteSearchController::new(),
            collaborators: Collaborators { store, session },
            warnings: Vec::new(),
            notices: Vec::new(),
        };
        screen.record_warnings(resolution.warnings);
        screen
    }

    /// Re-fetches dynamic options. The form in progress is kept.
    pub fn reload_options(&mut self) -> &[OptionWarning] {
        let resolution = resolve(
            &self.canonical,
            self.collaborators.store,
            self.collaborators.session,
        );
        self.strategy.form_mut().config = resolution.materialized;
        self.record_warnings(resolution.warnings);
        &self.warnings
    }

    pub fn config(&self) -> &EntityConfiguration {
        self.strategy.config()
    }

    pub fn strategy(&self) -> &dyn EntityRecordStrategy {
        self.strategy.as_ref()
    }

    pub fn mode(&self) -> FormMode {
        self.strategy.form().state.mode
    }

    pub fn form_title(&self) -> Option<String> {
        self.config().form_title(self.mode())
    }

    pub fn form_data(&self) -> &Record {
        self.strategy.form_data()
    }

    pub fn errors(&self) -> &FieldErrors {
        self.strategy.errors()
    }

    pub fn loading(&self) -> bool {
        self.strategy.loading()
    }

    pub fn warnings(&self) -> &[OptionWarning] {
        &self.warnings
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn open_new(&mut self) -> Vec<ModeEvent> {
        self.dispatch(ModeCommand::OpenNew)
    }

    pub fn open_edit(&mut self) -> Vec<ModeEvent> {
        self.dispatch(ModeCommand::OpenEdit)
    }

    pub fn cancel(&mut self) -> Vec<ModeEvent> {
        self.dispatch(ModeCommand::Close)
    }

    pub fn input(&mut self, field: &str, value: Value) -> InputOutcome {
        self.strategy.handle_input_change(field, value)
    }

    pub fn search(&mut self, query: &str) -> Result<usize, ScreenError> {
        let result = self.run_search(query);
        self.report(result)
    }

    pub fn search_results(&self) -> &[Record] {
        &self.strategy.form().state.form.search_results
    }

    pub fn result_labels(&self) -> Vec<String> {
        let display_field = &self.config().search.display_field;
        self.search_results()
            .iter()
            .map(|record| result_label(record, display_field))
            .collect()
    }

    /// Loads result `index` into the form. `None` when the index is out of
    /// range or the row carries no identifier.
    pub fn select(&mut self, index: usize) -> Option<RecordId> {
        let EntityForm { config, state } = self.strategy.form_mut();
        self.search.select(config.config(), state, index)
    }

    pub fn close_search(&mut self) {
        search::close(&mut self.strategy.form_mut().state);
    }

    pub fn save(&mut self) -> Result<SaveOutcome, ScreenError> {
        let result = if self.mode().is_open() {
            self.strategy.save_entity(self.collaborators)
        } else {
            Err(ScreenError::WrongMode {
                operation: "save",
                mode: self.mode(),
            })
        };
        if let Ok(outcome) = &result {
            self.notify(NoticeLevel::Success, outcome.message.clone());
        }
        self.report(result)
    }

    pub fn deactivate(&mut self, id: &RecordId) -> Result<String, ScreenError> {
        let result = self.strategy.deactivate(self.collaborators, id);
        if let Ok(message) = &result {
            self.notify(NoticeLevel::Success, message.clone());
        }
        self.report(result)
    }

    fn run_search(&mut self, query: &str) -> Result<usize, ScreenError> {
        self.strategy
            .authorize(self.collaborators.session, Operation::Search)?;
        let EntityForm { config, state } = self.strategy.form_mut();
        self.search.run(
            config.config(),
            state,
            self.collaborators.store,
            self.collaborators.session,
            query,
        )
    }

    fn dispatch(&mut self, command: ModeCommand) -> Vec<ModeEvent> {
        let EntityForm { config, state } = self.strategy.form_mut();
        let events = state.dispatch(config.config(), command);
        if events
            .iter()
            .any(|event| matches!(event, ModeEvent::TransitionRejected { .. }))
        {
            self.notify(NoticeLevel::Error, SWITCH_MODE_MESSAGE.to_owned());
        }
        events
    }

    fn record_warnings(&mut self, warnings: Vec<OptionWarning>) {
        for warning in &warnings {
            self.notify(NoticeLevel::Warning, warning.message());
        }
        self.warnings = warnings;
    }

    fn report<T>(&mut self, result: Result<T, ScreenError>) -> Result<T, ScreenError> {
        if let Err(error) = &result {
            match error {
                ScreenError::Stale => {}
                ScreenError::Validation { errors } => {
                    for message in errors.general() {
                        self.notify(NoticeLevel::Error, message.clone());
                    }
                    if errors.general().is_empty() {
                        self.notify(NoticeLevel::Error, error.user_message());
                    }
                }
                _ => self.notify(NoticeLevel::Error, error.user_message()),
            }
        }
        result
    }

    fn notify(&mut self, level: NoticeLevel, message: String) {
        self.notices.push(Notice { level, message });
    }
}

#[cfg(test)]
mod tests {
    use super::{ManagementScreen, NoticeLevel, SWITCH_MODE_MESSAGE};
    use crate::error::ScreenError;
    use anyhow::Result;
    use fleetdesk_api::ApiError;
    use fleetdesk_app::{FormMode, ModeEvent, RecordId, SelectOption};
    use fleetdesk_testkit::{
        FleetFaker, RecordingSession, ScriptedStore, StoreCall, builtin_config,
    };
    use serde_json::json;

    #[test]
    fn open_new_then_edit_is_rejected_with_a_notice() -> Result<()> {
        let config = builtin_config("clientes")?;
        let store = ScriptedStore::new();
        let session = RecordingSession::manager();
        let mut screen = ManagementScreen::open(&config, &store, &session);

        screen.open_new();
        screen.input("nombre", json!("Ana"));
        let events = screen.open_edit();
        assert!(matches!(events.as_slice(), [ModeEvent::TransitionRejected { .. }]));
        assert_eq!(screen.mode(), FormMode::New);
        assert_eq!(screen.form_data()["nombre"], json!("Ana"));
        assert_eq!(screen.notices()[0].message, SWITCH_MODE_MESSAGE);
        Ok(())
    }

    #[test]
    fn failing_dynamic_options_still_render_the_screen() -> Result<()> {
        let config = builtin_config("productos")?;
        let store = ScriptedStore::new();
        store.set_options("/productos/categorias", Err(ApiError::Server { status: 500 }));
        let session = RecordingSession::manager();

        let mut screen = ManagementScreen::open(&config, &store, &session);
        assert_eq!(screen.warnings().len(), 1);
        assert_eq!(screen.notices()[0].level, NoticeLevel::Warning);
        assert_eq!(
            screen.config().field("categoria_id").map(|f| f.options.len()),
            Some(1)
        );
        screen.open_new();
        assert_eq!(screen.form_data(), &config.initial_data);

        store.set_options("/productos/categorias", Ok(vec![SelectOption::new(1, "Frenos")]));
        assert!(screen.reload_options().is_empty());
        assert_eq!(
            screen.config().field("categoria_id").map(|f| f.options.len()),
            Some(2)
        );
        assert_eq!(screen.mode(), FormMode::New);
        Ok(())
    }

    #[test]
    fn edit_flow_searches_selects_and_updates() -> Result<()> {
        let config = builtin_config("clientes")?;
        let store = ScriptedStore::new();
        let session = RecordingSession::manager();
        let mut faker = FleetFaker::new(21);
        let mut client = faker.client();
        client.insert("nombre".to_owned(), json!("Transportes Ruiz"));
        client.insert("rfc".to_owned(), json!("TRU0101011A3"));
        store.push_search(Ok(vec![client]));
        let mut screen = ManagementScreen::open(&config, &store, &session);

        screen.open_edit();
        assert_eq!(screen.search("ruiz")?, 1);
        assert_eq!(screen.result_labels(), vec!["Transportes Ruiz (#1)".to_owned()]);
        assert_eq!(screen.select(0), Some(RecordId::Int(1)));
        screen.input("email", json!("flota@ruiz.mx"));

        let outcome = screen.save()?;
        assert_eq!(outcome.message, "Cliente actualizado correctamente");
        assert_eq!(screen.mode(), FormMode::None);
        assert_eq!(screen.form_data(), &config.initial_data);
        let calls = store.calls();
        match &calls[..] {
            [StoreCall::Search { .. }, StoreCall::Update { endpoint, payload, .. }] => {
                assert_eq!(endpoint, "/clientes/1");
                assert_eq!(payload["email"], json!("flota@ruiz.mx"));
            }
            other => panic!("unexpected calls {other:?}"),
        }
        assert_eq!(
            screen.take_notices().last().map(|n| n.level),
            Some(NoticeLevel::Success)
        );
        Ok(())
    }

    #[test]
    fn rejected_credential_while_loading_options_logs_out() -> Result<()> {
        let config = builtin_config("productos")?;
        let store = ScriptedStore::new();
        store.set_options("/productos/categorias", Err(ApiError::Unauthorized));
        let session = RecordingSession::manager();

        let screen = ManagementScreen::open(&config, &store, &session);
        assert_eq!(screen.warnings().len(), 1);
        assert_eq!(session.logout_count(), 1);
        Ok(())
    }

    #[test]
    fn reselecting_a_row_without_id_saves_as_create() -> Result<()> {
        let config = builtin_config("clientes")?;
        let store = ScriptedStore::new();
        let session = RecordingSession::manager();
        let mut faker = FleetFaker::new(8);
        let first = faker.client();
        let mut second = faker.client();
        second.remove("id");
        store.push_search(Ok(vec![first]));
        store.push_search(Ok(vec![second.clone()]));
        let mut screen = ManagementScreen::open(&config, &store, &session);

        screen.open_edit();
        screen.search("alfa")?;
        assert_eq!(screen.select(0), Some(RecordId::Int(1)));
        screen.search("beta")?;
        assert_eq!(screen.select(0), None);
        assert!(!screen.form_data().contains_key("id"));

        screen.save()?;
        let Some(StoreCall::Create { payload, .. }) = store.calls().into_iter().last() else {
            panic!("a create call was expected");
        };
        assert_eq!(payload.get("nombre"), second.get("nombre"));
        assert!(!payload.contains_key("id"));
        Ok(())
    }

    #[test]
    fn save_outside_a_form_is_refused() -> Result<()> {
        let config = builtin_config("clientes")?;
        let store = ScriptedStore::new();
        let session = RecordingSession::manager();
        let mut screen = ManagementScreen::open(&config, &store, &session);

        let error = screen.save().expect_err("no open form");
        assert!(matches!(error, ScreenError::WrongMode { .. }));
        assert_eq!(store.call_count(), 0);
        Ok(())
    }

    #[test]
    fn employee_search_requires_manager() -> Result<()> {
        let config = builtin_config("empleados")?;
        let store = ScriptedStore::new();
        let session = RecordingSession::operator();
        let mut screen = ManagementScreen::open(&config, &store, &session);

        screen.open_edit();
        let error = screen.search("ana").expect_err("operators cannot search employees");
        assert!(matches!(error, ScreenError::NotPermitted { .. }));
        assert_eq!(store.call_count(), 0);
        assert_eq!(
            screen.notices().last().map(|n| n.message.as_str()),
            Some("Solo un gerente puede realizar esta operación")
        );
        Ok(())
    }

    #[test]
    fn employee_validation_surfaces_each_issue_as_a_notice() -> Result<()> {
        let config = builtin_config("empleados")?;
        let store = ScriptedStore::new();
        let session = RecordingSession::manager();
        let mut screen = ManagementScreen::open(&config, &store, &session);

        screen.open_new();
        screen.input("nombre", json!("Ana"));
        screen.input("apellido", json!("López"));
        screen.input("email", json!("ana@flota.mx"));
        screen.input("usuario", json!("ana.lopez"));
        screen.input("password", json!("123"));
        screen.save().expect_err("short password");

        let notices = screen.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(
            notices[0].message,
            "La contraseña debe tener al menos 6 caracteres"
        );
        assert_eq!(store.call_count(), 0);
        Ok(())
    }

    #[test]
    fn signed_out_session_logs_out_without_calling_the_store() -> Result<()> {
        let config = builtin_config("clientes")?;
        let store = ScriptedStore::new();
        let session = RecordingSession::signed_out();
        let mut screen = ManagementScreen::open(&config, &store, &session);

        screen.open_edit();
        let error = screen.search("ruiz").expect_err("no credential");
        assert_eq!(error, ScreenError::Api(ApiError::Unauthorized));
        assert_eq!(session.logout_count(), 1);
        assert_eq!(store.call_count(), 0);
        Ok(())
    }
}
