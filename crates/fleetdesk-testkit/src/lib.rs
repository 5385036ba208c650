// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use fleetdesk_api::{ApiError, ApiResult, Credential, RecordStore, SessionContext};
use fleetdesk_app::{EntityConfiguration, Record, SelectOption, UpdateMethod, catalog};
use serde_json::{Value, json};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};

pub const MANAGER_ROLE: &str = "gerente";

const COMPANY_PREFIXES: [&str; 8] = [
    "Transportes",
    "Fletes",
    "Logística",
    "Autotransportes",
    "Carga",
    "Mudanzas",
    "Distribuidora",
    "Paquetería",
];
const COMPANY_NAMES: [&str; 10] = [
    "Ruiz", "del Norte", "Bajío", "Sierra", "Pacífico", "Golfo", "Altiplano", "Centauro",
    "Halcón", "Roble",
];
const FIRST_NAMES: [&str; 12] = [
    "Ana", "Luis", "María", "José", "Carmen", "Jorge", "Lucía", "Pedro", "Sofía", "Raúl",
    "Elena", "Tomás",
];
const LAST_NAMES: [&str; 12] = [
    "García", "Hernández", "López", "Martínez", "Pérez", "Sánchez", "Ramírez", "Flores",
    "Torres", "Vargas", "Castillo", "Ortiz",
];
const PRODUCTS: [&str; 10] = [
    "Balata delantera",
    "Filtro de aceite",
    "Aceite 15W-40",
    "Llanta 295/80",
    "Anticongelante",
    "Banda de distribución",
    "Filtro de aire",
    "Amortiguador",
    "Foco de cuarto",
    "Grasa multiusos",
];
const SCENARIO_CONFIG: &str = r#"
entity_name = "contactos"
title = "Contacto"

[initial_data]
nombre = ""
email = ""

[[fields]]
name = "nombre"
required = true

[[fields]]
name = "email"
required = false

[endpoints]
create = "/contactos"
update = "/contactos/{id}"
search = "/contactos/buscar"

[search]
display_field = "nombre"
"#;

/// Two-field configuration: a required `nombre` and an optional `email`.
pub fn scenario_config() -> Result<EntityConfiguration> {
    EntityConfiguration::from_toml_str(SCENARIO_CONFIG, "scenario fixture")
}

pub fn builtin_config(name: &str) -> Result<EntityConfiguration> {
    let configs = catalog::builtin()?;
    Ok(catalog::by_name(&configs, name)?.clone())
}

pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Create {
        endpoint: String,
        payload: Record,
    },
    Update {
        endpoint: String,
        method: UpdateMethod,
        payload: Record,
    },
    Search {
        endpoint: String,
        query: String,
    },
    FetchOptions {
        endpoint: String,
    },
    Deactivate {
        endpoint: String,
    },
}

/// In-memory `RecordStore` that records every call and replays queued
/// responses. Writes default to `{"id": 1}`, searches to an empty list, and
/// unknown option endpoints to 404.
#[derive(Debug, Default)]
pub struct ScriptedStore {
    calls: RefCell<Vec<StoreCall>>,
    writes: RefCell<VecDeque<ApiResult<Value>>>,
    searches: RefCell<VecDeque<ApiResult<Vec<Record>>>>,
    options: RefCell<BTreeMap<String, ApiResult<Vec<SelectOption>>>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_write(&self, result: ApiResult<Value>) {
        self.writes.borrow_mut().push_back(result);
    }

    pub fn push_search(&self, result: ApiResult<Vec<Record>>) {
        self.searches.borrow_mut().push_back(result);
    }

    pub fn set_options(&self, endpoint: &str, result: ApiResult<Vec<SelectOption>>) {
        self.options
            .borrow_mut()
            .insert(endpoint.to_owned(), result);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    fn record_call(&self, call: StoreCall) {
        self.calls.borrow_mut().push(call);
    }

    fn next_write(&self) -> ApiResult<Value> {
        self.writes
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({"id": 1})))
    }
}

impl RecordStore for ScriptedStore {
    fn create(
        &self,
        _credential: &Credential,
        endpoint: &str,
        payload: &Record,
    ) -> ApiResult<Value> {
        self.record_call(StoreCall::Create {
            endpoint: endpoint.to_owned(),
            payload: payload.clone(),
        });
        self.next_write()
    }

    fn update(
        &self,
        _credential: &Credential,
        endpoint: &str,
        method: UpdateMethod,
        payload: &Record,
    ) -> ApiResult<Value> {
        self.record_call(StoreCall::Update {
            endpoint: endpoint.to_owned(),
            method,
            payload: payload.clone(),
        });
        self.next_write()
    }

    fn search(
        &self,
        _credential: &Credential,
        endpoint: &str,
        query: &str,
    ) -> ApiResult<Vec<Record>> {
        self.record_call(StoreCall::Search {
            endpoint: endpoint.to_owned(),
            query: query.to_owned(),
        });
        self.searches
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn fetch_options(
        &self,
        _credential: &Credential,
        endpoint: &str,
    ) -> ApiResult<Vec<SelectOption>> {
        self.record_call(StoreCall::FetchOptions {
            endpoint: endpoint.to_owned(),
        });
        self.options
            .borrow()
            .get(endpoint)
            .cloned()
            .unwrap_or(Err(ApiError::NotFound))
    }

    fn deactivate(&self, _credential: &Credential, endpoint: &str) -> ApiResult<Value> {
        self.record_call(StoreCall::Deactivate {
            endpoint: endpoint.to_owned(),
        });
        self.next_write()
    }
}

/// Session double that counts logouts.
#[derive(Debug)]
pub struct RecordingSession {
    token: RefCell<Option<String>>,
    roles: Option<Vec<String>>,
    logouts: Cell<usize>,
}

impl RecordingSession {
    pub fn new(token: Option<&str>, roles: Option<&[&str]>) -> Self {
        Self {
            token: RefCell::new(token.map(str::to_owned)),
            roles: roles.map(|roles| roles.iter().map(|role| (*role).to_owned()).collect()),
            logouts: Cell::new(0),
        }
    }

    pub fn manager() -> Self {
        Self::new(Some("manager-token"), Some(&[MANAGER_ROLE]))
    }

    pub fn operator() -> Self {
        Self::new(Some("operator-token"), Some(&["operador"]))
    }

    /// Signed in, but the role list never arrived.
    pub fn unknown_role() -> Self {
        Self::new(Some("token"), None)
    }

    pub fn signed_out() -> Self {
        Self::new(None, Some(&[MANAGER_ROLE]))
    }

    pub fn logout_count(&self) -> usize {
        self.logouts.get()
    }
}

impl SessionContext for RecordingSession {
    fn credential(&self) -> Option<Credential> {
        self.token.borrow().as_deref().map(Credential::bearer)
    }

    fn has_role(&self, role: &str) -> bool {
        self.roles
            .as_ref()
            .is_some_and(|roles| roles.iter().any(|held| held == role))
    }

    fn logout(&self) {
        self.logouts.set(self.logouts.get() + 1);
        self.token.replace(None);
    }
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Deterministic generator of raw records shaped like store responses.
#[derive(Debug, Clone)]
pub struct FleetFaker {
    rng: DeterministicRng,
    next_id: i64,
}

impl FleetFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: 1,
        }
    }

    pub fn client(&mut self) -> Record {
        let name = format!(
            "{} {}",
            self.pick(&COMPANY_PREFIXES),
            self.pick(&COMPANY_NAMES)
        );
        let rfc = format!(
            "{}{:06}{:03}",
            initials(&name, 3),
            self.int_range(100_000, 999_999),
            self.int_range(100, 999)
        );
        let id = self.take_id();
        record(json!({
            "id": id,
            "nombre": name,
            "rfc": rfc,
            "email": format!("contacto{id}@cliente.mx"),
            "telefono": format!("55{:08}", self.int_range(10_000_000, 99_999_999)),
            "direccion": "",
            "credito_dias": self.int_range(0, 60),
            "creado_en": "2026-01-15T08:00:00Z",
        }))
    }

    pub fn product(&mut self) -> Record {
        let id = self.take_id();
        record(json!({
            "id": id,
            "nombre": self.pick(&PRODUCTS),
            "categoria_id": self.int_range(1, 6),
            "unidad": "pieza",
            "precio": format!("{}.{:02}", self.int_range(50, 4_000), self.int_range(0, 99)),
            "existencia": self.int_range(0, 40).to_string(),
        }))
    }

    pub fn employee(&mut self) -> Record {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        let id = self.take_id();
        record(json!({
            "id": id,
            "nombre": first,
            "apellido": last,
            "email": format!("empleado{id}@flota.mx"),
            "telefono": "",
            "usuario": format!("{}.{}{id}", first.to_lowercase(), last.to_lowercase()),
            "rol": "operador",
            "activo": true,
        }))
    }

    fn take_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        min + self.rng.int_n((max - min + 1) as usize) as i64
    }
}

fn initials(name: &str, len: usize) -> String {
    let mut out: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .filter(|ch| ch.is_alphabetic())
        .take(len)
        .collect::<String>()
        .to_uppercase();
    while out.chars().count() < len {
        out.push('X');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{FleetFaker, RecordingSession, ScriptedStore, StoreCall, initials, record};
    use fleetdesk_api::{ApiError, Credential, RecordStore, SessionContext};
    use fleetdesk_app::catalog;
    use serde_json::json;

    #[test]
    fn faker_is_deterministic_per_seed() {
        let mut left = FleetFaker::new(42);
        let mut right = FleetFaker::new(42);
        assert_eq!(left.client(), right.client());
        assert_eq!(left.product(), right.product());
    }

    #[test]
    fn faker_records_cover_builtin_fields() -> anyhow::Result<()> {
        let configs = catalog::builtin()?;
        let mut faker = FleetFaker::new(7);
        let client = faker.client();
        let clients = catalog::by_name(&configs, "clientes")?;
        for key in clients.initial_data.keys() {
            assert!(client.contains_key(key), "client record missing {key}");
        }
        assert_eq!(client["id"], json!(1));
        assert_eq!(faker.employee()["id"], json!(2));
        Ok(())
    }

    #[test]
    fn scripted_store_replays_and_records() {
        let store = ScriptedStore::new();
        store.push_write(Err(ApiError::Server { status: 500 }));
        let credential = Credential::bearer("t");

        let first = store.create(&credential, "/x", &record(json!({"a": 1})));
        assert_eq!(first, Err(ApiError::Server { status: 500 }));
        let second = store.create(&credential, "/x", &record(json!({"a": 2})));
        assert_eq!(second, Ok(json!({"id": 1})));
        assert_eq!(
            store.fetch_options(&credential, "/missing"),
            Err(ApiError::NotFound)
        );

        assert_eq!(store.call_count(), 3);
        assert!(matches!(store.calls()[2], StoreCall::FetchOptions { .. }));
    }

    #[test]
    fn recording_session_counts_logouts() {
        let session = RecordingSession::manager();
        assert!(session.credential().is_some());
        session.logout();
        assert_eq!(session.logout_count(), 1);
        assert!(session.credential().is_none());
        assert!(!RecordingSession::unknown_role().has_role(super::MANAGER_ROLE));
    }

    #[test]
    fn initials_pad_short_names() {
        assert_eq!(initials("Carga Sierra", 3), "CSX");
    }
}
