// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use fleetdesk_api::{ApiError, HttpRecordStore};
use fleetdesk_app::FormMode;
use fleetdesk_engine::{ManagementScreen, ScreenError};
use fleetdesk_testkit::{RecordingSession, builtin_config, scenario_config};
use serde_json::{Value, json};
use std::io::Read;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Method, Response, Server};

fn json_response(status: u16, body: &str) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        )
}

fn start() -> Result<(Server, String)> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/api", server.server_addr());
    Ok((server, addr))
}

#[test]
fn scenario_creates_once_over_http() -> Result<()> {
    let (server, addr) = start()?;

    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Post);
        assert_eq!(request.url(), "/api/contactos");
        let mut body = String::new();
        request
            .as_reader()
            .read_to_string(&mut body)
            .expect("request body should be readable");
        let payload: Value = serde_json::from_str(&body).expect("request body should be JSON");
        assert_eq!(payload, json!({"nombre": "Ana", "email": "a@b.com"}));
        request
            .respond(json_response(201, r#"{"id":1}"#))
            .expect("response should succeed");
        assert!(
            server
                .recv_timeout(Duration::from_millis(200))
                .expect("recv should not fail")
                .is_none(),
            "exactly one request expected"
        );
    });

    let config = scenario_config()?;
    let store = HttpRecordStore::new(&addr, Duration::from_secs(1))?;
    let session = RecordingSession::manager();
    let mut screen = ManagementScreen::open(&config, &store, &session);

    screen.open_new();
    screen.input("email", json!("a@b.com"));
    let error = screen.save().expect_err("blank nombre blocks the save");
    assert!(matches!(error, ScreenError::Validation { .. }));
    assert_eq!(screen.errors().get("nombre"), Some("NOMBRE es obligatorio"));
    assert_eq!(screen.errors().fields().len(), 1);

    screen.input("nombre", json!("Ana"));
    let outcome = screen.save()?;
    assert_eq!(outcome.response, json!({"id": 1}));
    assert_eq!(screen.mode(), FormMode::None);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn expired_session_on_update_logs_out_once() -> Result<()> {
    let (server, addr) = start()?;

    let handle = thread::spawn(move || {
        let search = server.recv().expect("search expected");
        search
            .respond(json_response(
                200,
                r#"[{"id":8,"nombre":"Refacciones Sierra","telefono":"5512345678"}]"#,
            ))
            .expect("response should succeed");

        let update = server.recv().expect("update expected");
        assert_eq!(update.method(), &Method::Post);
        assert_eq!(update.url(), "/api/proveedores/actualizar/8");
        update
            .respond(json_response(401, r#"{"message":"token expired"}"#))
            .expect("response should succeed");
        assert!(
            server
                .recv_timeout(Duration::from_millis(200))
                .expect("recv should not fail")
                .is_none(),
            "a 401 must not be retried"
        );
    });

    let config = builtin_config("proveedores")?;
    let store = HttpRecordStore::new(&addr, Duration::from_secs(1))?;
    let session = RecordingSession::manager();
    let mut screen = ManagementScreen::open(&config, &store, &session);

    screen.open_edit();
    screen.search("sierra")?;
    screen.select(0);
    let error = screen.save().expect_err("401 should fail");
    assert_eq!(error, ScreenError::Api(ApiError::Unauthorized));
    assert_eq!(session.logout_count(), 1);
    assert_eq!(screen.mode(), FormMode::Edit);

    handle.join().expect("server thread should join");
    Ok(())
}
