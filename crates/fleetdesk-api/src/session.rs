// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cell::RefCell;
use std::fmt;
use time::OffsetDateTime;

/// Bearer token attached to every request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
}

impl Credential {
    pub fn bearer(token: &str) -> Self {
        Self {
            token: token.to_owned(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Caller identity as seen by the engine. Passed explicitly to every screen.
pub trait SessionContext {
    /// `None` when the token is missing or expired.
    fn credential(&self) -> Option<Credential>;

    /// Must answer `false` when the caller's roles are unknown.
    fn has_role(&self, role: &str) -> bool;

    fn logout(&self);
}

#[derive(Debug)]
pub struct Session {
    token: RefCell<Option<String>>,
    expires_at: Option<OffsetDateTime>,
    roles: Option<Vec<String>>,
}

impl Session {
    pub fn new(token: Option<String>, roles: Option<Vec<String>>) -> Self {
        Self {
            token: RefCell::new(token.filter(|token| !token.trim().is_empty())),
            expires_at: None,
            roles,
        }
    }

    pub fn with_expiry(mut self, expires_at: OffsetDateTime) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_logged_out(&self) -> bool {
        self.token.borrow().is_none()
    }

    fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

impl SessionContext for Session {
    fn credential(&self) -> Option<Credential> {
        if self.is_expired(OffsetDateTime::now_utc()) {
            return None;
        }
        self.token.borrow().as_deref().map(Credential::bearer)
    }

    fn has_role(&self, role: &str) -> bool {
        self.roles
            .as_ref()
            .is_some_and(|roles| roles.iter().any(|held| held.eq_ignore_ascii_case(role)))
    }

    fn logout(&self) {
        log::info!("session closed; credential discarded");
        self.token.replace(None);
    }
}
