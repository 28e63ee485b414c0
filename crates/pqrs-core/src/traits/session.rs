// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session credential storage.

use std::sync::RwLock;

use crate::types::SessionToken;

/// Single-slot holder for a session credential.
///
/// One store is created per identity and handed to the session manager, so
/// the service account and each signed-in employee never share a token.
pub trait SessionStore: Send + Sync {
    fn get(&self) -> Option<SessionToken>;
    fn set(&self, token: SessionToken);
    /// Empties the slot. Idempotent.
    fn clear(&self);
}

/// Process-memory session store.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    slot: RwLock<Option<SessionToken>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self) -> Option<SessionToken> {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set(&self, token: SessionToken) {
        *self
            .slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(token);
    }

    fn clear(&self) {
        self.slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
    }
}
