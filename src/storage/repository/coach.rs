// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Coach conversation repository.
//!
//! Every message (user and assistant) is its own document under
//! `coach/{message_id}.json`; a conversation is the set of a user's messages
//! with one coach, ordered by time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{paths::is_safe_id, JsonStorage, OwnedResource, StorageError, StorageResult};
use crate::models::{Coach, CoachRole};

/// One message in a coach conversation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredCoachMessage {
    pub id: String,
    pub owner_user_id: String,
    pub coach: Coach,
    pub role: CoachRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl StoredCoachMessage {
    pub fn new(owner_user_id: &str, coach: Coach, role: CoachRole, content: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_user_id: owner_user_id.to_string(),
            coach,
            role,
            content,
            created_at: Utc::now(),
        }
    }
}

impl OwnedResource for StoredCoachMessage {
    fn owner_user_id(&self) -> &str {
        &self.owner_user_id
    }

    fn kind() -> &'static str {
        "Coach message"
    }

    fn id(&self) -> &str {
        &self.id
    }
}

pub struct CoachRepository<'a> {
    storage: &'a JsonStorage,
}

impl<'a> CoachRepository<'a> {
    pub fn new(storage: &'a JsonStorage) -> Self {
        Self { storage }
    }

    pub fn append(&self, message: &StoredCoachMessage) -> StorageResult<()> {
        if !is_safe_id(&message.id) {
            return Err(StorageError::InvalidId(message.id.clone()));
        }
        self.storage
            .create_json(self.storage.paths().coach_message(&message.id), message)
    }

    /// The most recent `limit` messages with `coach`, oldest first.
    ///
    /// `None` returns the whole conversation.
    pub fn history(
        &self,
        user_id: &str,
        coach: Coach,
        limit: Option<usize>,
    ) -> StorageResult<Vec<StoredCoachMessage>> {
        let mut messages = self
            .storage
            .read_all(self.storage.paths().coach_dir(), |m: &StoredCoachMessage| {
                m.owner_user_id == user_id && m.coach == coach
            })?;
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.role.cmp(&b.role)));

        if let Some(limit) = limit {
            let skip = messages.len().saturating_sub(limit);
            messages.drain(..skip);
        }
        Ok(messages)
    }
}
