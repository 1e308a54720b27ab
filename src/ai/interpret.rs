// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Habit check-in interpretation.
//!
//! A spoken check-in ("I meditated but didn't go running") is turned into
//! habit logs by a [`HabitInterpreter`]. Two strategies exist:
//!
//! - [`AiInterpreter`]: asks the chat model to map the transcript to habits
//! - [`KeywordInterpreter`]: matches habit keywords and nearby negations
//!
//! The handler picks one per request and falls back to keywords when the
//! model is unavailable.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{strip_code_fence, AiError, ChatMessage, OpenAiClient};
use crate::storage::StoredHabit;

/// Words that flip a keyword match to "not done" when they appear shortly
/// before it.
pub const NEGATIONS: [&str; 8] = [
    "not", "no", "didn't", "didnt", "skipped", "never", "without", "missed",
];

/// How many words before a match are searched for a negation.
const NEGATION_WINDOW: usize = 3;

/// Which strategy produced a set of logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InterpretMethod {
    Ai,
    Keyword,
}

/// One habit's outcome as understood from a check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpretedLog {
    pub habit_id: String,
    pub completed: bool,
    pub note: Option<String>,
}

/// Strategy turning a transcript into habit logs.
#[allow(async_fn_in_trait)]
pub trait HabitInterpreter {
    fn method(&self) -> InterpretMethod;

    /// Logs for the habits mentioned in `transcript`. Habits not mentioned
    /// are left out.
    async fn interpret(
        &self,
        transcript: &str,
        habits: &[StoredHabit],
    ) -> Result<Vec<InterpretedLog>, AiError>;
}

// =============================================================================
// Keyword strategy
// =============================================================================

/// Heuristic interpreter; never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordInterpreter;

impl KeywordInterpreter {
    pub fn interpret_sync(&self, transcript: &str, habits: &[StoredHabit]) -> Vec<InterpretedLog> {
        let words = tokenize(transcript);
        habits
            .iter()
            .filter_map(|habit| {
                let position = match_terms(habit)
                    .iter()
                    .filter_map(|term| find_phrase(&words, term))
                    .min()?;
                let window = &words[position.saturating_sub(NEGATION_WINDOW)..position];
                let negated = window.iter().any(|w| NEGATIONS.contains(&w.as_str()));
                Some(InterpretedLog {
                    habit_id: habit.id.clone(),
                    completed: !negated,
                    note: None,
                })
            })
            .collect()
    }
}

impl HabitInterpreter for KeywordInterpreter {
    fn method(&self) -> InterpretMethod {
        InterpretMethod::Keyword
    }

    async fn interpret(
        &self,
        transcript: &str,
        habits: &[StoredHabit],
    ) -> Result<Vec<InterpretedLog>, AiError> {
        Ok(self.interpret_sync(transcript, habits))
    }
}

/// Lower-cased words; apostrophes inside words are kept ("didn't").
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace(['\u{2019}', '\u{2018}'], "'")
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Search terms for a habit: each explicit keyword (possibly several words)
/// plus every word of the name with at least three letters.
fn match_terms(habit: &StoredHabit) -> Vec<Vec<String>> {
    let mut seen = HashSet::new();
    habit
        .keywords
        .iter()
        .map(|k| tokenize(k))
        .chain(
            tokenize(&habit.name)
                .into_iter()
                .filter(|w| w.chars().filter(|c| c.is_alphabetic()).count() >= 3)
                .map(|w| vec![w]),
        )
        .filter(|term| !term.is_empty() && seen.insert(term.clone()))
        .collect()
}

/// Index of the first occurrence of `phrase` in `words`.
fn find_phrase(words: &[String], phrase: &[String]) -> Option<usize> {
    if phrase.is_empty() || phrase.len() > words.len() {
        return None;
    }
    words.windows(phrase.len()).position(|w| w == phrase)
}

// =============================================================================
// AI strategy
// =============================================================================

/// Model-backed interpreter.
#[derive(Debug, Clone, Copy)]
pub struct AiInterpreter<'a> {
    client: &'a OpenAiClient,
}

impl<'a> AiInterpreter<'a> {
    pub fn new(client: &'a OpenAiClient) -> Self {
        Self { client }
    }
}

const INTERPRET_SYSTEM_PROMPT: &str = "You read a person's spoken daily check-in and decide \
which of their habits they mention and whether they did them. Only include habits that are \
clearly mentioned. Answer only with a JSON object of the form \
{\"logs\":[{\"habitId\":\"...\",\"completed\":true,\"note\":\"short optional note\"}]}.";

#[derive(Deserialize)]
struct AiLogs {
    #[serde(default)]
    logs: Vec<AiLog>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiLog {
    habit_id: String,
    completed: bool,
    #[serde(default)]
    note: Option<String>,
}

impl HabitInterpreter for AiInterpreter<'_> {
    fn method(&self) -> InterpretMethod {
        InterpretMethod::Ai
    }

    async fn interpret(
        &self,
        transcript: &str,
        habits: &[StoredHabit],
    ) -> Result<Vec<InterpretedLog>, AiError> {
        let habit_list = serde_json::json!(habits
            .iter()
            .map(|h| serde_json::json!({"id": h.id, "name": h.name, "keywords": h.keywords}))
            .collect::<Vec<_>>());
        let messages = [
            ChatMessage::system(INTERPRET_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Habits: {habit_list}\nCheck-in transcript: \"{transcript}\""
            )),
        ];

        let content = self.client.chat(&messages, true).await?;
        let parsed: AiLogs = serde_json::from_str(strip_code_fence(&content))
            .map_err(|e| AiError::InvalidResponse(format!("check-in JSON: {e}")))?;

        let known: HashSet<&str> = habits.iter().map(|h| h.id.as_str()).collect();
        let mut seen = HashSet::new();
        Ok(parsed
            .logs
            .into_iter()
            .filter(|log| known.contains(log.habit_id.as_str()) && seen.insert(log.habit_id.clone()))
            .map(|log| InterpretedLog {
                habit_id: log.habit_id,
                completed: log.completed,
                note: log.note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            })
            .collect())
    }
}
