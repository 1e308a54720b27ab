// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Coach personas and chat prompt assembly.

use super::{AiError, ChatMessage, OpenAiClient};
use crate::models::{Coach, CoachRole};
use crate::storage::{StoredCoachMessage, StoredGoal};

/// Number of earlier messages sent back to the model as context.
pub const COACH_HISTORY_LIMIT: usize = 10;

fn persona(coach: Coach) -> &'static str {
    match coach {
        Coach::Motivator => {
            "You are Max, an energetic motivational coach. You celebrate every win, \
             push people to take action today, and keep replies short, upbeat and direct."
        }
        Coach::Strategist => {
            "You are Sage, a strategic coach. You break goals into concrete plans, \
             ask clarifying questions when needed and suggest the single most useful next step."
        }
        Coach::Mindful => {
            "You are Luna, a calm and mindful coach. You help people notice how they feel, \
             encourage self-compassion and suggest gentle, sustainable practices."
        }
    }
}

/// Assemble the chat for one coach turn: persona, the user's active goals,
/// the recent conversation and the new message.
pub fn build_coach_messages(
    coach: Coach,
    display_name: &str,
    goals: &[StoredGoal],
    history: &[StoredCoachMessage],
    message: &str,
) -> Vec<ChatMessage> {
    let mut system = format!(
        "{}\nYou are talking with {display_name}. Keep answers under 150 words.",
        persona(coach)
    );

    let active: Vec<&StoredGoal> = goals.iter().filter(|g| g.is_active()).collect();
    if !active.is_empty() {
        system.push_str("\nTheir active goals:");
        for goal in active {
            system.push_str(&format!("\n- {} (started {})", goal.title, goal.start_date));
        }
    }

    let skip = history.len().saturating_sub(COACH_HISTORY_LIMIT);
    let mut messages = Vec::with_capacity(history.len() - skip + 2);
    messages.push(ChatMessage::system(system));
    messages.extend(history[skip..].iter().map(|m| match m.role {
        CoachRole::User => ChatMessage::user(m.content.clone()),
        CoachRole::Assistant => ChatMessage::assistant(m.content.clone()),
    }));
    messages.push(ChatMessage::user(message));
    messages
}

/// Ask the model for the coach's next reply.
pub async fn coach_reply(
    client: &OpenAiClient,
    coach: Coach,
    display_name: &str,
    goals: &[StoredGoal],
    history: &[StoredCoachMessage],
    message: &str,
) -> Result<String, AiError> {
    let messages = build_coach_messages(coach, display_name, goals, history, message);
    client.chat(&messages, false).await
}
