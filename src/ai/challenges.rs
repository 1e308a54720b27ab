// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Daily challenge generation.
//!
//! With a provider configured, challenges are written by the model from the
//! goal and the challenges already in the plan. Without one, a fixed ladder
//! of default suggestions is used so the feature still works.

use serde::Deserialize;

use super::{strip_code_fence, AiError, ChatMessage, OpenAiClient};
use crate::storage::{Difficulty, StoredChallenge, StoredGoal};

/// A challenge proposed for one day of a goal's plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeSuggestion {
    pub day_number: u32,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
}

#[derive(Deserialize)]
struct GeneratedChallenges {
    #[serde(default)]
    challenges: Vec<GeneratedChallenge>,
}

#[derive(Deserialize)]
struct GeneratedChallenge {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    difficulty: String,
}

const SYSTEM_PROMPT: &str = "You are a personal transformation coach. You design small, \
concrete daily challenges that move someone toward a 30-day goal. Each challenge must be \
doable in a single day, specific and measurable. Difficulty should rise gradually over the \
30 days. Answer only with a JSON object of the form \
{\"challenges\":[{\"title\":\"...\",\"description\":\"...\",\"difficulty\":\"easy|medium|hard\"}]}.";

/// Titles are capped so a verbose model cannot bloat the plan.
const MAX_TITLE_CHARS: usize = 120;

/// Produce `days.len()` challenges for the given plan days.
///
/// `client` is `None` when no provider is configured; default suggestions
/// are returned in that case.
pub async fn generate_challenges(
    client: Option<&OpenAiClient>,
    goal: &StoredGoal,
    existing: &[StoredChallenge],
    days: &[u32],
) -> Result<Vec<ChallengeSuggestion>, AiError> {
    let Some(client) = client else {
        return Ok(default_suggestions(goal, days));
    };

    let messages = [
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(build_prompt(goal, existing, days)),
    ];
    let content = client.chat(&messages, true).await?;
    parse_suggestions(&content, days)
}

fn build_prompt(goal: &StoredGoal, existing: &[StoredChallenge], days: &[u32]) -> String {
    let mut prompt = format!("Goal: {}\n", goal.title);
    if let Some(description) = &goal.description {
        prompt.push_str(&format!("Details: {description}\n"));
    }
    if let Some(category) = &goal.category {
        prompt.push_str(&format!("Category: {category}\n"));
    }
    prompt.push_str(&format!("Plan length: {} days\n", goal.duration_days));

    if !existing.is_empty() {
        prompt.push_str("Challenges so far (do not repeat them):\n");
        for challenge in existing {
            prompt.push_str(&format!(
                "- Day {}: {} ({:?})\n",
                challenge.day_number, challenge.title, challenge.status
            ));
        }
    }

    let day_list: Vec<String> = days.iter().map(u32::to_string).collect();
    prompt.push_str(&format!(
        "Write {} challenge(s), one for each of these days in order: {}.",
        days.len(),
        day_list.join(", ")
    ));
    prompt
}

fn parse_suggestions(content: &str, days: &[u32]) -> Result<Vec<ChallengeSuggestion>, AiError> {
    let generated: GeneratedChallenges = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| AiError::InvalidResponse(format!("challenge JSON: {e}")))?;

    let suggestions: Vec<ChallengeSuggestion> = generated
        .challenges
        .into_iter()
        .filter(|c| !c.title.trim().is_empty())
        .zip(days.iter().copied())
        .map(|(c, day_number)| ChallengeSuggestion {
            day_number,
            title: c.title.trim().chars().take(MAX_TITLE_CHARS).collect(),
            description: c.description.trim().to_string(),
            difficulty: Difficulty::from_loose(&c.difficulty),
        })
        .collect();

    if suggestions.is_empty() {
        return Err(AiError::InvalidResponse(
            "model returned no challenges".to_string(),
        ));
    }
    Ok(suggestions)
}

const DEFAULT_LADDER: [(&str, &str, Difficulty); 6] = [
    (
        "Define your why",
        "Write down three reasons \"{goal}\" matters to you and keep the note where you will see it.",
        Difficulty::Easy,
    ),
    (
        "Take the smallest step",
        "Spend 10 focused minutes on \"{goal}\" today, with no distractions.",
        Difficulty::Easy,
    ),
    (
        "Remove one obstacle",
        "Identify one thing that gets in the way of \"{goal}\" and change your environment to remove it.",
        Difficulty::Medium,
    ),
    (
        "Double the effort",
        "Work on \"{goal}\" for 25 minutes and note what you accomplished.",
        Difficulty::Medium,
    ),
    (
        "Tell someone",
        "Share your progress on \"{goal}\" with a friend and ask them to check in with you next week.",
        Difficulty::Medium,
    ),
    (
        "Stretch day",
        "Do the hardest task related to \"{goal}\" that you have been putting off.",
        Difficulty::Hard,
    ),
];

/// Deterministic challenges used when no provider is configured.
pub fn default_suggestions(goal: &StoredGoal, days: &[u32]) -> Vec<ChallengeSuggestion> {
    days.iter()
        .map(|&day_number| {
            let index = (day_number.saturating_sub(1) as usize) % DEFAULT_LADDER.len();
            let (title, description, difficulty) = DEFAULT_LADDER[index];
            ChallengeSuggestion {
                day_number,
                title: title.to_string(),
                description: description.replace("{goal}", &goal.title),
                difficulty,
            }
        })
        .collect()
}
