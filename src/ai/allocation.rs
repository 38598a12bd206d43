//! Smart allocation: ask the model which cleaner suits a job.
//!
//! There is no scoring here. The roster is embedded in the prompt and the
//! model's pick is relayed as-is; the returned id is not checked against the
//! roster until the caller resolves it.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ChatMessage, CompletionBackend};
use crate::error::{AppError, Result};
use crate::models::Staff;

const SYSTEM_PROMPT: &str = "You allocate cleaners to cleaning jobs for a small cleaning business. \
Pick the single best cleaner from the roster for the job, considering skills, location and availability. \
Reply with only a JSON object of the form \
{\"optimalCleaner\": \"<cleaner id>\", \"reasoning\": \"<short explanation>\", \"potentialConflicts\": \"<optional notes>\"}.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(alias = "optimalCleaner")]
    pub optimal_cleaner: String,
    pub reasoning: String,
    #[serde(default, alias = "potentialConflicts")]
    pub potential_conflicts: Option<String>,
}

impl Recommendation {
    /// The recommended member, if the model named someone on the roster.
    pub fn resolve<'a>(&self, roster: &'a [Staff]) -> Option<&'a Staff> {
        let wanted = self.optimal_cleaner.trim();
        roster.iter().find(|s| s.id == wanted)
    }
}

pub fn build_prompt(job_description: &str, roster: &[Staff]) -> Vec<ChatMessage> {
    let cleaners: Vec<_> = roster
        .iter()
        .map(|s| {
            json!({
                "id": s.id,
                "name": s.name,
                "skills": s.skills,
                "location": s.location,
                "availability": s.availability,
            })
        })
        .collect();

    let roster_json = serde_json::to_string_pretty(&cleaners).unwrap_or_else(|_| "[]".to_string());

    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Job description:\n{}\n\nAvailable cleaners:\n{}",
            job_description.trim(),
            roster_json
        )),
    ]
}

/// Pull the JSON object out of a model reply, tolerating prose and code fences.
pub fn parse_recommendation(text: &str) -> Result<Recommendation> {
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return Err(AppError::Completion(
            "Model reply did not contain a recommendation".to_string(),
        ));
    };
    if end < start {
        return Err(AppError::Completion(
            "Model reply did not contain a recommendation".to_string(),
        ));
    }

    let recommendation: Recommendation = serde_json::from_str(&text[start..=end])
        .map_err(|e| AppError::Completion(format!("Unreadable recommendation: {e}")))?;

    if recommendation.optimal_cleaner.trim().is_empty() {
        return Err(AppError::Completion(
            "Model did not name a cleaner".to_string(),
        ));
    }

    Ok(Recommendation {
        potential_conflicts: recommendation
            .potential_conflicts
            .filter(|c| !c.trim().is_empty()),
        ..recommendation
    })
}

/// One completion call. Archived staff are left out of the prompt.
pub async fn suggest_allocation<B: CompletionBackend>(
    backend: &B,
    job_description: &str,
    roster: &[Staff],
) -> Result<Recommendation> {
    if job_description.trim().is_empty() {
        return Err(AppError::validation("Describe the job before asking for a suggestion"));
    }

    let active: Vec<Staff> = roster.iter().filter(|s| !s.archived).cloned().collect();
    if active.is_empty() {
        return Err(AppError::validation("No active staff to allocate"));
    }

    let messages = build_prompt(job_description, &active);
    let reply = backend.complete(&messages).await?;
    let recommendation = parse_recommendation(&reply)?;

    if recommendation.resolve(&active).is_none() {
        tracing::warn!(cleaner = %recommendation.optimal_cleaner, "Model recommended a cleaner not on the roster");
    } else {
        tracing::info!(cleaner = %recommendation.optimal_cleaner, "Allocation suggested");
    }

    Ok(recommendation)
}
