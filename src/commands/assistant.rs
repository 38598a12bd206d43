use serde::Serialize;
use tauri::AppHandle;

use super::{to_ui, with_conn};
use crate::access;
use crate::ai::allocation::{self, Recommendation};
use crate::ai::chat::ChatAssistant;
use crate::ai::{ChatMessage, HttpCompletionBackend};
use crate::db::DatabaseExt;
use crate::models::{Role, Staff};
use crate::store::{settings, staff};

#[derive(Debug, Serialize)]
pub struct AllocationSuggestion {
    pub recommendation: Recommendation,
    /// `None` when the model named someone who is not on the roster.
    pub cleaner: Option<Staff>,
}

fn backend(app: &AppHandle, action: &str) -> Result<HttpCompletionBackend, String> {
    to_ui(action, HttpCompletionBackend::from_config(&app.app_config().ai))
}

#[tauri::command]
pub async fn suggest_allocation(
    app: AppHandle,
    job_description: String,
) -> Result<AllocationSuggestion, String> {
    // Read the roster up front; the lock must not be held across the request.
    let roster = with_conn(&app, "suggest_allocation", |conn| {
        staff::list_staff(conn, false)
    })?;
    let backend = backend(&app, "suggest_allocation")?;

    let recommendation = to_ui(
        "suggest_allocation",
        allocation::suggest_allocation(&backend, &job_description, &roster).await,
    )?;
    let cleaner = recommendation.resolve(&roster).cloned();

    Ok(AllocationSuggestion {
        recommendation,
        cleaner,
    })
}

#[tauri::command]
pub async fn chat_reply(
    app: AppHandle,
    history: Vec<ChatMessage>,
    message: String,
) -> Result<String, String> {
    let company = with_conn(&app, "chat_reply", |conn| {
        settings::get_setting(conn, settings::COMPANY_NAME)
    })?
    .unwrap_or_else(|| "our company".to_string());
    let backend = backend(&app, "chat_reply")?;

    let assistant = ChatAssistant::new(company);
    to_ui(
        "chat_reply",
        assistant.reply(&backend, &history, &message).await,
    )
}

#[tauri::command]
pub fn resolve_user_role(app: AppHandle, email: String, stored_role: Option<Role>) -> Role {
    access::resolve_role(app.app_config(), &email, stored_role)
}
