use super::{ChatMessage, ChatRole, CompletionBackend};
use crate::error::{AppError, Result};

/// Earlier turns sent along with a new message.
pub const MAX_HISTORY: usize = 20;

pub struct ChatAssistant {
    company_name: String,
}

impl ChatAssistant {
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
        }
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are the business assistant for {}, a cleaning services company. \
             Help with scheduling, quoting, invoicing, staff and purchasing questions. \
             Prices are in Australian dollars. Be brief and practical.",
            self.company_name
        )
    }

    /// Messages for one turn: system prompt, the most recent user/assistant
    /// history, then the new message.
    pub fn build_messages(&self, history: &[ChatMessage], message: &str) -> Vec<ChatMessage> {
        let turns: Vec<&ChatMessage> = history
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .collect();
        let skip = turns.len().saturating_sub(MAX_HISTORY);

        let mut messages = Vec::with_capacity(MAX_HISTORY + 2);
        messages.push(ChatMessage::system(self.system_prompt()));
        messages.extend(turns.into_iter().skip(skip).cloned());
        messages.push(ChatMessage::user(message.trim()));
        messages
    }

    pub async fn reply<B: CompletionBackend>(
        &self,
        backend: &B,
        history: &[ChatMessage],
        message: &str,
    ) -> Result<String> {
        if message.trim().is_empty() {
            return Err(AppError::validation("Message is empty"));
        }

        let messages = self.build_messages(history, message);
        tracing::debug!(turns = messages.len(), "Sending chat turn");
        backend.complete(&messages).await
    }
}
