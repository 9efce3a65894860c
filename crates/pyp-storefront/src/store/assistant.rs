use pyp_assistant::{ChatRole, ChatTurn, RECIPE_APOLOGY};

use crate::error::StoreError;
use crate::shipping::ShipmentProvider;

use super::Storefront;

/// Shown in the conversation when the support chat call fails.
pub const CHAT_APOLOGY: &str = "Sorry, I encountered an error. Please try again later.";

impl<S: ShipmentProvider> Storefront<S> {
    /// The PickleBot conversation so far, opening with its greeting.
    #[must_use]
    pub fn chat_history(&self) -> &[ChatTurn] {
        &self.chat_history
    }

    /// Send a support message and return the reply. On failure the apology is
    /// appended to the conversation instead.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for a blank message, or the API
    /// failure.
    pub async fn chat(&mut self, message: &str) -> Result<String, StoreError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(StoreError::Validation("message is required".to_string()));
        }

        let result = self.api.chat(&self.chat_history, message).await;
        self.chat_history.push(ChatTurn {
            role: ChatRole::User,
            text: message.to_string(),
        });

        match result {
            Ok(reply) => {
                self.chat_history.push(ChatTurn {
                    role: ChatRole::Model,
                    text: reply.clone(),
                });
                Ok(reply)
            }
            Err(e) => {
                self.chat_history.push(ChatTurn {
                    role: ChatRole::Model,
                    text: CHAT_APOLOGY.to_string(),
                });
                Err(self.report(e))
            }
        }
    }

    /// Meal pairings for a pickle. Never fails.
    pub async fn recipe(&self, pickle_name: &str) -> String {
        match self.api.recipe(pickle_name).await {
            Ok(recipe) => recipe,
            Err(e) => {
                tracing::warn!(error = %e, pickle = pickle_name, "recipe request failed");
                RECIPE_APOLOGY.to_string()
            }
        }
    }
}
