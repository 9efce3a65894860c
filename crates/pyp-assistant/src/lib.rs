//! Gemini-backed helpers: the PickleBot support chat and recipe suggestions.

pub mod client;
pub mod context;
pub mod error;
pub mod types;

pub use client::GeminiClient;
pub use context::{build_support_context, support_instruction, ChatRole, ChatTurn, GREETING};
pub use error::AssistantError;

use types::{Content, GenerateRequest, GenerationConfig};

const TEMPERATURE: f32 = 0.7;

pub const RECIPE_APOLOGY: &str =
    "Sorry, our AI Chef is currently on a break! Please try again later.";
pub const RECIPE_EMPTY: &str = "Could not generate recipe at this time.";
pub const CHAT_EMPTY: &str = "I didn't catch that. Could you repeat?";

const CHEF_INSTRUCTION: &str = "You are an expert Indian Chef. You love traditional flavors.";

/// Answer a support message given the earlier turns and the knowledge
/// context.
///
/// System turns in `history` are dropped; every other turn is replayed with
/// its role.
///
/// # Errors
///
/// Returns [`AssistantError`] if the Gemini call fails.
pub async fn support_reply(
    client: &GeminiClient,
    history: &[ChatTurn],
    message: &str,
    context: &str,
) -> Result<String, AssistantError> {
    let mut contents: Vec<Content> = history
        .iter()
        .filter_map(|turn| match turn.role {
            ChatRole::System => None,
            ChatRole::Model => Some(Content::model(&turn.text)),
            ChatRole::User => Some(Content::user(&turn.text)),
        })
        .collect();
    contents.push(Content::user(message));

    let request = GenerateRequest {
        system_instruction: Some(Content::plain(support_instruction(context))),
        contents,
        generation_config: GenerationConfig {
            temperature: TEMPERATURE,
        },
    };

    let response = client.generate(&request).await?;
    Ok(response.text().unwrap_or_else(|| CHAT_EMPTY.to_string()))
}

/// Three meal pairings for a named pickle.
///
/// Never fails: provider errors are logged and replaced by [`RECIPE_APOLOGY`].
pub async fn recipe_suggestion(client: &GeminiClient, pickle_name: &str) -> String {
    let request = GenerateRequest {
        system_instruction: Some(Content::plain(CHEF_INSTRUCTION)),
        contents: vec![Content::user(format!(
            "I have a jar of \"{pickle_name}\". Suggest 3 creative or traditional Indian meal \
             combinations (breakfast, lunch, or dinner) that pair perfectly with this specific \
             pickle. Keep it appetizing and concise. Format as a simple list."
        ))],
        generation_config: GenerationConfig {
            temperature: TEMPERATURE,
        },
    };

    match client.generate(&request).await {
        Ok(response) => response.text().unwrap_or_else(|| RECIPE_EMPTY.to_string()),
        Err(e) => {
            tracing::warn!(error = %e, pickle = pickle_name, "recipe suggestion failed");
            RECIPE_APOLOGY.to_string()
        }
    }
}
