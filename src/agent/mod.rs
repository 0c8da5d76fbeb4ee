#[cfg(test)]
pub mod fakes;
pub mod image;
pub mod text;

use std::future::Future;

use futures_util::stream::BoxStream;
use rig::message::Message as RigMessage;
use rig::providers::openai;
use tracing::error;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::{Message, MessageRole};

pub use image::OpenAiImageService;
pub use text::OpenAiTextService;

/// One incremental piece of text from the completion stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFragment {
    pub text: String,
}

impl TextFragment {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Lazy, finite, non-restartable sequence of fragments for one user message.
pub type FragmentStream = BoxStream<'static, Result<TextFragment, AppError>>;

/// Streaming text-completion collaborator.
pub trait TextStreamService: Send + Sync + 'static {
    /// Opens a completion stream for `message`, with `history` replayed as context.
    fn send_text_stream(
        &self,
        history: &[Message],
        message: &str,
    ) -> impl Future<Output = Result<FragmentStream, AppError>> + Send;
}

/// One-shot image-generation collaborator.
pub trait ImageService: Send + Sync + 'static {
    /// Returns a reference the renderer can display directly (a `data:` URL).
    fn generate_image(&self, prompt: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Builds a rig [`RigMessage`] history list from the text part of the conversation.
/// Image requests (the user prompt and the model placeholder answering it)
/// are not part of the chat context.
pub fn to_rig_history(messages: &[Message]) -> Vec<RigMessage> {
    messages
        .iter()
        .enumerate()
        .filter(|(i, m)| {
            let answered_by_image = m.role == MessageRole::User
                && messages.get(i + 1).is_some_and(Message::is_image_exchange);
            !m.is_image_exchange() && !answered_by_image
        })
        .map(|(_, m)| match m.role {
            MessageRole::User => RigMessage::user(&m.text),
            MessageRole::Model => RigMessage::assistant(&m.text),
        })
        .collect()
}

pub(crate) fn build_client(config: &AppConfig) -> Result<openai::Client, AppError> {
    let mut builder = openai::Client::builder().api_key(config.api_key.as_str());
    if let Some(base_url) = &config.api_base_url {
        builder = builder.base_url(base_url.as_str());
    }
    builder.build().map_err(|e| {
        error!("Failed to build provider client: {e}");
        AppError::config("OPENAI_API_BASE_URL", e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_skips_image_exchanges() {
        let mut placeholder = Message::image_placeholder("a red ball");
        placeholder.is_loading_image = false;
        placeholder.text = "Here is your image.".to_string();

        let messages = vec![
            Message::user("hello"),
            Message::model("hi there"),
            Message::user("a red ball"),
            placeholder,
            Message::user("how are you?"),
        ];

        let history = to_rig_history(&messages);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn history_of_empty_conversation_is_empty() {
        assert!(to_rig_history(&[]).is_empty());
    }
}
