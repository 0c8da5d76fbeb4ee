use futures_util::StreamExt;
use rig::completion::CompletionModel;
use rig::message::Message as RigMessage;
use rig::prelude::CompletionClient;
use rig::providers::openai;
use rig::streaming::StreamedAssistantContent;
use tracing::{debug, error, warn};

use super::{build_client, to_rig_history, FragmentStream, TextFragment, TextStreamService};
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::Message;

const DEFAULT_PREAMBLE: &str = "You are a friendly and helpful assistant. \
                                Be concise and accurate. \
                                If you don't know something, say so.";

/// Streams chat completions through a rig [`openai::Client`].
/// A fresh request is built per submission with the conversation replayed as history.
#[derive(Clone)]
pub struct OpenAiTextService {
    client: openai::Client,
    model: String,
    preamble: String,
}

impl OpenAiTextService {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            client: build_client(config)?,
            model: config.text_model.clone(),
            preamble: config
                .preamble
                .clone()
                .unwrap_or_else(|| DEFAULT_PREAMBLE.to_string()),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl TextStreamService for OpenAiTextService {
    async fn send_text_stream(
        &self,
        history: &[Message],
        message: &str,
    ) -> Result<FragmentStream, AppError> {
        let model = self.client.completion_model(self.model.as_str());
        debug!(model = %self.model, history_len = history.len(), "opening completion stream");

        let response = model
            .completion_request(RigMessage::user(message))
            .messages(to_rig_history(history))
            .preamble(self.preamble.clone())
            .stream()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "failed to open completion stream");
                AppError::service(e.to_string())
            })?;

        let fragments = response.filter_map(|item| async move {
            match item {
                Ok(StreamedAssistantContent::Text(text)) => Some(Ok(TextFragment::new(text.text))),
                // Reasoning, tool calls and the final usage record carry no display text.
                Ok(_) => None,
                Err(e) => {
                    warn!(error = %e, "completion stream emitted an error chunk");
                    Some(Err(AppError::service(e.to_string())))
                }
            }
        });

        Ok(fragments.boxed())
    }
}
