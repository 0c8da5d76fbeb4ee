use crate::agent::TextFragment;
use crate::errors::AppError;
use crate::models::Message;
use crate::store::message_store::MessageStore;

/// Folds the fragments of one completion stream into a single model message.
///
/// The message is created on the first fragment; every later fragment
/// rewrites the same message (matched by id) with the accumulated text.
#[derive(Debug, Default)]
pub struct StreamMerge {
    message_id: Option<String>,
    text: String,
}

impl StreamMerge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, store: &mut MessageStore, fragment: &TextFragment) -> Result<(), AppError> {
        self.text.push_str(&fragment.text);
        match &self.message_id {
            None => {
                let id = store.append(Message::model(self.text.clone())).id.clone();
                self.message_id = Some(id);
            }
            Some(id) => {
                let text = &self.text;
                store.update(id, |m| m.text.clone_from(text))?;
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Id of the merged message, or [`AppError::EmptyResponse`] if no fragment ever arrived.
    pub fn finish(self) -> Result<String, AppError> {
        self.message_id.ok_or(AppError::EmptyResponse)
    }
}
