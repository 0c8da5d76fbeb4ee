use crate::errors::AppError;
use crate::models::Message;
use crate::store::message_store::MessageStore;

pub const IMAGE_READY_TEXT: &str = "Here is your image.";

/// Validates an image description; blank prompts never reach the provider.
pub fn validate_prompt(prompt: &str) -> Result<&str, AppError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::EmptyInput { field_name: "prompt".to_string() });
    }
    Ok(prompt)
}

/// An outstanding image request, tied to its placeholder message.
///
/// Resolving consumes the request, so the loading flag is cleared exactly once.
#[derive(Debug)]
pub struct ImageRequest {
    placeholder_id: String,
}

impl ImageRequest {
    pub fn start(store: &mut MessageStore, prompt: &str) -> Self {
        let placeholder_id = store.append(Message::image_placeholder(prompt)).id.clone();
        Self { placeholder_id }
    }

    pub fn placeholder_id(&self) -> &str {
        &self.placeholder_id
    }

    pub fn succeed(self, store: &mut MessageStore, image_url: String) -> Result<(), AppError> {
        store.update(&self.placeholder_id, |m| {
            m.image_url = Some(image_url);
            m.text = IMAGE_READY_TEXT.to_string();
            m.is_loading_image = false;
        })?;
        Ok(())
    }

    pub fn fail(self, store: &mut MessageStore, detail: &str) -> Result<(), AppError> {
        store.update(&self.placeholder_id, |m| {
            m.text = format!("Sorry, I couldn't create that image.\nError: {detail}");
            m.is_loading_image = false;
        })?;
        Ok(())
    }
}
