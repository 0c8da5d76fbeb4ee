use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Model,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Model => "model",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the conversation.
///
/// Only model messages ever carry image state; user messages are built
/// through [`Message::user`] which leaves those fields empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_loading_image: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(role: MessageRole, text: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            text,
            image_url: None,
            is_loading_image: false,
            prompt: None,
            created_at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, text.into())
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Model, text.into())
    }

    /// Optimistic model message shown while an image is being generated.
    pub fn image_placeholder(prompt: &str) -> Self {
        Self {
            is_loading_image: true,
            prompt: Some(prompt.to_string()),
            ..Self::model(format!("Creating an image of: \"{prompt}\""))
        }
    }

    /// True for messages that belong to an image request rather than the text chat.
    pub fn is_image_exchange(&self) -> bool {
        self.prompt.is_some() || self.image_url.is_some() || self.is_loading_image
    }
}

/// Selects which handler serves the next submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppMode {
    #[default]
    Chat,
    Image,
}

impl AppMode {
    pub const ALL: [AppMode; 2] = [AppMode::Chat, AppMode::Image];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppMode::Chat => "chat",
            AppMode::Image => "image",
        }
    }

    /// Placeholder text for the input box in this mode.
    pub fn input_hint(&self) -> &'static str {
        match self {
            AppMode::Chat => "Type a message…",
            AppMode::Image => "Describe an image to create, e.g., \"a cat in a spaceship\"",
        }
    }
}

impl std::fmt::Display for AppMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a renderer needs to draw the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub messages: Vec<Message>,
    pub busy: bool,
    pub error: Option<String>,
    pub mode: AppMode,
    pub input_hint: &'static str,
}

/// WebSocket request sent by the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsClientEvent {
    Submit { message: String },
    SetMode { mode: AppMode },
}

/// WebSocket event pushed to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsEvent {
    Snapshot(SessionSnapshot),
    Error { message: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub text_model: String,
    pub image_model: String,
    pub modes: Vec<AppMode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_loading_model_message_with_prompt() {
        let msg = Message::image_placeholder("a red ball");
        assert_eq!(msg.role, MessageRole::Model);
        assert!(msg.is_loading_image);
        assert_eq!(msg.image_url, None);
        assert_eq!(msg.prompt.as_deref(), Some("a red ball"));
        assert_eq!(msg.text, "Creating an image of: \"a red ball\"");
        assert!(msg.is_image_exchange());
    }

    #[test]
    fn user_message_has_no_image_state() {
        let msg = Message::user("hi");
        assert_eq!(msg.role, MessageRole::User);
        assert!(!msg.is_loading_image);
        assert!(msg.image_url.is_none());
        assert!(!msg.is_image_exchange());
    }

    #[test]
    fn ids_are_fresh() {
        assert_ne!(Message::model("a").id, Message::model("a").id);
    }

    #[test]
    fn message_serializes_camel_case() {
        let mut msg = Message::image_placeholder("sky");
        msg.image_url = Some("data:image/png;base64,AAAA".to_string());
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "model");
        assert_eq!(json["isLoadingImage"], true);
        assert_eq!(json["imageUrl"], "data:image/png;base64,AAAA");
        assert_eq!(json["prompt"], "sky");
    }

    #[test]
    fn client_events_parse_from_tagged_json() {
        let submit: WsClientEvent =
            serde_json::from_str(r#"{"type":"submit","message":"hello"}"#).unwrap();
        assert!(matches!(submit, WsClientEvent::Submit { message } if message == "hello"));

        let mode: WsClientEvent =
            serde_json::from_str(r#"{"type":"set_mode","mode":"image"}"#).unwrap();
        assert!(matches!(mode, WsClientEvent::SetMode { mode: AppMode::Image }));
    }
}
