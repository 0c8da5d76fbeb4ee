use tracing::warn;

use crate::errors::AppError;
use crate::models::Message;

/// Ordered, append-only conversation store for one session.
///
/// Messages are looked up by id with a linear scan; replacing one never
/// changes its position.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    #[cfg(test)]
    pub fn find_by_id(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn append(&mut self, message: Message) -> &Message {
        let index = self.messages.len();
        self.messages.push(message);
        &self.messages[index]
    }

    /// Applies `change` to the message with `id` in place.
    pub fn update<F>(&mut self, id: &str, change: F) -> Result<&Message, AppError>
    where
        F: FnOnce(&mut Message),
    {
        let message = self
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| {
                warn!("Update requested for unknown message {id}");
                AppError::MessageNotFound { id: id.to_string() }
            })?;
        change(message);
        Ok(message)
    }

    /// Removes the most recent message, but only if it is the one with `id`.
    /// Used to undo a just-appended user message.
    pub fn rollback_last(&mut self, id: &str) -> Result<Message, AppError> {
        match self.messages.pop() {
            Some(last) if last.id == id => Ok(last),
            Some(other) => {
                self.messages.push(other);
                Err(AppError::MessageNotFound { id: id.to_string() })
            }
            None => Err(AppError::MessageNotFound { id: id.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_preserves_insertion_order() {
        let mut store = MessageStore::new();
        let a = store.append(Message::user("a")).id.clone();
        let b = store.append(Message::model("b")).id.clone();
        let ids: Vec<_> = store.all().iter().map(|m| m.id.clone()).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn update_replaces_in_place_without_reordering() {
        let mut store = MessageStore::new();
        store.append(Message::user("first"));
        let id = store.append(Message::model("He")).id.clone();
        store.append(Message::user("third"));

        store.update(&id, |m| m.text.push_str("llo")).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.all()[1].id, id);
        assert_eq!(store.all()[1].text, "Hello");
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let mut store = MessageStore::new();
        let err = store.update("missing", |_| {}).unwrap_err();
        assert_eq!(err, AppError::MessageNotFound { id: "missing".to_string() });
    }

    #[test]
    fn rollback_only_removes_matching_last_message() {
        let mut store = MessageStore::new();
        let first = store.append(Message::user("one")).id.clone();
        let second = store.append(Message::user("two")).id.clone();

        assert!(store.rollback_last(&first).is_err());
        assert_eq!(store.len(), 2);

        let removed = store.rollback_last(&second).unwrap();
        assert_eq!(removed.text, "two");
        assert_eq!(store.len(), 1);
        assert_eq!(store.last().map(|m| m.id.as_str()), Some(first.as_str()));
    }
}
