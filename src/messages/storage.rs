use super::types::Message;
use parking_lot::RwLock;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct MessageStorage {
    messages: Arc<RwLock<Vec<Message>>>,
}

impl MessageStorage {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn add(&self, message: Message) {
        self.messages.write().push(message);
    }

    pub fn get(&self, id: Uuid) -> Option<Message> {
        self.messages.read().iter().find(|m| m.id == id).cloned()
    }

    pub fn get_all(&self) -> Vec<Message> {
        self.messages.read().clone()
    }

    /// Apply an in-place edit to one message, e.g. to clear its loading
    /// flag once the reply text arrives.
    pub fn update(&self, id: Uuid, edit: impl FnOnce(&mut Message)) -> bool {
        let mut messages = self.messages.write();
        match messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                edit(message);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.messages.read().iter().any(|m| m.id == id)
    }

    pub fn clear(&self) {
        self.messages.write().clear();
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }
}

impl Default for MessageStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::MessageKind;

    #[test]
    fn test_add_and_get() {
        let storage = MessageStorage::new();
        let message = Message::new(MessageKind::User, "hi");
        let id = message.id;

        storage.add(message);
        assert_eq!(storage.len(), 1);
        assert!(storage.contains(id));
        assert_eq!(storage.get(id).unwrap().content, "hi");
    }

    #[test]
    fn test_update_clears_loading() {
        let storage = MessageStorage::new();
        let message = Message::new(MessageKind::Bot, "").loading();
        let id = message.id;
        storage.add(message);

        let updated = storage.update(id, |m| {
            m.content = "done".to_string();
            m.is_loading = false;
        });

        assert!(updated);
        let message = storage.get(id).unwrap();
        assert_eq!(message.content, "done");
        assert!(!message.is_loading);
    }

    #[test]
    fn test_update_unknown_id() {
        let storage = MessageStorage::new();
        assert!(!storage.update(Uuid::new_v4(), |_| {}));
    }

    #[test]
    fn test_clear() {
        let storage = MessageStorage::new();
        storage.add(Message::new(MessageKind::User, "one"));
        storage.add(Message::new(MessageKind::Bot, "two"));
        assert_eq!(storage.len(), 2);

        storage.clear();
        assert!(storage.is_empty());
    }
}
