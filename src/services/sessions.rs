use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{MessageSession, UserId},
};

/// Unordered pair key: `(a, b)` and `(b, a)` map to the same entry
fn pair_key(a: UserId, b: UserId) -> (UserId, UserId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Chat sessions between matched readers, one per pair
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<(UserId, UserId), MessageSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a room for the pair, or reuses and touches the existing one
    pub async fn connect(&self, user_id: UserId, other_user_id: UserId) -> AppResult<MessageSession> {
        if user_id == other_user_id {
            return Err(AppError::InvalidInput(
                "Cannot open a session with yourself".to_string(),
            ));
        }

        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(pair_key(user_id, other_user_id))
            .and_modify(MessageSession::touch)
            .or_insert_with(|| MessageSession::open(user_id, other_user_id));

        tracing::info!(
            user_id = %user_id,
            other_user_id = %other_user_id,
            room = %session.room,
            count = session.count,
            "Session connected"
        );

        Ok(session.clone())
    }

    pub async fn get(&self, a: UserId, b: UserId) -> Option<MessageSession> {
        self.sessions.read().await.get(&pair_key(a, b)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message_session::ROOM_NAME_LEN;

    #[tokio::test]
    async fn test_first_connect_opens_room() {
        let registry = SessionRegistry::new();
        let session = registry.connect(UserId(1), UserId(2)).await.unwrap();

        assert_eq!(session.count, 0);
        assert_eq!(session.room.len(), ROOM_NAME_LEN);
        assert!(session.updated.is_none());
        assert_eq!(registry.get(UserId(1), UserId(2)).await, Some(session));
    }

    #[tokio::test]
    async fn test_reconnect_in_either_direction_reuses_room() {
        let registry = SessionRegistry::new();
        let first = registry.connect(UserId(1), UserId(2)).await.unwrap();
        let second = registry.connect(UserId(2), UserId(1)).await.unwrap();
        let third = registry.connect(UserId(1), UserId(2)).await.unwrap();

        assert_eq!(first.room, second.room);
        assert_eq!(second.room, third.room);
        assert_eq!(second.count, 1);
        assert_eq!(third.count, 2);
        assert!(third.updated.is_some());
        assert_eq!(third.user_a, UserId(1));
    }

    #[tokio::test]
    async fn test_distinct_pairs_get_distinct_rooms() {
        let registry = SessionRegistry::new();
        let a = registry.connect(UserId(1), UserId(2)).await.unwrap();
        let b = registry.connect(UserId(1), UserId(3)).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_self_connection_is_rejected() {
        let registry = SessionRegistry::new();
        let result = registry.connect(UserId(4), UserId(4)).await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert!(registry.get(UserId(4), UserId(4)).await.is_none());
    }
}
