use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

/// Length of generated chat room names
pub const ROOM_NAME_LEN: usize = 12;

/// A chat room shared by two matched readers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageSession {
    pub id: Uuid,
    /// Reader who opened the session first
    pub user_a: UserId,
    pub user_b: UserId,
    /// Room name handed to the chat transport
    pub room: String,
    /// Number of times the pair reconnected after the session was opened
    pub count: u32,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

impl MessageSession {
    /// Opens a new session with a fresh room name
    pub fn open(user_a: UserId, user_b: UserId) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_a,
            user_b,
            room: generate_room_name(),
            count: 0,
            created: Utc::now(),
            updated: None,
        }
    }

    /// Records another connection to the existing room
    pub fn touch(&mut self) {
        self.count += 1;
        self.updated = Some(Utc::now());
    }
}

fn generate_room_name() -> String {
    Uuid::new_v4().simple().to_string()[..ROOM_NAME_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_session() {
        let session = MessageSession::open(UserId(1), UserId(2));
        assert_eq!(session.count, 0);
        assert_eq!(session.room.len(), ROOM_NAME_LEN);
        assert!(session.room.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(session.updated.is_none());
    }

    #[test]
    fn test_touch_increments_count() {
        let mut session = MessageSession::open(UserId(1), UserId(2));
        session.touch();
        session.touch();
        assert_eq!(session.count, 2);
        assert!(session.updated.is_some());
    }

    #[test]
    fn test_room_names_differ() {
        let a = MessageSession::open(UserId(1), UserId(2));
        let b = MessageSession::open(UserId(1), UserId(2));
        assert_ne!(a.room, b.room);
    }
}
