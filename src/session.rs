use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_sessions::Session;
use uuid::Uuid;

/// Session-store key holding the whole [`ClientSession`] record.
pub const CLIENT_KEY: &str = "client";

/// Returned by [`ClientSession::join`] when the session is already active in
/// a different room. Carries the room the session is stuck in.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("already active in room {0}")]
pub struct RoomConflict(pub Uuid);

/// Per-client chat state, persisted in the session store between requests.
///
/// `active_room` is `None` or exactly one room; a client has to leave before
/// it can join somewhere else. `cursor` is the highest message id already
/// delivered to this client and only ever moves forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSession {
    pub user_id: i64,
    pub username: String,
    pub active_room: Option<Uuid>,
    pub cursor: u64,
}

impl ClientSession {
    pub fn new(user_id: i64, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            active_room: None,
            cursor: 0,
        }
    }

    /// Joins a room, resetting the cursor so the full history counts as new.
    /// Re-joining the current room is a no-op and keeps the cursor.
    pub fn join(&mut self, room_id: Uuid) -> Result<(), RoomConflict> {
        match self.active_room {
            Some(current) if current == room_id => Ok(()),
            Some(current) => Err(RoomConflict(current)),
            None => {
                self.active_room = Some(room_id);
                self.cursor = 0;
                Ok(())
            }
        }
    }

    pub fn leave(&mut self) {
        self.active_room = None;
        self.cursor = 0;
    }

    /// Advances the cursor to `up_to`. Never regresses, so overlapping polls
    /// cannot roll the read position back.
    pub fn record_delivery(&mut self, up_to: u64) {
        self.cursor = self.cursor.max(up_to);
    }

    /// Loads the record for an authenticated client, `None` when nobody is
    /// logged in on this session.
    pub async fn load(session: &Session) -> Result<Option<Self>, tower_sessions::session::Error> {
        session.get::<Self>(CLIENT_KEY).await
    }

    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(CLIENT_KEY, self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_conflicts_with_a_different_room() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let mut client = ClientSession::new(1, "u1");

        client.join(a).unwrap();
        assert_eq!(client.join(b), Err(RoomConflict(a)));
        assert_eq!(client.active_room, Some(a));
    }

    #[test]
    fn rejoining_same_room_keeps_cursor() {
        let a = Uuid::now_v7();
        let mut client = ClientSession::new(1, "u1");

        client.join(a).unwrap();
        client.record_delivery(7);
        client.join(a).unwrap();

        assert_eq!(client.cursor, 7);
    }

    #[test]
    fn join_resets_cursor() {
        let a = Uuid::now_v7();
        let mut client = ClientSession::new(1, "u1");
        client.cursor = 42;

        client.join(a).unwrap();
        assert_eq!(client.cursor, 0);
    }

    #[test]
    fn leave_clears_membership_and_cursor() {
        let a = Uuid::now_v7();
        let mut client = ClientSession::new(1, "u1");
        client.join(a).unwrap();
        client.record_delivery(3);

        client.leave();
        assert_eq!(client.active_room, None);
        assert_eq!(client.cursor, 0);

        // Leaving while unjoined stays a no-op.
        client.leave();
        assert_eq!(client.active_room, None);
    }

    #[test]
    fn record_delivery_never_regresses() {
        let mut client = ClientSession::new(1, "u1");
        client.record_delivery(5);
        client.record_delivery(3);

        assert_eq!(client.cursor, 5);
    }
}
