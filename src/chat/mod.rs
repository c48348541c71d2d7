mod directory;
mod log;

pub use directory::{Room, RoomDirectory};
pub use log::{Message, MessageLog};

use thiserror::Error;
use uuid::Uuid;

use crate::session::ClientSession;

/// Longest accepted message, in characters.
pub const MAX_CONTENT_LEN: usize = 256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("a room named {0:?} already exists")]
    NameConflict(String),

    #[error("you're already in another room; leave it first")]
    AlreadyInOtherRoom,

    #[error("no such room")]
    RoomNotFound,

    #[error("that room no longer exists")]
    RoomGone,

    #[error("message exceeds {MAX_CONTENT_LEN} characters")]
    ContentTooLong,

    #[error("join a room first")]
    NotInRoom,
}

/// The chat operation surface. Owns the room registry and the message log;
/// handlers call into it with the caller's [`ClientSession`] and persist the
/// session afterwards.
pub struct ChatCore {
    directory: RoomDirectory,
    log: MessageLog,
}

impl ChatCore {
    pub fn new() -> Self {
        Self {
            directory: RoomDirectory::new(),
            log: MessageLog::new(),
        }
    }

    /// Creates a room and joins the creator to it. Mirrors the create-then-join
    /// flow of the UI: if the creator is still active elsewhere the room is
    /// created but the join fails, same as joining it by hand would.
    pub fn create_room(&self, client: &mut ClientSession, name: &str) -> Result<Room, ChatError> {
        // The log entry goes in first: the moment the directory lists the
        // room, another client may join and send, and that append must find
        // a log to land in.
        let room_id = Uuid::now_v7();
        self.log.register(room_id);
        let room = match self.directory.create_with_id(room_id, name, client.user_id) {
            Ok(room) => room,
            Err(err) => {
                self.log.delete_all(room_id);
                return Err(err);
            }
        };
        tracing::info!(room = %room.name, owner = %client.username, "room created");

        client
            .join(room.id)
            .map_err(|_| ChatError::AlreadyInOtherRoom)?;
        Ok(room)
    }

    pub fn join_room(&self, client: &mut ClientSession, room_id: Uuid) -> Result<Room, ChatError> {
        let room = self.directory.get(room_id).ok_or(ChatError::RoomNotFound)?;
        client
            .join(room.id)
            .map_err(|_| ChatError::AlreadyInOtherRoom)?;
        Ok(room)
    }

    pub fn leave_room(&self, client: &mut ClientSession) {
        client.leave();
    }

    /// Removes a room and its messages as one logical operation. Idempotent:
    /// deleting an unknown room is logged and swallowed. Other sessions still
    /// pointing at the room find out lazily on their next send or poll.
    pub fn delete_room(&self, room_id: Uuid, requester: &str) {
        match self.directory.remove(room_id) {
            Some(room) => {
                self.log.delete_all(room.id);
                tracing::info!(room = %room.name, by = %requester, "room deleted");
            }
            None => {
                tracing::warn!(%room_id, by = %requester, "delete of unknown room ignored");
            }
        }
    }

    pub fn list_rooms(&self) -> Vec<Room> {
        self.directory.list()
    }

    /// Appends a message to the caller's active room.
    ///
    /// If the room was deleted out from under the caller, membership is
    /// cleared here and `RoomGone` tells the client to go back to the room
    /// list. Over-length content is rejected outright rather than truncated;
    /// a silent cut would lose data the sender never learns about.
    pub fn send_message(&self, client: &mut ClientSession, content: &str) -> Result<Message, ChatError> {
        let room_id = client.active_room.ok_or(ChatError::NotInRoom)?;

        if self.directory.get(room_id).is_none() {
            client.leave();
            return Err(ChatError::RoomGone);
        }
        if content.chars().count() > MAX_CONTENT_LEN {
            return Err(ChatError::ContentTooLong);
        }

        match self.log.append(room_id, &client.username, content) {
            Ok(msg) => Ok(msg),
            // Deletion won the race between the existence check and the
            // append; recover the same way.
            Err(ChatError::RoomNotFound) => {
                client.leave();
                Err(ChatError::RoomGone)
            }
            Err(other) => Err(other),
        }
    }

    /// Full history of the active room, marking everything as seen. Meant for
    /// room entry; the steady-state loop uses [`ChatCore::poll_delta`].
    pub fn poll_full(&self, client: &mut ClientSession) -> Result<Vec<Message>, ChatError> {
        let room_id = client.active_room.ok_or(ChatError::NotInRoom)?;

        let msgs = self.log.all(room_id);
        if let Some(last) = msgs.last() {
            client.record_delivery(last.id);
        }
        Ok(msgs)
    }

    /// Messages newer than the caller's cursor, advancing the cursor past
    /// them. A room deleted mid-poll yields an empty result instead of an
    /// error; the deletion surfaces on the next send.
    pub fn poll_delta(&self, client: &mut ClientSession) -> Result<Vec<Message>, ChatError> {
        let room_id = client.active_room.ok_or(ChatError::NotInRoom)?;

        if self.directory.get(room_id).is_none() {
            return Ok(Vec::new());
        }

        let msgs = self.log.since(room_id, client.cursor);
        if let Some(last) = msgs.last() {
            client.record_delivery(last.id);
        }
        Ok(msgs)
    }
}

impl Default for ChatCore {
    fn default() -> Self {
        Self::new()
    }
}
