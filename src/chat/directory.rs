use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use uuid::Uuid;

use super::ChatError;

/// A live chat room. `owner` is informational; it grants no extra rights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub owner: i64,
}

#[derive(Default)]
struct Index {
    rooms: HashMap<Uuid, Room>,
    names: HashMap<String, Uuid>,
}

/// Registry of live rooms. Room names are unique among live rooms; the
/// uniqueness check and the insert sit in one critical section so two
/// concurrent creates with the same name can never both succeed.
pub struct RoomDirectory {
    inner: Mutex<Index>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Index::default()),
        }
    }

    pub fn create(&self, name: &str, owner: i64) -> Result<Room, ChatError> {
        self.create_with_id(Uuid::now_v7(), name, owner)
    }

    /// Registers a room under a caller-supplied id. The gateway pre-allocates
    /// the id so the room's message log can exist before the room is visible
    /// to anyone else.
    pub fn create_with_id(&self, id: Uuid, name: &str, owner: i64) -> Result<Room, ChatError> {
        let mut index = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if index.names.contains_key(name) {
            return Err(ChatError::NameConflict(name.to_owned()));
        }

        let room = Room {
            id,
            name: name.to_owned(),
            owner,
        };
        index.names.insert(room.name.clone(), room.id);
        index.rooms.insert(room.id, room.clone());
        Ok(room)
    }

    pub fn get(&self, room_id: Uuid) -> Option<Room> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .rooms
            .get(&room_id)
            .cloned()
    }

    /// Every live room, in no particular order.
    pub fn list(&self) -> Vec<Room> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .rooms
            .values()
            .cloned()
            .collect()
    }

    /// Removes a room, freeing its name. Returns `None` when the room was
    /// already gone, which makes double deletes harmless.
    pub fn remove(&self, room_id: Uuid) -> Option<Room> {
        let mut index = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let room = index.rooms.remove(&room_id)?;
        index.names.remove(&room.name);
        Some(room)
    }
}

impl Default for RoomDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn create_rejects_duplicate_name() {
        let dir = RoomDirectory::new();
        dir.create("lobby", 1).unwrap();

        let err = dir.create("lobby", 2).unwrap_err();
        assert_eq!(err, ChatError::NameConflict("lobby".to_owned()));
        assert_eq!(dir.list().len(), 1);
    }

    #[test]
    fn name_is_free_again_after_remove() {
        let dir = RoomDirectory::new();
        let room = dir.create("lobby", 1).unwrap();
        dir.remove(room.id);

        assert!(dir.create("lobby", 2).is_ok());
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = RoomDirectory::new();
        let room = dir.create("lobby", 1).unwrap();

        assert!(dir.remove(room.id).is_some());
        assert!(dir.remove(room.id).is_none());
        assert!(dir.get(room.id).is_none());
    }

    #[test]
    fn concurrent_creates_with_same_name_admit_exactly_one() {
        let dir = Arc::new(RoomDirectory::new());

        let handles: Vec<_> = (0..8i64)
            .map(|i| {
                let dir = Arc::clone(&dir);
                std::thread::spawn(move || dir.create("lobby", i).is_ok())
            })
            .collect();
        let wins: usize = handles
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();

        assert_eq!(wins, 1);
        assert_eq!(
            dir.list().iter().filter(|r| r.name == "lobby").count(),
            1
        );
    }
}
