use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::Serialize;
use uuid::Uuid;

use super::ChatError;

/// A single chat message. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: u64,
    pub room_id: Uuid,
    pub sender: String,
    pub content: String,
}

/// Append-only message store, one log per live room.
///
/// Ids come from a single counter shared by every room, so any two messages
/// are ordered by id no matter where they were posted. That is what lets a
/// client track its read position with one integer instead of a set of
/// delivered ids.
pub struct MessageLog {
    rooms: RwLock<HashMap<Uuid, Arc<Mutex<Vec<Message>>>>>,
    next_id: AtomicU64,
}

impl MessageLog {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Makes a room appendable. Called when the room is created.
    pub fn register(&self, room_id: Uuid) {
        self.rooms
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(room_id)
            .or_default();
    }

    /// Appends a message, assigning the next global sequence number.
    ///
    /// Fails with `RoomNotFound` when the room's log has been deleted, which
    /// happens when an append races a room deletion.
    pub fn append(&self, room_id: Uuid, sender: &str, content: &str) -> Result<Message, ChatError> {
        // The read guard is held across the push so `delete_all` (which takes
        // the write lock) cannot interleave with an in-flight append.
        let rooms = self.rooms.read().unwrap_or_else(PoisonError::into_inner);
        let log = rooms.get(&room_id).ok_or(ChatError::RoomNotFound)?;

        let mut log = log.lock().unwrap_or_else(PoisonError::into_inner);
        // Id assignment happens under the per-room lock so each room's vec
        // stays sorted by id; appends to other rooms only share the counter.
        let msg = Message {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            room_id,
            sender: sender.to_owned(),
            content: content.to_owned(),
        };
        log.push(msg.clone());
        Ok(msg)
    }

    /// Every message in the room, ascending by id. Empty for unknown rooms.
    pub fn all(&self, room_id: Uuid) -> Vec<Message> {
        self.since(room_id, 0)
    }

    /// Messages with `id > cursor`, ascending. Cost is proportional to the
    /// number of new messages, not the room's history.
    pub fn since(&self, room_id: Uuid, cursor: u64) -> Vec<Message> {
        let rooms = self.rooms.read().unwrap_or_else(PoisonError::into_inner);
        let Some(log) = rooms.get(&room_id) else {
            return Vec::new();
        };

        let log = log.lock().unwrap_or_else(PoisonError::into_inner);
        let start = log.partition_point(|m| m.id <= cursor);
        log[start..].to_vec()
    }

    /// Drops the room's entire log. Idempotent; part of the room deletion
    /// cascade, never called on its own.
    pub fn delete_all(&self, room_id: Uuid) {
        self.rooms
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&room_id);
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn log_with_room() -> (MessageLog, Uuid) {
        let log = MessageLog::new();
        let room = Uuid::now_v7();
        log.register(room);
        (log, room)
    }

    #[test]
    fn ids_increase_across_rooms() {
        let (log, a) = log_with_room();
        let b = Uuid::now_v7();
        log.register(b);

        let m1 = log.append(a, "u1", "one").unwrap();
        let m2 = log.append(b, "u1", "two").unwrap();
        let m3 = log.append(a, "u2", "three").unwrap();

        assert!(m1.id < m2.id);
        assert!(m2.id < m3.id);
    }

    #[test]
    fn append_to_unknown_room_fails() {
        let log = MessageLog::new();
        let err = log.append(Uuid::now_v7(), "u1", "hi").unwrap_err();
        assert_eq!(err, ChatError::RoomNotFound);
    }

    #[test]
    fn since_returns_only_newer_messages() {
        let (log, room) = log_with_room();
        let first = log.append(room, "u1", "a").unwrap();
        log.append(room, "u1", "b").unwrap();
        log.append(room, "u2", "c").unwrap();

        let newer = log.since(room, first.id);
        let all = log.all(room);

        assert_eq!(newer, all[1..]);
        assert!(newer.iter().all(|m| m.id > first.id));
        assert!(newer.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn since_at_latest_cursor_is_empty() {
        let (log, room) = log_with_room();
        log.append(room, "u1", "a").unwrap();
        let last = log.append(room, "u1", "b").unwrap();

        assert!(log.since(room, last.id).is_empty());
    }

    #[test]
    fn delete_all_removes_every_message() {
        let (log, room) = log_with_room();
        log.append(room, "u1", "a").unwrap();
        log.append(room, "u1", "b").unwrap();

        log.delete_all(room);
        assert!(log.all(room).is_empty());
        assert_eq!(log.append(room, "u1", "c").unwrap_err(), ChatError::RoomNotFound);

        // Second delete is a no-op.
        log.delete_all(room);
    }

    #[test]
    fn concurrent_appends_keep_each_room_sorted() {
        let log = Arc::new(MessageLog::new());
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        log.register(a);
        log.register(b);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let log = Arc::clone(&log);
                let room = if i % 2 == 0 { a } else { b };
                std::thread::spawn(move || {
                    for n in 0..50 {
                        log.append(room, "u", &format!("{i}-{n}")).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let in_a = log.all(a);
        let in_b = log.all(b);
        assert_eq!(in_a.len() + in_b.len(), 400);
        for msgs in [in_a, in_b] {
            assert!(msgs.windows(2).all(|w| w[0].id < w[1].id));
        }
    }
}
