use crate::room::Room;
use signalroom_core::RoomId;
use std::collections::HashMap;

/// All live rooms, stored in an arena of slots with a key → slot index.
///
/// The registry does not police its own invariant: a room must be removed by
/// the caller as soon as it becomes empty, and only then.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    slots: Vec<Option<Room>>,
    index: HashMap<RoomId, usize>,
    free: Vec<usize>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, room_id: &RoomId) -> &mut Room {
        let slot = match self.index.get(room_id) {
            Some(&slot) => slot,
            None => {
                let slot = self.allocate();
                self.index.insert(room_id.clone(), slot);
                slot
            }
        };

        self.slots[slot].get_or_insert_with(|| Room::new(room_id.clone()))
    }

    pub fn get(&self, room_id: &str) -> Option<&Room> {
        let slot = *self.index.get(room_id)?;
        self.slots.get(slot)?.as_ref()
    }

    pub fn get_mut(&mut self, room_id: &str) -> Option<&mut Room> {
        let slot = *self.index.get(room_id)?;
        self.slots.get_mut(slot)?.as_mut()
    }

    pub fn remove(&mut self, room_id: &str) -> Option<Room> {
        let slot = self.index.remove(room_id)?;
        let room = self.slots.get_mut(slot)?.take();
        self.free.push(slot);
        room
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.index.contains_key(room_id)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn room_ids(&self) -> impl Iterator<Item = &RoomId> {
        self.index.keys()
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.slots.iter().flatten()
    }

    fn allocate(&mut self) -> usize {
        if let Some(slot) = self.free.pop() {
            return slot;
        }
        self.slots.push(None);
        self.slots.len() - 1
    }
}
