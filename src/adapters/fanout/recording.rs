//! Recording fan-out for tests and headless runs.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::foundation::UserId;
use crate::domain::realtime::{RoomName, ServerEvent};
use crate::ports::{FanoutError, RealtimeFanout};

/// Keeps every emitted `(room, event)` pair instead of delivering it.
#[derive(Default)]
pub struct RecordingFanout {
    emitted: Mutex<Vec<(RoomName, ServerEvent)>>,
    unavailable: Mutex<bool>,
}

impl RecordingFanout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every emit fails with `FanoutError::Unavailable` until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap_or_else(|e| e.into_inner()) = unavailable;
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(RoomName, ServerEvent)>> {
        self.emitted.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn emitted(&self) -> Vec<(RoomName, ServerEvent)> {
        self.lock().clone()
    }

    /// Events sent to `room`, oldest first.
    pub fn events_for(&self, room: &RoomName) -> Vec<ServerEvent> {
        self.lock()
            .iter()
            .filter(|(r, _)| r == room)
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn events_for_user(&self, user: &UserId) -> Vec<ServerEvent> {
        self.events_for(&RoomName::user(user))
    }

    /// Wire names of the events sent to `room`.
    pub fn names_for(&self, room: &RoomName) -> Vec<&'static str> {
        self.events_for(room).iter().map(ServerEvent::name).collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[async_trait]
impl RealtimeFanout for RecordingFanout {
    async fn emit_to_room(
        &self,
        room: &RoomName,
        event: ServerEvent,
    ) -> Result<usize, FanoutError> {
        if *self.unavailable.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(FanoutError::Unavailable("recording fan-out disabled".into()));
        }
        self.lock().push((room.clone(), event));
        Ok(1)
    }
}
