//! Process-wide `meeting code -> media room` registry.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use parley_core::models::MeetingId;
use parley_core::Result;
use parley_sfu::WorkerPool;

use super::room::MediaRoom;

pub struct RoomRegistry {
    pool: Arc<WorkerPool>,
    rooms: DashMap<String, Arc<MediaRoom>>,
}

impl RoomRegistry {
    pub fn new(pool: Arc<WorkerPool>) -> Self {
        Self {
            pool,
            rooms: DashMap::new(),
        }
    }

    pub fn get(&self, meeting_code: &str) -> Option<Arc<MediaRoom>> {
        self.rooms.get(meeting_code).map(|r| Arc::clone(r.value()))
    }

    /// Existing room, or a fresh one on the next pool worker. Two racing
    /// creators resolve to whichever insert lands first; the loser's room
    /// drops unused.
    pub async fn get_or_create(
        &self,
        meeting_id: &MeetingId,
        meeting_code: &str,
    ) -> Result<Arc<MediaRoom>> {
        if let Some(room) = self.get(meeting_code) {
            return Ok(room);
        }

        let room = MediaRoom::create(
            meeting_id.clone(),
            meeting_code.to_string(),
            Arc::clone(&self.pool),
        )
        .await?;

        let entry = self
            .rooms
            .entry(meeting_code.to_string())
            .or_insert_with(|| Arc::clone(&room));
        Ok(Arc::clone(entry.value()))
    }

    /// Remove the room from the map (end-meeting). The caller closes it.
    pub fn remove(&self, meeting_code: &str) -> Option<Arc<MediaRoom>> {
        self.rooms.remove(meeting_code).map(|(_, room)| room)
    }

    /// Drop the room once its last peer left.
    pub fn remove_if_empty(&self, meeting_code: &str) {
        let removed = self
            .rooms
            .remove_if(meeting_code, |_, room| room.is_empty());
        if removed.is_some() {
            debug!(meeting_code, "Removed empty media room");
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Close every room; used by graceful shutdown.
    pub fn close_all(&self) {
        for entry in self.rooms.iter() {
            entry.value().close();
        }
        self.rooms.clear();
    }
}
