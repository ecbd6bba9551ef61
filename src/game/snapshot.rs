//! Snapshot building and delivery

use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use super::entities::{MatchEvent, Pickup, Player};
use super::room::RoomState;

/// Immutable copy of a room's world, produced on the broadcast cadence
#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub room_id: Uuid,
    pub tick: u64,
    pub state: RoomState,
    pub server_time_ms: u64,
    pub players: Vec<Player>,
    pub pickups: Vec<Pickup>,
    pub events: Vec<MatchEvent>,
}

/// Which events a snapshot carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventWindow {
    /// The whole match log
    #[default]
    Full,
    /// Only events appended since the previous snapshot
    SinceLastSnapshot,
}

/// Destination for snapshots. Implementations must not block the caller.
pub trait SnapshotSink: Send + Sync {
    fn deliver(&self, snapshot: WorldSnapshot);
}

impl SnapshotSink for broadcast::Sender<WorldSnapshot> {
    fn deliver(&self, snapshot: WorldSnapshot) {
        // No subscribers is not an error
        let _ = self.send(snapshot);
    }
}

impl SnapshotSink for mpsc::UnboundedSender<WorldSnapshot> {
    fn deliver(&self, snapshot: WorldSnapshot) {
        let _ = self.send(snapshot);
    }
}

/// Adapts a plain function into a sink
pub struct FnSink<F>(pub F);

impl<F> SnapshotSink for FnSink<F>
where
    F: Fn(WorldSnapshot) + Send + Sync,
{
    fn deliver(&self, snapshot: WorldSnapshot) {
        (self.0)(snapshot)
    }
}

/// Tracks snapshot cadence and the event cursor
pub struct SnapshotBuilder {
    /// Tick counter since last snapshot
    ticks_since_snapshot: u32,
    /// Snapshot interval in ticks
    snapshot_interval: u32,
    window: EventWindow,
    /// Events already sent (for `SinceLastSnapshot`)
    events_sent: usize,
}

impl SnapshotBuilder {
    pub fn new(snapshot_interval: u32, window: EventWindow) -> Self {
        Self {
            ticks_since_snapshot: 0,
            snapshot_interval: snapshot_interval.max(1),
            window,
            events_sent: 0,
        }
    }

    /// Check if it's time to send a snapshot
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_snapshot += 1;
        if self.ticks_since_snapshot >= self.snapshot_interval {
            self.ticks_since_snapshot = 0;
            true
        } else {
            false
        }
    }

    /// Force snapshot on next check (used for important events)
    pub fn force_next(&mut self) {
        self.ticks_since_snapshot = self.snapshot_interval;
    }

    /// Slice of the log this snapshot should carry
    pub fn select_events(&mut self, log: &[MatchEvent]) -> Vec<MatchEvent> {
        match self.window {
            EventWindow::Full => log.to_vec(),
            EventWindow::SinceLastSnapshot => {
                let start = self.events_sent.min(log.len());
                self.events_sent = log.len();
                log[start..].to_vec()
            }
        }
    }
}
