//! Everything the core publishes to a front end: discrete game events and
//! full-state snapshots.

use serde::{Deserialize, Serialize};

use crate::config::{AidType, MarkerColor};
use crate::snapshot::GameSnapshot;
use crate::spatial::LatLng;
use crate::world::{DwellingId, HordeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DropId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    /// Drops are only accepted while the game is running.
    NotRunning,
    /// Water deliveries cannot reach points inside the boundary.
    WaterInsideBoundary,
    CoolingDown { remaining_secs: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    GameStarted {
        total_civilians: u64,
        hordes: usize,
    },
    DropPlaced {
        drop_id: DropId,
        aid_type: AidType,
        position: LatLng,
        radius_m: f64,
        color: MarkerColor,
        affected: Vec<DwellingId>,
    },
    DropRejected {
        aid_type: AidType,
        position: LatLng,
        reason: RejectReason,
    },
    /// The marker for a drop can be removed and dwelling highlights reset.
    DropExpired {
        drop_id: DropId,
    },
    CooldownFinished {
        aid_type: AidType,
    },
    HordeDestroyed {
        horde_id: HordeId,
    },
    /// The roster became empty; the horde layer can be cleared.
    HordesCleared,
    GameWon {
        civilians_saved: u64,
    },
}

/// A player action, queued and applied at the next tick boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    StartGame,
    PlaceDrop { aid_type: AidType, position: LatLng },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Notification {
    Snapshot(Box<GameSnapshot>),
    Event(GameEvent),
}

impl Notification {
    pub fn as_event(&self) -> Option<&GameEvent> {
        match self {
            Notification::Event(event) => Some(event),
            Notification::Snapshot(_) => None,
        }
    }

    pub fn as_snapshot(&self) -> Option<&GameSnapshot> {
        match self {
            Notification::Snapshot(snapshot) => Some(snapshot),
            Notification::Event(_) => None,
        }
    }
}
