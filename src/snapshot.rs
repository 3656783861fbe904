use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::{AidType, MarkerColor};
use crate::engine::GamePhase;
use crate::events::DropId;
use crate::spatial::LatLng;
use crate::world::{DwellingId, DwellingSnapshot, HordeSnapshot, ScoreBoard};

pub type ScoreSnapshot = ScoreBoard;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CooldownSnapshot {
    pub aid_type: AidType,
    pub remaining_secs: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropSnapshot {
    pub drop_id: DropId,
    pub aid_type: AidType,
    pub position: LatLng,
    pub radius_m: f64,
    pub color: MarkerColor,
    pub affected: Vec<DwellingId>,
    pub expires_at_ms: u64,
}

/// Immutable copy of the whole session, published after every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub scenario: String,
    pub phase: GamePhase,
    pub elapsed_ms: u64,
    pub hour: u64,
    pub day: u64,
    pub dwellings: Vec<DwellingSnapshot>,
    pub hordes: Vec<HordeSnapshot>,
    pub score: ScoreSnapshot,
    pub civilians_saved: u64,
    pub cooldowns: Vec<CooldownSnapshot>,
    pub drops: Vec<DropSnapshot>,
}

/// Writes a snapshot to disk every `interval_days` simulated days.
pub struct SnapshotWriter {
    dir: PathBuf,
    interval_days: u64,
    last_written_day: u64,
}

impl SnapshotWriter {
    pub fn new(dir: impl AsRef<Path>, interval_days: u64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            interval_days,
            last_written_day: 0,
        }
    }

    pub fn should_write(&self, day: u64) -> bool {
        self.interval_days != 0
            && day > self.last_written_day
            && day % self.interval_days == 0
    }

    pub fn maybe_write(&mut self, snapshot: &GameSnapshot) -> Result<Option<PathBuf>> {
        if !self.should_write(snapshot.day) {
            return Ok(None);
        }
        let dir = self.dir.join(&snapshot.scenario);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create snapshot dir {}", dir.display()))?;
        let path = dir.join(format!("day_{:06}.json", snapshot.day));
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        self.last_written_day = snapshot.day;
        Ok(Some(path))
    }
}
