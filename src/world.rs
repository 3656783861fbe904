use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spatial::LatLng;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DwellingId(pub String);

impl fmt::Display for DwellingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HordeId(u64);

impl fmt::Display for HordeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "horde-{}", self.0)
    }
}

/// Immutable footprint of a dwelling, loaded once from the map layer.
#[derive(Debug, Clone)]
pub struct DwellingGeometry {
    pub id: DwellingId,
    pub kind: Option<i64>,
    pub ring: Vec<LatLng>,
    pub centroid: LatLng,
}

/// Mutable per-dwelling game state.
#[derive(Debug, Clone, PartialEq)]
pub struct Dwelling {
    pub id: DwellingId,
    pub position: LatLng,
    pub max_occupancy: u32,
    pub occupancy: u32,
    pub soldiers: u32,
    /// Signed so a day's consumption can overshoot before starvation clears it.
    pub food: i64,
}

impl Dwelling {
    pub fn new(id: DwellingId, position: LatLng, max_occupancy: u32) -> Self {
        Self {
            id,
            position,
            max_occupancy,
            occupancy: 0,
            soldiers: 0,
            food: 0,
        }
    }

    pub fn humans(&self) -> u32 {
        self.occupancy + self.soldiers
    }

    pub fn is_inhabited(&self) -> bool {
        self.humans() > 0
    }

    pub fn status(&self) -> StatusTier {
        StatusTier::of(self)
    }
}

/// Food outlook of a dwelling, used by front ends to color it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTier {
    /// Nobody left inside.
    Neutral,
    Healthy,
    Warning,
    Critical,
}

impl StatusTier {
    pub fn of(dwelling: &Dwelling) -> Self {
        let humans = dwelling.humans();
        if humans == 0 {
            return StatusTier::Neutral;
        }
        let food_days_left = dwelling.food as f64 / f64::from(humans);
        if food_days_left > 10.0 {
            StatusTier::Healthy
        } else if food_days_left > 5.0 {
            StatusTier::Warning
        } else {
            StatusTier::Critical
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Horde {
    pub id: HordeId,
    pub position: LatLng,
    /// Zombie count, and the horde's reach in meters.
    pub size: u32,
}

impl Horde {
    /// Reach in meters, never below `floor`.
    pub fn reach(&self, floor: u32) -> f64 {
        f64::from(self.size.max(floor))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBoard {
    pub zombies_destroyed: u64,
    pub hordes_destroyed: u64,
    pub civilians_eaten: u64,
    pub soldiers_eaten: u64,
    pub civilians_starved: u64,
    pub soldiers_starved: u64,
    pub total_civilians: u64,
}

impl ScoreBoard {
    pub fn civilians_saved(&self) -> u64 {
        self.total_civilians
            .saturating_sub(self.civilians_eaten)
            .saturating_sub(self.civilians_starved)
    }
}

/// A state repair made by bookkeeping. Logged, never surfaced as a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity}: {field} was {found}, clamped to {clamped_to}")]
pub struct StateInvariantViolation {
    pub entity: String,
    pub field: &'static str,
    pub found: i64,
    pub clamped_to: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DwellingSnapshot {
    pub id: DwellingId,
    pub position: LatLng,
    pub max_occupancy: u32,
    pub occupancy: u32,
    pub soldiers: u32,
    pub food: i64,
    pub status: StatusTier,
    pub garrisoned: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HordeSnapshot {
    pub id: HordeId,
    pub position: LatLng,
    pub size: u32,
    pub reach_m: f64,
}

pub struct World {
    next_horde: u64,
    geometry: Vec<DwellingGeometry>,
    pub(crate) dwellings: Vec<Dwelling>,
    index: HashMap<DwellingId, usize>,
    pub(crate) hordes: Vec<Horde>,
    pub(crate) score: ScoreBoard,
}

impl World {
    pub fn new() -> Self {
        Self {
            next_horde: 0,
            geometry: Vec::new(),
            dwellings: Vec::new(),
            index: HashMap::new(),
            hordes: Vec::new(),
            score: ScoreBoard::default(),
        }
    }

    /// Registers a dwelling footprint with its initial state. Returns `false`
    /// (and changes nothing) when the id is already taken.
    pub fn add_dwelling(&mut self, geometry: DwellingGeometry, state: Dwelling) -> bool {
        if self.index.contains_key(&geometry.id) {
            return false;
        }
        self.index.insert(geometry.id.clone(), self.dwellings.len());
        self.geometry.push(geometry);
        self.dwellings.push(state);
        true
    }

    pub fn spawn_horde(&mut self, position: LatLng, size: u32) -> HordeId {
        let id = HordeId(self.next_horde);
        self.next_horde += 1;
        self.hordes.push(Horde { id, position, size });
        id
    }

    pub fn dwellings(&self) -> &[Dwelling] {
        &self.dwellings
    }

    pub fn dwellings_mut(&mut self) -> &mut [Dwelling] {
        &mut self.dwellings
    }

    pub fn dwelling(&self, id: &DwellingId) -> Option<&Dwelling> {
        self.index.get(id).map(|&i| &self.dwellings[i])
    }

    pub fn geometry(&self, id: &DwellingId) -> Option<&DwellingGeometry> {
        self.index.get(id).map(|&i| &self.geometry[i])
    }

    pub fn hordes(&self) -> &[Horde] {
        &self.hordes
    }

    pub fn hordes_mut(&mut self) -> &mut Vec<Horde> {
        &mut self.hordes
    }

    pub fn score(&self) -> &ScoreBoard {
        &self.score
    }

    pub fn score_mut(&mut self) -> &mut ScoreBoard {
        &mut self.score
    }

    pub fn total_civilians(&self) -> u64 {
        self.dwellings.iter().map(|d| u64::from(d.occupancy)).sum()
    }

    /// Fixes the civilian total the final report is measured against.
    pub fn record_total_civilians(&mut self) {
        self.score.total_civilians = self.total_civilians();
    }

    /// Drops every horde whose size reached zero and returns their ids.
    pub fn prune_hordes(&mut self) -> Vec<HordeId> {
        let mut removed = Vec::new();
        self.hordes.retain(|horde| {
            if horde.size == 0 {
                removed.push(horde.id);
                false
            } else {
                true
            }
        });
        removed
    }

    /// Clamps every dwelling back into its valid range and reports what had
    /// to change. Negative food is expected after a day's consumption and is
    /// clamped silently.
    pub fn enforce_invariants(&mut self) -> Vec<StateInvariantViolation> {
        let mut violations = Vec::new();
        for dwelling in &mut self.dwellings {
            if dwelling.occupancy > dwelling.max_occupancy {
                violations.push(StateInvariantViolation {
                    entity: dwelling.id.to_string(),
                    field: "occupancy",
                    found: i64::from(dwelling.occupancy),
                    clamped_to: i64::from(dwelling.max_occupancy),
                });
                dwelling.occupancy = dwelling.max_occupancy;
            }
            dwelling.food = dwelling.food.max(0);
        }
        violations
    }

    pub fn dwelling_snapshots(&self) -> Vec<DwellingSnapshot> {
        self.dwellings
            .iter()
            .map(|d| DwellingSnapshot {
                id: d.id.clone(),
                position: d.position,
                max_occupancy: d.max_occupancy,
                occupancy: d.occupancy,
                soldiers: d.soldiers,
                food: d.food,
                status: d.status(),
                garrisoned: d.soldiers > 0,
            })
            .collect()
    }

    pub fn horde_snapshots(&self, reach_floor: u32) -> Vec<HordeSnapshot> {
        self.hordes
            .iter()
            .map(|h| HordeSnapshot {
                id: h.id,
                position: h.position,
                size: h.size,
                reach_m: h.reach(reach_floor),
            })
            .collect()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
