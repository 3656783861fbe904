use anyhow::Result;
use tracing::{debug, warn};

use crate::{
    config::GameConfig,
    engine::{Cadence, System, SystemContext},
    events::GameEvent,
    rng::RandomSource,
    spatial::{self, Boundary},
    world::{HordeId, World},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub moved: usize,
    pub blocked: usize,
    /// Hordes found depleted before moving.
    pub pruned: Vec<HordeId>,
}

/// Moves every horde one step of its reach in a random direction. A step
/// that would leave the boundary is discarded and the horde waits a day.
pub fn resolve_migration(
    world: &mut World,
    boundary: &Boundary,
    config: &GameConfig,
    rng: &mut dyn RandomSource,
) -> MigrationReport {
    let mut report = MigrationReport {
        pruned: world.prune_hordes(),
        ..MigrationReport::default()
    };
    world.score_mut().hordes_destroyed += report.pruned.len() as u64;

    for horde in world.hordes_mut().iter_mut() {
        let bearing = rng.uniform(0.0, 360.0);
        let step = horde.reach(config.default_horde_size);
        let destination = spatial::destination_point(horde.position, step, bearing);
        if spatial::point_in_boundary(destination, boundary) {
            horde.position = destination;
            report.moved += 1;
        } else {
            report.blocked += 1;
        }
    }
    report
}

pub struct MigrationSystem;

impl MigrationSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MigrationSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for MigrationSystem {
    fn name(&self) -> &str {
        "migration"
    }

    fn cadence(&self) -> Cadence {
        Cadence::Daily
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut dyn RandomSource,
    ) -> Result<Vec<GameEvent>> {
        let report = resolve_migration(world, ctx.boundary, ctx.config, rng);
        debug!(
            day = ctx.day,
            moved = report.moved,
            blocked = report.blocked,
            "hordes migrated"
        );
        Ok(report
            .pruned
            .into_iter()
            .map(|horde_id| {
                warn!(%horde_id, "depleted horde was still on the roster");
                GameEvent::HordeDestroyed { horde_id }
            })
            .collect())
    }
}
