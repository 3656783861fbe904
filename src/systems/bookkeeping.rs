use anyhow::Result;
use tracing::warn;

use crate::{
    engine::{Cadence, System, SystemContext},
    events::GameEvent,
    rng::RandomSource,
    world::World,
};

/// Repairs state after every tick so the next tick and the published
/// snapshot only ever see valid dwellings and live hordes.
pub struct BookkeepingSystem;

impl BookkeepingSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BookkeepingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for BookkeepingSystem {
    fn name(&self) -> &str {
        "bookkeeping"
    }

    fn cadence(&self) -> Cadence {
        Cadence::Always
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut dyn RandomSource,
    ) -> Result<Vec<GameEvent>> {
        for violation in world.enforce_invariants() {
            warn!(hour = ctx.hour, %violation, "state invariant violation");
        }
        let pruned = world.prune_hordes();
        world.score_mut().hordes_destroyed += pruned.len() as u64;
        Ok(pruned
            .into_iter()
            .map(|horde_id| {
                warn!(hour = ctx.hour, %horde_id, "depleted horde was still on the roster");
                GameEvent::HordeDestroyed { horde_id }
            })
            .collect())
    }
}
