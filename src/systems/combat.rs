use anyhow::Result;
use tracing::info;

use crate::{
    config::GameConfig,
    engine::{Cadence, System, SystemContext},
    events::GameEvent,
    rng::RandomSource,
    spatial,
    world::{HordeId, World},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombatReport {
    pub zombies_destroyed: u64,
    pub destroyed: Vec<HordeId>,
}

/// One hour of fighting: garrisoned soldiers in reach of a horde may cut it
/// down by their number. Depleted hordes leave the roster.
///
/// Each (horde, dwelling) pair with soldiers in range draws once.
pub fn resolve_combat(
    world: &mut World,
    config: &GameConfig,
    rng: &mut dyn RandomSource,
) -> CombatReport {
    let mut report = CombatReport::default();
    let World {
        hordes, dwellings, ..
    } = world;

    for horde in hordes.iter_mut() {
        for dwelling in dwellings.iter() {
            if horde.size == 0 {
                break;
            }
            if dwelling.soldiers == 0 {
                continue;
            }
            let engagement = horde.reach(config.default_horde_size) + config.soldier_kill_radius;
            if spatial::distance(horde.position, dwelling.position) > engagement {
                continue;
            }
            if rng.roll(config.soldier_kill_risk) {
                let killed = dwelling.soldiers.min(horde.size);
                horde.size -= killed;
                report.zombies_destroyed += u64::from(killed);
            }
        }
    }

    report.destroyed = world.prune_hordes();
    let score = world.score_mut();
    score.zombies_destroyed += report.zombies_destroyed;
    score.hordes_destroyed += report.destroyed.len() as u64;
    report
}

pub struct CombatSystem;

impl CombatSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CombatSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for CombatSystem {
    fn name(&self) -> &str {
        "combat"
    }

    fn cadence(&self) -> Cadence {
        Cadence::Hourly
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut dyn RandomSource,
    ) -> Result<Vec<GameEvent>> {
        let report = resolve_combat(world, ctx.config, rng);
        Ok(report
            .destroyed
            .into_iter()
            .map(|horde_id| {
                info!(hour = ctx.hour, %horde_id, "horde destroyed");
                GameEvent::HordeDestroyed { horde_id }
            })
            .collect())
    }
}
