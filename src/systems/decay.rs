use anyhow::Result;
use tracing::debug;

use crate::{
    config::GameConfig,
    engine::{Cadence, System, SystemContext},
    events::GameEvent,
    rng::RandomSource,
    spatial,
    world::World,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecayReport {
    pub civilians_starved: u64,
    pub soldiers_starved: u64,
    pub civilians_eaten: u64,
    pub soldiers_eaten: u64,
    /// Dwellings that still had people inside when their food ran out.
    pub starved_dwellings: usize,
}

/// One day of attrition for every dwelling: eat, starve when the stores are
/// gone, then lose people to any horde in reach.
///
/// Food is left as computed (possibly negative); bookkeeping clamps it.
pub fn resolve_decay(
    world: &mut World,
    config: &GameConfig,
    rng: &mut dyn RandomSource,
) -> DecayReport {
    let mut report = DecayReport::default();
    let World {
        dwellings, hordes, ..
    } = world;

    for dwelling in dwellings.iter_mut() {
        if dwelling.food > 0 && dwelling.is_inhabited() {
            dwelling.food -= i64::from(dwelling.humans());
        }

        if dwelling.food <= 0 {
            if dwelling.is_inhabited() {
                report.starved_dwellings += 1;
            }
            report.civilians_starved += u64::from(dwelling.occupancy);
            report.soldiers_starved += u64::from(dwelling.soldiers);
            dwelling.occupancy = 0;
            dwelling.soldiers = 0;
        }

        if !dwelling.is_inhabited() {
            continue;
        }
        for horde in hordes.iter() {
            let reach = horde.reach(config.default_horde_size);
            if spatial::distance(horde.position, dwelling.position) > reach {
                continue;
            }
            let soldier_lost = rng.roll(config.horde_kill_risk);
            let civilian_lost = rng.roll(config.horde_kill_risk);
            if soldier_lost && dwelling.soldiers > 0 {
                dwelling.soldiers -= 1;
                report.soldiers_eaten += 1;
            }
            if civilian_lost && dwelling.occupancy > 0 {
                dwelling.occupancy -= 1;
                report.civilians_eaten += 1;
            }
        }
    }

    let score = world.score_mut();
    score.civilians_starved += report.civilians_starved;
    score.soldiers_starved += report.soldiers_starved;
    score.civilians_eaten += report.civilians_eaten;
    score.soldiers_eaten += report.soldiers_eaten;
    report
}

pub struct DecaySystem;

impl DecaySystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DecaySystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for DecaySystem {
    fn name(&self) -> &str {
        "decay"
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
        let report = resolve_decay(world, ctx.config, rng);
        debug!(
            day = ctx.day,
            starved_dwellings = report.starved_dwellings,
            civilians_starved = report.civilians_starved,
            soldiers_starved = report.soldiers_starved,
            civilians_eaten = report.civilians_eaten,
            soldiers_eaten = report.soldiers_eaten,
            "daily decay"
        );
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedSource;
    use crate::spatial::LatLng;
    use crate::world::{Dwelling, DwellingGeometry, DwellingId, StatusTier};

    const HOME: LatLng = LatLng {
        lat: 45.39,
        lng: -73.95,
    };

    fn single(occupancy: u32, soldiers: u32, food: i64) -> World {
        let mut world = World::new();
        let id = DwellingId("home".into());
        let geometry = DwellingGeometry {
            id: id.clone(),
            kind: None,
            ring: Vec::new(),
            centroid: HOME,
        };
        let mut dwelling = Dwelling::new(id, HOME, 12);
        dwelling.occupancy = occupancy;
        dwelling.soldiers = soldiers;
        dwelling.food = food;
        world.add_dwelling(geometry, dwelling);
        world
    }

    #[test]
    fn test_consumption_runs_out_and_starves() {
        let mut world = single(10, 0, 5);
        let mut rng = ScriptedSource::constant(0.0);
        let report = resolve_decay(&mut world, &GameConfig::default(), &mut rng);

        let dwelling = &world.dwellings()[0];
        assert_eq!(dwelling.food, -5);
        assert_eq!(dwelling.occupancy, 0);
        assert_eq!(report.civilians_starved, 10);
        assert_eq!(report.starved_dwellings, 1);
        assert_eq!(world.score().civilians_starved, 10);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_well_fed_dwelling_only_eats() {
        let mut world = single(3, 2, 100);
        let mut rng = ScriptedSource::constant(0.0);
        let report = resolve_decay(&mut world, &GameConfig::default(), &mut rng);
        assert_eq!(report, DecayReport::default());
        let dwelling = &world.dwellings()[0];
        assert_eq!(dwelling.food, 95);
        assert_eq!(dwelling.status(), StatusTier::Healthy);
    }

    #[test]
    fn test_empty_dwelling_keeps_its_food() {
        let mut world = single(0, 0, 40);
        let mut rng = ScriptedSource::constant(0.0);
        resolve_decay(&mut world, &GameConfig::default(), &mut rng);
        assert_eq!(world.dwellings()[0].food, 40);
    }

    #[test]
    fn test_horde_in_reach_eats_with_independent_draws() {
        let mut world = single(3, 2, 100);
        world.spawn_horde(HOME, 10);
        // soldier roll fails, civilian roll succeeds
        let mut rng = ScriptedSource::new([0.9, 0.1]);
        let report = resolve_decay(&mut world, &GameConfig::default(), &mut rng);

        assert_eq!(report.soldiers_eaten, 0);
        assert_eq!(report.civilians_eaten, 1);
        let dwelling = &world.dwellings()[0];
        assert_eq!(dwelling.soldiers, 2);
        assert_eq!(dwelling.occupancy, 2);
        assert_eq!(world.score().civilians_eaten, 1);
        assert_eq!(rng.draws(), 2);
    }

    #[test]
    fn test_soldier_roll_without_soldiers_is_harmless() {
        let mut world = single(3, 0, 100);
        world.spawn_horde(HOME, 10);
        world.spawn_horde(HOME, 10);
        let mut rng = ScriptedSource::constant(0.0);
        let report = resolve_decay(&mut world, &GameConfig::default(), &mut rng);
        assert_eq!(report.soldiers_eaten, 0);
        assert_eq!(report.civilians_eaten, 2);
        assert_eq!(rng.draws(), 4);
    }

    #[test]
    fn test_distant_horde_does_not_roll() {
        let mut world = single(3, 1, 100);
        world.spawn_horde(spatial::destination_point(HOME, 51.0, 180.0), 10);
        let mut rng = ScriptedSource::constant(0.0);
        resolve_decay(&mut world, &GameConfig::default(), &mut rng);
        assert_eq!(rng.draws(), 0);
    }
}
