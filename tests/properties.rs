//! Property tests for the resolvers: containment, state bounds, idempotence
//! and determinism over arbitrary random-source scripts.

mod common;

use proptest::prelude::*;

use common::{boundary, world, DwellingSpec};
use horde_siege::{
    config::{AidType, GameConfig},
    rng::ScriptedSource,
    spatial::LatLng,
    systems::{resolve_combat, resolve_decay, resolve_migration, resolve_supply_drop},
    world::World,
};

fn position() -> impl Strategy<Value = LatLng> {
    (45.381f64..45.399, -73.969f64..-73.931).prop_map(|(lat, lng)| LatLng::new(lat, lng))
}

fn dwelling() -> impl Strategy<Value = DwellingSpec> {
    (position(), 1u32..20, 0u32..20, 0u32..10, 0i64..300).prop_map(
        |(position, max_occupancy, occupancy, soldiers, food)| DwellingSpec {
            position,
            max_occupancy,
            occupancy: occupancy.min(max_occupancy),
            soldiers,
            food,
        },
    )
}

fn scenario() -> impl Strategy<Value = (Vec<DwellingSpec>, Vec<(LatLng, u32)>, Vec<f64>)> {
    (
        prop::collection::vec(dwelling(), 1..12),
        prop::collection::vec((position(), 1u32..400), 0..6),
        prop::collection::vec(0.0f64..1.0, 0..64),
    )
}

fn script(draws: &[f64]) -> ScriptedSource {
    ScriptedSource::new(draws.iter().copied()).with_fallback(0.37)
}

fn assert_bounds(world: &World) -> Result<(), TestCaseError> {
    for d in world.dwellings() {
        prop_assert!(d.occupancy <= d.max_occupancy);
    }
    for h in world.hordes() {
        prop_assert!(h.size > 0);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_migration_stays_inside_boundary(
        hordes in prop::collection::vec((position(), 1u32..2_000), 1..8),
        draws in prop::collection::vec(0.0f64..1.0, 0..64),
        days in 1usize..10,
    ) {
        let boundary = boundary();
        let mut world = world(&[], &hordes);
        let mut rng = script(&draws);
        let config = GameConfig::default();
        for _ in 0..days {
            resolve_migration(&mut world, &boundary, &config, &mut rng);
            for horde in world.hordes() {
                prop_assert!(boundary.contains(horde.position));
            }
        }
    }

    #[test]
    fn prop_ticks_keep_state_bounded((dwellings, hordes, draws) in scenario()) {
        let boundary = boundary();
        let config = GameConfig::default();
        let mut world = world(&dwellings, &hordes);
        let mut rng = script(&draws);

        resolve_combat(&mut world, &config, &mut rng);
        assert_bounds(&world)?;

        resolve_decay(&mut world, &config, &mut rng);
        for d in world.dwellings() {
            if d.food <= 0 {
                prop_assert_eq!(d.occupancy, 0);
                prop_assert_eq!(d.soldiers, 0);
            }
        }
        world.enforce_invariants();
        for d in world.dwellings() {
            prop_assert!(d.food >= 0);
        }

        resolve_migration(&mut world, &boundary, &config, &mut rng);
        assert_bounds(&world)?;
    }

    #[test]
    fn prop_zero_radius_drop_changes_nothing(
        (dwellings, _hordes, draws) in scenario(),
        target in position(),
        aid in prop::sample::select(AidType::ALL.to_vec()),
    ) {
        let mut config = GameConfig::default();
        config.aid.get_mut(aid).radius_m = 0.0;
        let mut world = world(&dwellings, &[]);
        let before = world.dwellings().to_vec();
        let mut rng = script(&draws);

        let _ = resolve_supply_drop(&mut world, &boundary(), &config, aid, target, &mut rng);
        prop_assert_eq!(world.dwellings(), before.as_slice());
    }

    #[test]
    fn prop_resolvers_are_deterministic((dwellings, hordes, draws) in scenario()) {
        let boundary = boundary();
        let config = GameConfig::default();
        let mut a = world(&dwellings, &hordes);
        let mut b = world(&dwellings, &hordes);
        let mut rng_a = script(&draws);
        let mut rng_b = script(&draws);

        for (w, rng) in [(&mut a, &mut rng_a), (&mut b, &mut rng_b)] {
            resolve_combat(w, &config, rng);
            resolve_decay(w, &config, rng);
            resolve_migration(w, &boundary, &config, rng);
        }

        prop_assert_eq!(a.dwellings(), b.dwellings());
        prop_assert_eq!(a.hordes(), b.hordes());
        prop_assert_eq!(a.score(), b.score());
    }
}
