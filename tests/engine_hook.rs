mod common;

use common::{scripted_engine, world, DwellingSpec, FAR, HOME};
use horde_siege::{events::Notification, rng::ScriptedSource, scenario::ScenarioLoader};

#[test]
fn engine_publishes_snapshot_each_hour() {
    let mut engine = scripted_engine(
        world(&[DwellingSpec::at(HOME)], &[(FAR, 50)]),
        ScriptedSource::constant(0.5),
    );
    engine.start_game();

    let mut hours = Vec::new();
    engine
        .advance_with_hook(6_000, |n| {
            if let Notification::Snapshot(snapshot) = n {
                hours.push(snapshot.hour);
            }
        })
        .expect("advance succeeds");

    assert_eq!(hours, vec![0, 1, 2, 3, 4, 5, 6]);
}

#[test]
fn scenario_engine_runs_a_day() {
    let loader = ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"));
    let scenario = loader
        .load("scenarios/ile_perrot.yaml")
        .expect("scenario should load");
    let mut engine = scenario.build_engine().expect("engine builds");
    engine.start_game();

    let out = engine.advance(12_000).expect("advance succeeds");
    let last = out
        .iter()
        .rev()
        .find_map(Notification::as_snapshot)
        .expect("snapshot published");
    assert_eq!(last.day, 1);
    assert_eq!(last.scenario, "ile_perrot");
    for dwelling in &last.dwellings {
        assert!(dwelling.occupancy <= dwelling.max_occupancy);
        assert!(dwelling.food >= 0);
    }
    for horde in &last.hordes {
        assert!(horde.size > 0);
        assert!(engine.boundary().contains(horde.position));
    }
}
