use std::fs;

use horde_siege::scenario::ScenarioLoader;
use tempfile::tempdir;

#[test]
fn bundled_scenario_loads_and_seeds() {
    let loader = ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"));
    let scenario = loader
        .load("scenarios/ile_perrot.yaml")
        .expect("scenario should load");
    assert_eq!(scenario.name, "ile_perrot");
    assert_eq!(scenario.hordes.len(), 3);
    assert_eq!(scenario.scripted_drops.len(), 5);
    assert_eq!(scenario.config.soldier_kill_radius, 50.0);

    let map = scenario.load_map().expect("map loads");
    // The map carries one non-residential building that is skipped.
    assert_eq!(map.dwellings.len(), 8);
    assert!(map
        .dwellings
        .iter()
        .all(|site| map.boundary.contains(site.geometry.centroid)));

    let world = scenario.build_world(&map);
    for dwelling in world.dwellings() {
        assert!(dwelling.occupancy >= 1);
        assert!(dwelling.occupancy <= dwelling.max_occupancy);
        assert!(dwelling.food <= i64::from(dwelling.occupancy) * 50);
        assert_eq!(dwelling.soldiers, 0);
    }
    assert_eq!(world.hordes()[2].size, 80);

    // Same seed, same world.
    let again = scenario.build_world(&map);
    assert_eq!(world.dwellings(), again.dwellings());
}

#[test]
fn invalid_config_is_rejected_at_load() {
    let temp = tempdir().unwrap();
    fs::write(
        temp.path().join("bad.yaml"),
        "name: bad\nseed: 1\nboundary: b.geojson\ndwellings: d.geojson\nconfig:\n  horde_kill_risk: 2.0\n",
    )
    .unwrap();

    let err = ScenarioLoader::new(temp.path())
        .load("bad.yaml")
        .expect_err("probability out of range");
    assert!(format!("{err:#}").contains("horde_kill_risk"));
}

#[test]
fn missing_geometry_fails_engine_setup() {
    let temp = tempdir().unwrap();
    fs::write(
        temp.path().join("lonely.yaml"),
        "name: lonely\nseed: 1\nboundary: nowhere.geojson\ndwellings: nowhere.geojson\n",
    )
    .unwrap();

    let scenario = ScenarioLoader::new(temp.path())
        .load("lonely.yaml")
        .expect("yaml itself is valid");
    assert!(scenario.build_engine().is_err());
}

#[test]
fn degenerate_boundary_is_a_geometry_error() {
    let temp = tempdir().unwrap();
    fs::write(
        temp.path().join("b.geojson"),
        r#"{"features":[{"properties":{},"geometry":{"type":"Polygon","coordinates":[[[0,0],[1,1],[0,0]]]}}]}"#,
    )
    .unwrap();
    fs::write(temp.path().join("d.geojson"), r#"{"features":[]}"#).unwrap();
    fs::write(
        temp.path().join("flat.yaml"),
        "name: flat\nseed: 1\nboundary: b.geojson\ndwellings: d.geojson\n",
    )
    .unwrap();

    let scenario = ScenarioLoader::new(temp.path()).load("flat.yaml").unwrap();
    let err = scenario.load_map().expect_err("two distinct points");
    assert!(format!("{err:#}").contains("at least 3 distinct positions"));
}
