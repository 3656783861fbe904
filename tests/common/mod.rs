#![allow(dead_code)]

use horde_siege::{
    config::GameConfig,
    engine::{Engine, EngineBuilder, EngineSettings},
    events::{GameEvent, Notification},
    rng::ScriptedSource,
    spatial::{Boundary, LatLng},
    world::{Dwelling, DwellingGeometry, DwellingId, World},
};

pub const HOME: LatLng = LatLng {
    lat: 45.39,
    lng: -73.95,
};

/// Inside the boundary, well out of reach of `HOME`.
pub const FAR: LatLng = LatLng {
    lat: 45.398,
    lng: -73.95,
};

pub fn boundary() -> Boundary {
    Boundary::from_ring(
        "island",
        &[
            LatLng::new(45.38, -73.97),
            LatLng::new(45.38, -73.93),
            LatLng::new(45.40, -73.93),
            LatLng::new(45.40, -73.97),
        ],
    )
    .expect("valid boundary")
}

#[derive(Debug)]
pub struct DwellingSpec {
    pub position: LatLng,
    pub max_occupancy: u32,
    pub occupancy: u32,
    pub soldiers: u32,
    pub food: i64,
}

impl DwellingSpec {
    pub fn at(position: LatLng) -> Self {
        Self {
            position,
            max_occupancy: 10,
            occupancy: 5,
            soldiers: 0,
            food: 100,
        }
    }
}

pub fn world(dwellings: &[DwellingSpec], hordes: &[(LatLng, u32)]) -> World {
    let mut world = World::new();
    for (i, spec) in dwellings.iter().enumerate() {
        let id = DwellingId(format!("d{i}"));
        let geometry = DwellingGeometry {
            id: id.clone(),
            kind: Some(1),
            ring: Vec::new(),
            centroid: spec.position,
        };
        let mut state = Dwelling::new(id, spec.position, spec.max_occupancy);
        state.occupancy = spec.occupancy;
        state.soldiers = spec.soldiers;
        state.food = spec.food;
        world.add_dwelling(geometry, state);
    }
    for &(position, size) in hordes {
        world.spawn_horde(position, size);
    }
    world
}

pub fn scripted_engine(world: World, rng: ScriptedSource) -> Engine {
    let settings = EngineSettings {
        scenario_name: "scripted".into(),
        seed: 0,
    };
    EngineBuilder::new(settings, GameConfig::default(), boundary())
        .with_default_systems()
        .with_random_source(rng)
        .build(world)
}

pub fn events(notifications: &[Notification]) -> Vec<GameEvent> {
    notifications
        .iter()
        .filter_map(|n| n.as_event().cloned())
        .collect()
}
