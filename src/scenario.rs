use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{
    config::{AidType, GameConfig, LoggingConfig},
    engine::{Engine, EngineBuilder, EngineSettings},
    rng::{RandomSource, SeededSource},
    spatial::{
        geojson::FeatureCollection, ring_centroid, Boundary, GeometryError, LatLng,
    },
    world::{Dwelling, DwellingGeometry, DwellingId, World},
};

/// Feature `type` used by the map data for buildings nobody lives in.
const NON_RESIDENTIAL_KIND: i64 = 9;

fn default_snapshot_interval_days() -> u64 {
    1
}

fn default_max_days() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    /// GeoJSON file whose first feature is the boundary polygon.
    pub boundary: PathBuf,
    /// GeoJSON file holding one polygon feature per dwelling.
    pub dwellings: PathBuf,
    #[serde(default)]
    pub hordes: Vec<HordeSpec>,
    #[serde(default = "default_snapshot_interval_days")]
    pub snapshot_interval_days: u64,
    #[serde(default = "default_max_days")]
    pub max_days: u64,
    #[serde(default)]
    pub scripted_drops: Vec<ScriptedDrop>,
    #[serde(default)]
    pub config: GameConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HordeSpec {
    pub lat: f64,
    pub lng: f64,
    /// Falls back to the configured default horde size.
    #[serde(default)]
    pub size: Option<u32>,
}

/// A drop the headless runner places at a fixed simulated time.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptedDrop {
    pub at_ms: u64,
    pub aid_type: AidType,
    pub lat: f64,
    pub lng: f64,
}

impl ScriptedDrop {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Loads a scenario. Geometry paths are resolved relative to the
    /// scenario file.
    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let mut scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .config
            .validate()
            .with_context(|| format!("Invalid game config in {}", path.display()))?;

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        scenario.boundary = dir.join(&scenario.boundary);
        scenario.dwellings = dir.join(&scenario.dwellings);
        Ok(scenario)
    }
}

/// A residential footprint and its capacity, as read from the map.
#[derive(Debug, Clone)]
pub struct DwellingSite {
    pub geometry: DwellingGeometry,
    pub max_occupancy: u32,
}

/// Static map layers: the boundary and every residential dwelling.
#[derive(Debug, Clone)]
pub struct GameMap {
    pub boundary: Boundary,
    pub dwellings: Vec<DwellingSite>,
}

impl GameMap {
    pub fn load(boundary: &Path, dwellings: &Path) -> Result<Self> {
        let boundary_text = fs::read_to_string(boundary)
            .with_context(|| format!("Failed to read boundary {}", boundary.display()))?;
        let dwellings_text = fs::read_to_string(dwellings)
            .with_context(|| format!("Failed to read dwellings {}", dwellings.display()))?;
        let boundary_layer = FeatureCollection::from_json(&boundary_text)
            .with_context(|| format!("Failed to parse {}", boundary.display()))?;
        let dwelling_layer = FeatureCollection::from_json(&dwellings_text)
            .with_context(|| format!("Failed to parse {}", dwellings.display()))?;
        Ok(Self::from_collections(&boundary_layer, &dwelling_layer)?)
    }

    pub fn from_collections(
        boundary: &FeatureCollection,
        dwellings: &FeatureCollection,
    ) -> Result<Self, GeometryError> {
        let outline = boundary
            .features
            .first()
            .ok_or_else(|| GeometryError::EmptyCollection("boundary".to_string()))?;
        let boundary = Boundary::from_ring("boundary", &outline.outer_ring("boundary")?)?;

        let mut seen = HashSet::new();
        let mut sites = Vec::new();
        for (index, feature) in dwellings.features.iter().enumerate() {
            let label = feature.id().unwrap_or_else(|| format!("#{index}"));
            let kind = feature.property("type").and_then(|v| v.as_i64());
            if kind == Some(NON_RESIDENTIAL_KIND) {
                debug!(dwelling = %label, "skipping non-residential feature");
                continue;
            }
            let id = feature.id().ok_or_else(|| GeometryError::MissingProperty {
                feature: label.clone(),
                property: "id",
            })?;
            let max_occupancy =
                feature
                    .u32_property("max_occupancy")
                    .ok_or_else(|| GeometryError::MissingProperty {
                        feature: label.clone(),
                        property: "max_occupancy",
                    })?;
            if !seen.insert(id.clone()) {
                return Err(GeometryError::DuplicateDwelling(id));
            }

            let ring = feature.outer_ring(&label)?;
            let centroid = ring_centroid(&label, &ring)?;
            sites.push(DwellingSite {
                geometry: DwellingGeometry {
                    id: DwellingId(id),
                    kind,
                    ring,
                    centroid,
                },
                max_occupancy,
            });
        }

        Ok(Self {
            boundary,
            dwellings: sites,
        })
    }
}

/// Builds the initial world: every dwelling gets a random occupancy in
/// `1..=max_occupancy` and food in `0..=occupancy * food_per_occupant`, no
/// soldiers. Hordes are placed as given; empty ones and ones without a
/// finite position are skipped.
pub fn seed_world(
    map: &GameMap,
    hordes: &[HordeSpec],
    config: &GameConfig,
    rng: &mut dyn RandomSource,
) -> World {
    let mut world = World::new();
    for site in &map.dwellings {
        let geometry = site.geometry.clone();
        let mut state = Dwelling::new(geometry.id.clone(), geometry.centroid, site.max_occupancy);
        state.occupancy = rng.uniform_int(1.min(site.max_occupancy), site.max_occupancy);
        let food_cap = state.occupancy.saturating_mul(config.food_per_occupant);
        state.food = i64::from(rng.uniform_int(0, food_cap));
        world.add_dwelling(geometry, state);
    }
    for (index, horde) in hordes.iter().enumerate() {
        let size = horde.size.unwrap_or(config.default_horde_size);
        let position = LatLng::new(horde.lat, horde.lng);
        if size == 0 || !position.is_finite() {
            warn!(index, size, lat = horde.lat, lng = horde.lng, "skipping horde");
            continue;
        }
        world.spawn_horde(position, size);
    }
    world
}

impl Scenario {
    pub fn load_map(&self) -> Result<GameMap> {
        GameMap::load(&self.boundary, &self.dwellings)
            .with_context(|| format!("Failed to load map for scenario '{}'", self.name))
    }

    pub fn build_world(&self, map: &GameMap) -> World {
        let mut rng = SeededSource::stream(self.seed, "world");
        seed_world(map, &self.hordes, &self.config, &mut rng)
    }

    /// Loads the map, seeds the world and wires the default systems.
    pub fn build_engine(&self) -> Result<Engine> {
        let map = self.load_map()?;
        let world = self.build_world(&map);
        info!(
            scenario = %self.name,
            dwellings = world.dwellings().len(),
            hordes = world.hordes().len(),
            civilians = world.total_civilians(),
            "scenario loaded"
        );
        let settings = EngineSettings {
            scenario_name: self.name.clone(),
            seed: self.seed,
        };
        Ok(EngineBuilder::new(settings, self.config.clone(), map.boundary)
            .with_default_systems()
            .build(world))
    }
}
