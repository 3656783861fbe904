use crate::{
    config::{AidType, GameConfig, MarkerColor, Payload},
    events::RejectReason,
    rng::RandomSource,
    spatial::{self, Boundary, LatLng},
    world::{DwellingId, World},
};

#[derive(Debug, Clone, PartialEq)]
pub struct DropOutcome {
    pub aid_type: AidType,
    pub position: LatLng,
    pub radius_m: f64,
    pub color: MarkerColor,
    pub affected: Vec<DwellingId>,
}

/// Delivers one supply drop to every dwelling whose centroid lies strictly
/// inside the drop radius. Each dwelling receives `ceil(u * amount)` of the
/// payload for an independent draw `u`.
///
/// Water drops aimed inside the boundary are rejected without touching any
/// dwelling or drawing from `rng`.
pub fn resolve_supply_drop(
    world: &mut World,
    boundary: &Boundary,
    config: &GameConfig,
    aid_type: AidType,
    position: LatLng,
    rng: &mut dyn RandomSource,
) -> Result<DropOutcome, RejectReason> {
    if aid_type.is_water() && spatial::point_in_boundary(position, boundary) {
        return Err(RejectReason::WaterInsideBoundary);
    }

    let profile = config.aid.get(aid_type);
    let mut affected = Vec::new();
    for dwelling in world.dwellings_mut() {
        let within = spatial::distance(position, dwelling.position) < profile.radius_m;
        if !within {
            continue;
        }
        let delivered = (rng.next_unit() * f64::from(profile.amount)).ceil() as u32;
        match aid_type.payload() {
            Payload::Soldiers => dwelling.soldiers += delivered,
            Payload::Food => dwelling.food += i64::from(delivered),
        }
        affected.push(dwelling.id.clone());
    }

    Ok(DropOutcome {
        aid_type,
        position,
        radius_m: profile.radius_m,
        color: profile.color,
        affected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedSource;
    use crate::world::{Dwelling, DwellingGeometry};

    fn boundary() -> Boundary {
        Boundary::from_ring(
            "island",
            &[
                LatLng::new(45.38, -73.97),
                LatLng::new(45.38, -73.93),
                LatLng::new(45.40, -73.93),
                LatLng::new(45.40, -73.97),
            ],
        )
        .unwrap()
    }

    fn world_at(points: &[LatLng]) -> World {
        let mut world = World::new();
        for (i, point) in points.iter().enumerate() {
            let id = DwellingId(format!("d{i}"));
            let geometry = DwellingGeometry {
                id: id.clone(),
                kind: None,
                ring: Vec::new(),
                centroid: *point,
            };
            let mut dwelling = Dwelling::new(id, *point, 8);
            dwelling.occupancy = 4;
            dwelling.food = 10;
            world.add_dwelling(geometry, dwelling);
        }
        world
    }

    #[test]
    fn test_air_food_reaches_dwellings_in_radius() {
        let center = LatLng::new(45.39, -73.95);
        let near = spatial::destination_point(center, 30.0, 10.0);
        let far = spatial::destination_point(center, 80.0, 10.0);
        let mut world = world_at(&[near, far]);
        let mut rng = ScriptedSource::new([0.5]);
        let outcome = resolve_supply_drop(
            &mut world,
            &boundary(),
            &GameConfig::default(),
            AidType::AirFood,
            center,
            &mut rng,
        )
        .unwrap();

        assert_eq!(outcome.affected, vec![DwellingId("d0".into())]);
        assert_eq!(outcome.radius_m, 50.0);
        assert_eq!(world.dwellings()[0].food, 30);
        assert_eq!(world.dwellings()[1].food, 10);
    }

    #[test]
    fn test_soldier_drop_rounds_up() {
        let center = LatLng::new(45.39, -73.95);
        let mut world = world_at(&[center]);
        let mut rng = ScriptedSource::new([0.01]);
        resolve_supply_drop(
            &mut world,
            &boundary(),
            &GameConfig::default(),
            AidType::AirSoldier,
            center,
            &mut rng,
        )
        .unwrap();
        assert_eq!(world.dwellings()[0].soldiers, 1);
    }

    #[test]
    fn test_water_drop_inside_boundary_is_rejected() {
        let center = LatLng::new(45.39, -73.95);
        let mut world = world_at(&[center]);
        let before = world.dwellings().to_vec();
        let mut rng = ScriptedSource::constant(0.5);
        let result = resolve_supply_drop(
            &mut world,
            &boundary(),
            &GameConfig::default(),
            AidType::WaterSoldier,
            center,
            &mut rng,
        );
        assert_eq!(result, Err(RejectReason::WaterInsideBoundary));
        assert_eq!(world.dwellings(), before.as_slice());
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_water_drop_from_the_river_is_accepted() {
        let edge = LatLng::new(45.40, -73.95);
        let river = spatial::destination_point(edge, 40.0, 0.0);
        let inside = spatial::destination_point(edge, 40.0, 180.0);
        let mut world = world_at(&[inside]);
        let mut rng = ScriptedSource::constant(0.99);
        let outcome = resolve_supply_drop(
            &mut world,
            &boundary(),
            &GameConfig::default(),
            AidType::WaterFood,
            river,
            &mut rng,
        )
        .unwrap();
        assert_eq!(outcome.affected.len(), 1);
        assert_eq!(world.dwellings()[0].food, 40);
    }

    #[test]
    fn test_zero_radius_changes_nothing() {
        let center = LatLng::new(45.39, -73.95);
        let mut world = world_at(&[center]);
        let before = world.dwellings().to_vec();
        let mut config = GameConfig::default();
        config.aid.get_mut(AidType::AirFood).radius_m = 0.0;
        let mut rng = ScriptedSource::constant(0.5);
        let outcome = resolve_supply_drop(
            &mut world,
            &boundary(),
            &config,
            AidType::AirFood,
            center,
            &mut rng,
        )
        .unwrap();
        assert!(outcome.affected.is_empty());
        assert_eq!(world.dwellings(), before.as_slice());
    }
}
