//! Game constants and the aid-type table.
//!
//! Every field carries a serde default, so a scenario only needs to name the
//! values it overrides.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AidType {
    AirFood,
    WaterFood,
    AirSoldier,
    WaterSoldier,
}

impl AidType {
    pub const ALL: [AidType; 4] = [
        AidType::AirFood,
        AidType::WaterFood,
        AidType::AirSoldier,
        AidType::WaterSoldier,
    ];

    /// Water deliveries arrive from the river and cannot reach points inside
    /// the boundary.
    pub fn is_water(self) -> bool {
        matches!(self, AidType::WaterFood | AidType::WaterSoldier)
    }

    pub fn payload(self) -> Payload {
        match self {
            AidType::AirFood | AidType::WaterFood => Payload::Food,
            AidType::AirSoldier | AidType::WaterSoldier => Payload::Soldiers,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AidType::AirFood => "air_food",
            AidType::WaterFood => "water_food",
            AidType::AirSoldier => "air_soldier",
            AidType::WaterSoldier => "water_soldier",
        }
    }
}

impl fmt::Display for AidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized aid type '{0}'")]
pub struct InvalidAidType(pub String);

impl FromStr for AidType {
    type Err = InvalidAidType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AidType::ALL
            .into_iter()
            .find(|aid| aid.as_str() == s.trim())
            .ok_or_else(|| InvalidAidType(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    Food,
    Soldiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerColor {
    Red,
    Blue,
}

/// Effect of one aid type: marker color, reach, maximum payload and how long
/// the player must wait before choosing it again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AidProfile {
    pub color: MarkerColor,
    pub radius_m: f64,
    pub amount: u32,
    pub cooldown_secs: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AidTable {
    #[serde(default = "default_air_food")]
    pub air_food: AidProfile,
    #[serde(default = "default_water_food")]
    pub water_food: AidProfile,
    #[serde(default = "default_air_soldier")]
    pub air_soldier: AidProfile,
    #[serde(default = "default_water_soldier")]
    pub water_soldier: AidProfile,
}

fn default_air_food() -> AidProfile {
    AidProfile {
        color: MarkerColor::Blue,
        radius_m: 50.0,
        amount: 40,
        cooldown_secs: 50,
    }
}

fn default_water_food() -> AidProfile {
    AidProfile {
        color: MarkerColor::Blue,
        radius_m: 110.0,
        amount: 30,
        cooldown_secs: 40,
    }
}

fn default_air_soldier() -> AidProfile {
    AidProfile {
        color: MarkerColor::Red,
        radius_m: 45.0,
        amount: 3,
        cooldown_secs: 90,
    }
}

fn default_water_soldier() -> AidProfile {
    AidProfile {
        color: MarkerColor::Red,
        radius_m: 100.0,
        amount: 2,
        cooldown_secs: 50,
    }
}

impl Default for AidTable {
    fn default() -> Self {
        Self {
            air_food: default_air_food(),
            water_food: default_water_food(),
            air_soldier: default_air_soldier(),
            water_soldier: default_water_soldier(),
        }
    }
}

impl AidTable {
    pub fn get(&self, aid: AidType) -> &AidProfile {
        match aid {
            AidType::AirFood => &self.air_food,
            AidType::WaterFood => &self.water_food,
            AidType::AirSoldier => &self.air_soldier,
            AidType::WaterSoldier => &self.water_soldier,
        }
    }

    pub fn get_mut(&mut self, aid: AidType) -> &mut AidProfile {
        match aid {
            AidType::AirFood => &mut self.air_food,
            AidType::WaterFood => &mut self.water_food,
            AidType::AirSoldier => &mut self.air_soldier,
            AidType::WaterSoldier => &mut self.water_soldier,
        }
    }
}

fn default_hour_ms() -> u64 {
    1_000
}

fn default_hours_per_day() -> u64 {
    12
}

fn default_countdown_ms() -> u64 {
    1_000
}

fn default_drop_expiry_hours() -> u64 {
    2
}

fn default_win_settle_ms() -> u64 {
    1_000
}

fn default_horde_size() -> u32 {
    50
}

fn default_soldier_kill_risk() -> f64 {
    0.5
}

fn default_horde_kill_risk() -> f64 {
    0.25
}

fn default_soldier_kill_radius() -> f64 {
    50.0
}

fn default_food_per_occupant() -> u32 {
    50
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Period of the fast (combat) tick.
    #[serde(default = "default_hour_ms")]
    pub hour_ms: u64,
    /// Fast ticks per slow (decay and migration) tick.
    #[serde(default = "default_hours_per_day")]
    pub hours_per_day: u64,
    /// Period of the cooldown countdown.
    #[serde(default = "default_countdown_ms")]
    pub countdown_ms: u64,
    #[serde(default = "default_drop_expiry_hours")]
    pub drop_expiry_hours: u64,
    #[serde(default = "default_win_settle_ms")]
    pub win_settle_ms: u64,
    /// Floor on a horde's reach, so small hordes stay dangerous.
    #[serde(default = "default_horde_size")]
    pub default_horde_size: u32,
    #[serde(default = "default_soldier_kill_risk")]
    pub soldier_kill_risk: f64,
    #[serde(default = "default_horde_kill_risk")]
    pub horde_kill_risk: f64,
    /// Extra reach added when soldiers engage a horde.
    #[serde(default = "default_soldier_kill_radius")]
    pub soldier_kill_radius: f64,
    /// Initial food ceiling per occupant when seeding dwellings.
    #[serde(default = "default_food_per_occupant")]
    pub food_per_occupant: u32,
    #[serde(default)]
    pub aid: AidTable,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            hour_ms: default_hour_ms(),
            hours_per_day: default_hours_per_day(),
            countdown_ms: default_countdown_ms(),
            drop_expiry_hours: default_drop_expiry_hours(),
            win_settle_ms: default_win_settle_ms(),
            default_horde_size: default_horde_size(),
            soldier_kill_risk: default_soldier_kill_risk(),
            horde_kill_risk: default_horde_kill_risk(),
            soldier_kill_radius: default_soldier_kill_radius(),
            food_per_occupant: default_food_per_occupant(),
            aid: AidTable::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroPeriod(&'static str),
    #[error("{name} must lie in [0, 1], got {value}")]
    Probability { name: &'static str, value: f64 },
    #[error("{name} must be a finite, non-negative distance, got {value}")]
    Distance { name: String, value: f64 },
    #[error("{0} overflows the millisecond clock")]
    Overflow(&'static str),
}

impl GameConfig {
    pub fn day_ms(&self) -> u64 {
        self.hour_ms.saturating_mul(self.hours_per_day)
    }

    pub fn drop_expiry_ms(&self) -> u64 {
        self.hour_ms.saturating_mul(self.drop_expiry_hours)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hour_ms == 0 {
            return Err(ConfigError::ZeroPeriod("hour_ms"));
        }
        if self.hours_per_day == 0 {
            return Err(ConfigError::ZeroPeriod("hours_per_day"));
        }
        if self.countdown_ms == 0 {
            return Err(ConfigError::ZeroPeriod("countdown_ms"));
        }
        if self.hour_ms.checked_mul(self.hours_per_day).is_none() {
            return Err(ConfigError::Overflow("hour_ms * hours_per_day"));
        }
        if self.hour_ms.checked_mul(self.drop_expiry_hours).is_none() {
            return Err(ConfigError::Overflow("hour_ms * drop_expiry_hours"));
        }
        for (name, value) in [
            ("soldier_kill_risk", self.soldier_kill_risk),
            ("horde_kill_risk", self.horde_kill_risk),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { name, value });
            }
        }
        check_distance("soldier_kill_radius", self.soldier_kill_radius)?;
        for aid in AidType::ALL {
            check_distance(&format!("aid.{aid}.radius_m"), self.aid.get(aid).radius_m)?;
        }
        Ok(())
    }
}

fn check_distance(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Distance {
            name: name.to_string(),
            value,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let config = GameConfig::default();
        assert_eq!(config.day_ms(), 12_000);
        assert_eq!(config.drop_expiry_ms(), 2_000);
        assert_eq!(config.aid.get(AidType::AirSoldier).amount, 3);
        assert_eq!(config.aid.get(AidType::WaterFood).radius_m, 110.0);
        assert_eq!(config.aid.get(AidType::AirFood).color, MarkerColor::Blue);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "soldier_kill_risk: 1.0\naid:\n  air_food:\n    color: red\n    radius_m: 0\n    amount: 10\n    cooldown_secs: 5\n";
        let config: GameConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.soldier_kill_risk, 1.0);
        assert_eq!(config.horde_kill_risk, 0.25);
        assert_eq!(config.aid.air_food.amount, 10);
        assert_eq!(config.aid.water_soldier, default_water_soldier());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = GameConfig {
            horde_kill_risk: 1.5,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Probability { name: "horde_kill_risk", .. })
        ));

        config.horde_kill_risk = 0.25;
        config.hours_per_day = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroPeriod("hours_per_day"))
        );

        config.hours_per_day = 12;
        config.aid.get_mut(AidType::WaterSoldier).radius_m = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Distance { .. })));
    }

    #[test]
    fn test_validation_rejects_clock_overflow() {
        let mut config = GameConfig {
            hour_ms: u64::MAX / 2,
            ..GameConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Overflow("hour_ms * hours_per_day"))
        );

        config.hours_per_day = 1;
        config.drop_expiry_hours = 3;
        assert_eq!(
            config.validate(),
            Err(ConfigError::Overflow("hour_ms * drop_expiry_hours"))
        );

        config.drop_expiry_hours = 2;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_aid_type_parsing() {
        assert_eq!("water_food".parse::<AidType>(), Ok(AidType::WaterFood));
        assert_eq!(
            "parachute".parse::<AidType>(),
            Err(InvalidAidType("parachute".to_string()))
        );
        assert!(AidType::WaterSoldier.is_water());
        assert!(!AidType::AirSoldier.is_water());
        assert_eq!(AidType::AirFood.payload(), Payload::Food);
    }
}
