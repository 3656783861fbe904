//! Game session and clock.
//!
//! The engine owns every entity collection, the boundary and the random
//! source. Time is simulated in milliseconds: [`Engine::advance`] fires every
//! timer that falls due, in time order, and reports what happened through a
//! hook. At a shared instant the order is cooldown countdowns, fast tick,
//! slow tick, drop expiries, then the win.

use std::collections::{BTreeMap, VecDeque};
use std::time::Instant;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    config::{AidType, GameConfig, InvalidAidType, MarkerColor},
    events::{Action, DropId, GameEvent, Notification, RejectReason},
    rng::{RandomSource, SeededSource},
    snapshot::{CooldownSnapshot, DropSnapshot, GameSnapshot},
    spatial::{Boundary, LatLng},
    systems::{self, BookkeepingSystem, CombatSystem, DecaySystem, MigrationSystem},
    world::{DwellingId, World},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    NotStarted,
    Running,
    Won,
}

/// Which schedule a system belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Fast tick: combat.
    Hourly,
    /// Slow tick: decay and migration.
    Daily,
    /// After both kinds of tick.
    Always,
}

impl Cadence {
    fn runs_on(self, tick: Cadence) -> bool {
        self == Cadence::Always || self == tick
    }
}

pub struct SystemContext<'a> {
    pub config: &'a GameConfig,
    pub boundary: &'a Boundary,
    pub hour: u64,
    pub day: u64,
}

pub trait System: Send {
    fn name(&self) -> &str;
    fn cadence(&self) -> Cadence;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut dyn RandomSource,
    ) -> Result<Vec<GameEvent>>;
}

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    config: GameConfig,
    boundary: Boundary,
    systems: Vec<Box<dyn System>>,
    rng: Option<Box<dyn RandomSource + Send>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings, config: GameConfig, boundary: Boundary) -> Self {
        Self {
            settings,
            config,
            boundary,
            systems: Vec::new(),
            rng: None,
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    /// Combat on the fast tick, decay then migration on the slow tick, and
    /// bookkeeping after each.
    pub fn with_default_systems(self) -> Self {
        self.with_system(CombatSystem::new())
            .with_system(DecaySystem::new())
            .with_system(MigrationSystem::new())
            .with_system(BookkeepingSystem::new())
    }

    /// Replaces the seeded source, e.g. with a scripted one in tests.
    pub fn with_random_source(mut self, rng: impl RandomSource + Send + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    pub fn build(self, world: World) -> Engine {
        let rng = self.rng.unwrap_or_else(|| {
            Box::new(SeededSource::stream(self.settings.seed, "simulation"))
        });
        Engine {
            settings: self.settings,
            config: self.config,
            boundary: self.boundary,
            world,
            rng,
            systems: self.systems,
            phase: GamePhase::NotStarted,
            now_ms: 0,
            hour: 0,
            day: 0,
            next_hour_ms: None,
            next_day_ms: None,
            win_at_ms: None,
            cooldowns: BTreeMap::new(),
            drops: Vec::new(),
            next_drop: 0,
            queue: VecDeque::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct ActiveDrop {
    id: DropId,
    aid_type: AidType,
    position: LatLng,
    radius_m: f64,
    color: MarkerColor,
    affected: Vec<DwellingId>,
    expires_at_ms: u64,
}

/// Countdown for one aid type, anchored at the moment its drop landed.
#[derive(Debug, Clone, Copy)]
struct Cooldown {
    remaining_secs: u32,
    next_tick_ms: u64,
}

pub struct Engine {
    settings: EngineSettings,
    config: GameConfig,
    boundary: Boundary,
    world: World,
    rng: Box<dyn RandomSource + Send>,
    systems: Vec<Box<dyn System>>,
    phase: GamePhase,
    now_ms: u64,
    hour: u64,
    day: u64,
    next_hour_ms: Option<u64>,
    next_day_ms: Option<u64>,
    win_at_ms: Option<u64>,
    cooldowns: BTreeMap<AidType, Cooldown>,
    drops: Vec<ActiveDrop>,
    next_drop: u64,
    queue: VecDeque<Action>,
}

impl Engine {
    /// Queues a player action for the next tick boundary.
    pub fn dispatch(&mut self, action: Action) {
        self.queue.push_back(action);
    }

    pub fn start_game(&mut self) {
        self.dispatch(Action::StartGame);
    }

    pub fn place_supply_drop(&mut self, aid_type: AidType, position: LatLng) {
        self.dispatch(Action::PlaceDrop { aid_type, position });
    }

    /// Queues a drop named by its wire identifier. Unknown names are logged
    /// and dropped.
    pub fn place_supply_drop_raw(
        &mut self,
        aid_type: &str,
        position: LatLng,
    ) -> Result<(), InvalidAidType> {
        match aid_type.parse::<AidType>() {
            Ok(aid_type) => {
                self.place_supply_drop(aid_type, position);
                Ok(())
            }
            Err(err) => {
                warn!(%err, "supply drop ignored");
                Err(err)
            }
        }
    }

    /// Advances simulated time by `dt_ms` and collects everything published.
    pub fn advance(&mut self, dt_ms: u64) -> Result<Vec<Notification>> {
        let mut out = Vec::new();
        self.advance_with_hook(dt_ms, |notification| out.push(notification))?;
        Ok(out)
    }

    pub fn advance_with_hook<F>(&mut self, dt_ms: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(Notification),
    {
        let target = self.now_ms.saturating_add(dt_ms);
        self.drain_actions(&mut hook);
        while let Some(due) = self.next_due().filter(|&due| due <= target) {
            self.now_ms = due;
            self.fire_due(&mut hook)?;
        }
        self.now_ms = target;
        Ok(())
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_won(&self) -> bool {
        self.phase == GamePhase::Won
    }

    /// True between the roster emptying and the win being surfaced.
    pub fn is_settling(&self) -> bool {
        self.win_at_ms.is_some()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn hour(&self) -> u64 {
        self.hour
    }

    pub fn day(&self) -> u64 {
        self.day
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }

    pub fn cooldown(&self, aid_type: AidType) -> Option<u32> {
        self.cooldowns
            .get(&aid_type)
            .map(|cooldown| cooldown.remaining_secs)
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            scenario: self.settings.scenario_name.clone(),
            phase: self.phase,
            elapsed_ms: self.now_ms,
            hour: self.hour,
            day: self.day,
            dwellings: self.world.dwelling_snapshots(),
            hordes: self.world.horde_snapshots(self.config.default_horde_size),
            score: self.world.score().clone(),
            civilians_saved: self.world.score().civilians_saved(),
            cooldowns: self
                .cooldowns
                .iter()
                .map(|(&aid_type, cooldown)| CooldownSnapshot {
                    aid_type,
                    remaining_secs: cooldown.remaining_secs,
                })
                .collect(),
            drops: self
                .drops
                .iter()
                .map(|drop| DropSnapshot {
                    drop_id: drop.id,
                    aid_type: drop.aid_type,
                    position: drop.position,
                    radius_m: drop.radius_m,
                    color: drop.color,
                    affected: drop.affected.clone(),
                    expires_at_ms: drop.expires_at_ms,
                })
                .collect(),
        }
    }

    fn next_due(&self) -> Option<u64> {
        [
            self.cooldowns.values().map(|c| c.next_tick_ms).min(),
            self.next_hour_ms,
            self.next_day_ms,
            self.drops.iter().map(|drop| drop.expires_at_ms).min(),
            self.win_at_ms,
        ]
        .into_iter()
        .flatten()
        .min()
    }

    fn fire_due<F>(&mut self, hook: &mut F) -> Result<()>
    where
        F: FnMut(Notification),
    {
        let now = self.now_ms;

        self.count_down(now, hook);

        if self.next_hour_ms == Some(now) {
            self.next_hour_ms = Some(now + self.config.hour_ms);
            self.hour += 1;
            self.run_tick(Cadence::Hourly, hook)?;
        }

        if self.next_day_ms == Some(now) {
            self.next_day_ms = Some(now.saturating_add(self.config.day_ms()));
            self.day += 1;
            self.run_tick(Cadence::Daily, hook)?;
        }

        let (expired, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.drops)
            .into_iter()
            .partition(|drop| drop.expires_at_ms <= now);
        self.drops = live;
        for drop in expired {
            debug!(drop = drop.id.0, "supply drop expired");
            hook(Notification::Event(GameEvent::DropExpired { drop_id: drop.id }));
        }

        if self.win_at_ms == Some(now) {
            self.surface_win(hook);
        }
        Ok(())
    }

    fn count_down<F>(&mut self, now: u64, hook: &mut F)
    where
        F: FnMut(Notification),
    {
        let period = self.config.countdown_ms;
        let mut finished = Vec::new();
        for (&aid_type, cooldown) in self.cooldowns.iter_mut() {
            if cooldown.next_tick_ms != now {
                continue;
            }
            cooldown.remaining_secs = cooldown.remaining_secs.saturating_sub(1);
            cooldown.next_tick_ms = now.saturating_add(period);
            if cooldown.remaining_secs == 0 {
                finished.push(aid_type);
            }
        }
        for aid_type in finished {
            self.cooldowns.remove(&aid_type);
            hook(Notification::Event(GameEvent::CooldownFinished { aid_type }));
        }
    }

    fn run_tick<F>(&mut self, tick: Cadence, hook: &mut F) -> Result<()>
    where
        F: FnMut(Notification),
    {
        let ctx = SystemContext {
            config: &self.config,
            boundary: &self.boundary,
            hour: self.hour,
            day: self.day,
        };
        for system in self.systems.iter_mut() {
            if !system.cadence().runs_on(tick) {
                continue;
            }
            let start = Instant::now();
            let events = system.run(&ctx, &mut self.world, self.rng.as_mut())?;
            debug!(
                system = system.name(),
                elapsed_us = start.elapsed().as_micros() as u64,
                "system ran"
            );
            for event in events {
                hook(Notification::Event(event));
            }
        }
        hook(Notification::Snapshot(Box::new(self.snapshot())));
        self.check_victory(hook);
        Ok(())
    }

    fn check_victory<F>(&mut self, hook: &mut F)
    where
        F: FnMut(Notification),
    {
        if self.phase != GamePhase::Running
            || self.win_at_ms.is_some()
            || !self.world.hordes().is_empty()
        {
            return;
        }
        info!(hour = self.hour, "all hordes destroyed");
        self.next_hour_ms = None;
        self.next_day_ms = None;
        self.win_at_ms = Some(self.now_ms + self.config.win_settle_ms);
        hook(Notification::Event(GameEvent::HordesCleared));
    }

    fn surface_win<F>(&mut self, hook: &mut F)
    where
        F: FnMut(Notification),
    {
        self.phase = GamePhase::Won;
        self.win_at_ms = None;
        self.cooldowns.clear();
        self.drops.clear();
        self.queue.clear();

        let civilians_saved = self.world.score().civilians_saved();
        info!(
            civilians_saved,
            total_civilians = self.world.score().total_civilians,
            "game won"
        );
        hook(Notification::Snapshot(Box::new(self.snapshot())));
        hook(Notification::Event(GameEvent::GameWon { civilians_saved }));
    }

    fn drain_actions<F>(&mut self, hook: &mut F)
    where
        F: FnMut(Notification),
    {
        while let Some(action) = self.queue.pop_front() {
            match action {
                Action::StartGame => self.begin(hook),
                Action::PlaceDrop {
                    aid_type,
                    position,
                } => self.apply_drop(aid_type, position, hook),
            }
        }
    }

    fn begin<F>(&mut self, hook: &mut F)
    where
        F: FnMut(Notification),
    {
        if self.phase != GamePhase::NotStarted {
            debug!(phase = ?self.phase, "start ignored");
            return;
        }
        self.phase = GamePhase::Running;
        self.world.record_total_civilians();
        self.next_hour_ms = Some(self.now_ms + self.config.hour_ms);
        self.next_day_ms = Some(self.now_ms.saturating_add(self.config.day_ms()));

        let total_civilians = self.world.score().total_civilians;
        let hordes = self.world.hordes().len();
        info!(
            scenario = %self.settings.scenario_name,
            total_civilians,
            hordes,
            "game started"
        );
        hook(Notification::Event(GameEvent::GameStarted {
            total_civilians,
            hordes,
        }));
        hook(Notification::Snapshot(Box::new(self.snapshot())));
        self.check_victory(hook);
    }

    fn apply_drop<F>(&mut self, aid_type: AidType, position: LatLng, hook: &mut F)
    where
        F: FnMut(Notification),
    {
        let rejection = if self.phase != GamePhase::Running || self.win_at_ms.is_some() {
            Some(RejectReason::NotRunning)
        } else {
            self.cooldowns
                .get(&aid_type)
                .map(|cooldown| RejectReason::CoolingDown {
                    remaining_secs: cooldown.remaining_secs,
                })
        };
        let outcome = match rejection {
            Some(reason) => Err(reason),
            None => systems::resolve_supply_drop(
                &mut self.world,
                &self.boundary,
                &self.config,
                aid_type,
                position,
                self.rng.as_mut(),
            ),
        };

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(reason) => {
                warn!(%aid_type, ?reason, "supply drop rejected");
                hook(Notification::Event(GameEvent::DropRejected {
                    aid_type,
                    position,
                    reason,
                }));
                return;
            }
        };

        let id = DropId(self.next_drop);
        self.next_drop += 1;
        let cooldown_secs = self.config.aid.get(aid_type).cooldown_secs;
        if cooldown_secs > 0 {
            self.cooldowns.insert(
                aid_type,
                Cooldown {
                    remaining_secs: cooldown_secs,
                    next_tick_ms: self.now_ms + self.config.countdown_ms,
                },
            );
        }
        info!(
            drop = id.0,
            %aid_type,
            dwellings = outcome.affected.len(),
            "supply drop delivered"
        );
        self.drops.push(ActiveDrop {
            id,
            aid_type,
            position,
            radius_m: outcome.radius_m,
            color: outcome.color,
            affected: outcome.affected.clone(),
            expires_at_ms: self.now_ms.saturating_add(self.config.drop_expiry_ms()),
        });
        hook(Notification::Event(GameEvent::DropPlaced {
            drop_id: id,
            aid_type,
            position,
            radius_m: outcome.radius_m,
            color: outcome.color,
            affected: outcome.affected,
        }));
        hook(Notification::Snapshot(Box::new(self.snapshot())));
    }
}
