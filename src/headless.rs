//! Runs a scenario to completion without a front end.

use std::collections::VecDeque;
use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    engine::{Engine, GamePhase},
    events::{GameEvent, Notification},
    scenario::ScriptedDrop,
    snapshot::SnapshotWriter,
    world::ScoreBoard,
};

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub scenario: String,
    pub phase: GamePhase,
    pub days: u64,
    pub hours: u64,
    pub hordes_remaining: usize,
    pub score: ScoreBoard,
    pub civilians_saved: u64,
    pub drops_placed: usize,
    pub drops_rejected: usize,
    pub snapshots: Vec<PathBuf>,
}

/// Drives an engine one simulated hour at a time, placing scripted drops at
/// their scheduled instants, until the game is won or `max_days` pass.
pub struct HeadlessRunner {
    engine: Engine,
    max_days: u64,
    drops: VecDeque<ScriptedDrop>,
    writer: Option<SnapshotWriter>,
}

impl HeadlessRunner {
    pub fn new(engine: Engine, max_days: u64) -> Self {
        Self {
            engine,
            max_days,
            drops: VecDeque::new(),
            writer: None,
        }
    }

    pub fn with_scripted_drops(mut self, drops: &[ScriptedDrop]) -> Self {
        let mut drops = drops.to_vec();
        drops.sort_by_key(|drop| drop.at_ms);
        self.drops = drops.into();
        self
    }

    pub fn with_snapshot_writer(mut self, writer: SnapshotWriter) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn run(&mut self) -> Result<RunReport> {
        self.run_with_hook(|_| {})
    }

    /// Like [`HeadlessRunner::run`], passing every notification to `hook`.
    pub fn run_with_hook<F>(&mut self, mut hook: F) -> Result<RunReport>
    where
        F: FnMut(&Notification),
    {
        let mut placed = 0;
        let mut rejected = 0;
        let mut snapshots = Vec::new();

        self.engine.start_game();
        let mut pending = self.engine.advance(0)?;
        let hour_ms = self.engine.config().hour_ms;

        loop {
            for notification in pending.drain(..) {
                match &notification {
                    Notification::Event(GameEvent::DropPlaced { .. }) => placed += 1,
                    Notification::Event(GameEvent::DropRejected { .. }) => rejected += 1,
                    Notification::Snapshot(snapshot) => {
                        if let Some(writer) = self.writer.as_mut() {
                            if let Some(path) = writer.maybe_write(snapshot)? {
                                debug!(path = %path.display(), "snapshot written");
                                snapshots.push(path);
                            }
                        }
                    }
                    Notification::Event(_) => {}
                }
                hook(&notification);
            }

            if self.engine.is_won() {
                break;
            }
            if self.engine.day() >= self.max_days && !self.engine.is_settling() {
                break;
            }

            let now = self.engine.now_ms();
            while self.drops.front().is_some_and(|drop| drop.at_ms <= now) {
                if let Some(drop) = self.drops.pop_front() {
                    self.engine.place_supply_drop(drop.aid_type, drop.position());
                }
            }
            let step = self
                .drops
                .front()
                .map(|drop| drop.at_ms - now)
                .filter(|&until| until < hour_ms)
                .unwrap_or(hour_ms);
            pending = self.engine.advance(step)?;
        }

        let score = self.engine.world().score().clone();
        let report = RunReport {
            scenario: self.engine.scenario_name().to_string(),
            phase: self.engine.phase(),
            days: self.engine.day(),
            hours: self.engine.hour(),
            hordes_remaining: self.engine.world().hordes().len(),
            civilians_saved: score.civilians_saved(),
            score,
            drops_placed: placed,
            drops_rejected: rejected,
            snapshots,
        };
        info!(
            scenario = %report.scenario,
            phase = ?report.phase,
            days = report.days,
            civilians_saved = report.civilians_saved,
            "run finished"
        );
        Ok(report)
    }
}
