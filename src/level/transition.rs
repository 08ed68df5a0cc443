//! Level transition sequencer
//!
//! A transition is started once per warp and always finishes: the generator
//! answer, a generator failure, or a dropped reply all resolve to a level
//! (the offline catalog covers the failures). The resolved level is held
//! back until the minimum transition time has passed.

use async_channel::{Receiver, TryRecvError};

use super::catalog::FallbackCatalog;
use super::generator::{LevelGenerator, LevelRequest, SummaryRequest};
use super::Level;
use crate::error::GenerationError;

/// Review text used when the generator cannot provide one
pub const MISSION_LOG_PLACEHOLDER: &str = "Mission Log Terminated.";

/// One in-flight warp
#[derive(Debug)]
pub struct LevelTransition {
    receiver: Receiver<Result<Level, GenerationError>>,
    previous_level_name: String,
    started_tick: u64,
    min_ticks: u64,
    resolved: Option<Level>,
    used_fallback: bool,
    finished: bool,
}

impl LevelTransition {
    /// Send the request and start the clock
    pub fn begin(
        generator: &mut dyn LevelGenerator,
        request: LevelRequest,
        now_tick: u64,
        min_ticks: u64,
    ) -> Self {
        let (tx, rx) = async_channel::unbounded();
        let previous_level_name = request.previous_level_name.clone();
        log::info!("Requesting level after {}", previous_level_name);
        generator.request_level(request, tx);
        Self {
            receiver: rx,
            previous_level_name,
            started_tick: now_tick,
            min_ticks,
            resolved: None,
            used_fallback: false,
            finished: false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether the offline catalog supplied the level
    pub fn used_fallback(&self) -> bool {
        self.used_fallback
    }

    /// Ticks since the warp began
    pub fn elapsed(&self, now_tick: u64) -> u64 {
        now_tick.saturating_sub(self.started_tick)
    }

    /// 0..=1 progress through the minimum transition time
    pub fn progress(&self, now_tick: u64) -> f32 {
        if self.min_ticks == 0 {
            return 1.0;
        }
        (self.elapsed(now_tick) as f32 / self.min_ticks as f32).min(1.0)
    }

    /// Check for an answer; returns the level once, when it may be applied
    pub fn poll(&mut self, now_tick: u64, catalog: &mut FallbackCatalog) -> Option<Level> {
        if self.finished {
            return None;
        }

        if self.resolved.is_none() {
            let outcome = match self.receiver.try_recv() {
                Ok(result) => Some(result),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Closed) => Some(Err(GenerationError::Disconnected)),
            };
            if let Some(result) = outcome {
                self.resolve(result, catalog);
            }
        }

        if self.resolved.is_some() && self.elapsed(now_tick) >= self.min_ticks {
            self.finished = true;
            return self.resolved.take();
        }
        None
    }

    fn resolve(&mut self, result: Result<Level, GenerationError>, catalog: &mut FallbackCatalog) {
        let checked = result.and_then(|level| {
            level.validate()?;
            Ok(level)
        });
        let level = match checked {
            Ok(level) => {
                log::info!("Generated level {}", level.name);
                level
            }
            Err(e) => {
                log::warn!("Level generation failed ({}), using offline catalog", e);
                self.used_fallback = true;
                catalog.pick(&self.previous_level_name)
            }
        };
        self.resolved = Some(level);
    }
}

/// End-of-run review request in flight
#[derive(Debug)]
pub struct PendingReview {
    receiver: Receiver<Result<String, GenerationError>>,
}

impl PendingReview {
    pub fn begin(generator: &mut dyn LevelGenerator, request: SummaryRequest) -> Self {
        let (tx, rx) = async_channel::unbounded();
        generator.request_summary(request, tx);
        Self { receiver: rx }
    }

    /// The review text once available (placeholder on failure)
    pub fn poll(&self) -> Option<String> {
        match self.receiver.try_recv() {
            Ok(Ok(text)) => Some(text),
            Ok(Err(e)) => {
                log::warn!("Performance review unavailable: {}", e);
                Some(MISSION_LOG_PLACEHOLDER.to_string())
            }
            Err(TryRecvError::Closed) => Some(MISSION_LOG_PLACEHOLDER.to_string()),
            Err(TryRecvError::Empty) => None,
        }
    }
}
