//! Named performance checkpoints

use crate::{E2eError, E2eResult};
use std::time::{Duration, Instant};
use tracing::info;

pub const START: &str = "start";

#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub name: String,
    pub at: Instant,
}

/// Ordered list of checkpoints, always beginning with [`START`]
#[derive(Debug, Clone)]
pub struct Stopwatch {
    checkpoints: Vec<Checkpoint>,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            checkpoints: vec![Checkpoint {
                name: START.to_string(),
                at: Instant::now(),
            }],
        }
    }

    /// Drop every checkpoint and restart the clock
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::new();
        self
    }

    /// Record a checkpoint
    ///
    /// Unnamed checkpoints are numbered by position, skipping ahead to the
    /// next number no checkpoint holds yet. Only an explicit name can clash.
    pub fn lap(&mut self, name: Option<&str>) -> E2eResult<&mut Self> {
        let name = match name {
            Some(name) if self.index(name).is_some() => {
                return Err(E2eError::DuplicateCheckpoint(name.to_string()));
            }
            Some(name) => name.to_string(),
            None => self.next_number(),
        };

        self.checkpoints.push(Checkpoint {
            name,
            at: Instant::now(),
        });
        Ok(self)
    }

    /// Time between two checkpoints
    ///
    /// `check` defaults to the latest checkpoint and `last` to the one
    /// recorded just before `check`. `last` must not come after `check`.
    pub fn elapsed(&self, check: Option<&str>, last: Option<&str>) -> E2eResult<Duration> {
        let to = match check {
            Some(name) => self
                .index(name)
                .ok_or_else(|| E2eError::UnknownCheckpoint(name.to_string()))?,
            None => self.checkpoints.len() - 1,
        };
        let from = match last {
            Some(name) => self
                .index(name)
                .ok_or_else(|| E2eError::UnknownCheckpoint(name.to_string()))?,
            None => to.checked_sub(1).ok_or_else(|| {
                E2eError::NoPreviousCheckpoint(self.checkpoints[to].name.clone())
            })?,
        };

        if from > to {
            return Err(E2eError::CheckpointOrder {
                check: self.checkpoints[to].name.clone(),
                last: self.checkpoints[from].name.clone(),
            });
        }

        let check = &self.checkpoints[to];
        let duration = check.at.duration_since(self.checkpoints[from].at);
        info!("{} in {:.2} seconds", check.name, duration.as_secs_f64());
        Ok(duration)
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    fn next_number(&self) -> String {
        let mut number = self.checkpoints.len();
        while self.index(&number.to_string()).is_some() {
            number += 1;
        }
        number.to_string()
    }

    fn index(&self, name: &str) -> Option<usize> {
        self.checkpoints.iter().position(|c| c.name == name)
    }
}
