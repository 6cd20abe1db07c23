//! Slideshow projection and its auto-advance timer.
//!
//! # Responsibility
//! - Order slides like the page view, driven by `present_order`.
//! - Model playback as a cooperative state machine advanced by `tick`.
//!
//! # Invariants
//! - `Idle`/`Paused` never advance on `tick`.
//! - Manual navigation resets the countdown; `pause` keeps the position.
//! - With `present_auto = false` the player stays `Idle` until navigated.

use crate::model::item::Item;
use crate::model::view::{PresentWrap, ViewSettings};
use crate::projection::page::ordered_linear;
use crate::projection::snapshot::{TreeSnapshot, ViewerAccess};
use crate::projection::ProjectionError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentView {
    pub slides: Vec<Item>,
    pub auto: bool,
    pub delay_ms: u32,
    pub wrap: PresentWrap,
}

pub fn project_present(snapshot: &TreeSnapshot, access: ViewerAccess) -> PresentView {
    let settings: &ViewSettings = &snapshot.settings;
    PresentView {
        slides: ordered_linear(snapshot, access, &settings.present_order),
        auto: settings.present_auto,
        delay_ms: settings.present_delay_ms,
        wrap: settings.present_wrap,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    Idle,
    Playing,
    Paused,
}

/// Playback position over a fixed number of slides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentPlayer {
    len: usize,
    index: usize,
    state: PlayerState,
    auto: bool,
    delay_ms: u64,
    wrap: PresentWrap,
    elapsed_ms: u64,
}

impl PresentPlayer {
    /// Starts at slide 0, `Playing` when auto-advance is on and there is a
    /// slide to show.
    pub fn new(view: &PresentView) -> Self {
        let len = view.slides.len();
        let state = if view.auto && len > 0 {
            PlayerState::Playing
        } else {
            PlayerState::Idle
        };
        Self {
            len,
            index: 0,
            state,
            auto: view.auto,
            delay_ms: u64::from(view.delay_ms.max(1)),
            wrap: view.wrap,
            elapsed_ms: 0,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Current slide index; `None` for an empty deck.
    pub fn current(&self) -> Option<usize> {
        (self.len > 0).then_some(self.index)
    }

    /// Advances the clock by `elapsed_ms` and returns the current slide.
    pub fn tick(&mut self, elapsed_ms: u64) -> Option<usize> {
        if self.state != PlayerState::Playing {
            return self.current();
        }

        self.elapsed_ms = self.elapsed_ms.saturating_add(elapsed_ms);
        let steps = self.elapsed_ms / self.delay_ms;
        if steps == 0 {
            return self.current();
        }
        self.elapsed_ms %= self.delay_ms;

        // Playing implies a non-empty deck.
        let len = self.len as u64;
        let index = self.index as u64;
        match self.wrap {
            PresentWrap::Loop => self.index = ((index + steps % len) % len) as usize,
            PresentWrap::Stop => {
                let last = len - 1;
                if steps <= last - index {
                    self.index = (index + steps) as usize;
                } else {
                    self.index = self.len - 1;
                    self.state = PlayerState::Idle;
                    self.elapsed_ms = 0;
                }
            }
        }
        self.current()
    }

    pub fn next(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        if self.index + 1 < self.len {
            self.index += 1;
        } else if self.wrap == PresentWrap::Loop {
            self.index = 0;
        }
        self.elapsed_ms = 0;
        self.current()
    }

    pub fn prev(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        if self.index > 0 {
            self.index -= 1;
        } else if self.wrap == PresentWrap::Loop {
            self.index = self.len - 1;
        }
        self.elapsed_ms = 0;
        self.current()
    }

    pub fn jump(&mut self, index: usize) -> Result<usize, ProjectionError> {
        if index >= self.len {
            return Err(ProjectionError::SlideOutOfRange {
                index,
                len: self.len,
            });
        }
        self.index = index;
        self.elapsed_ms = 0;
        Ok(index)
    }

    /// Stops the timer without moving or resetting the countdown.
    pub fn pause(&mut self) {
        if self.state == PlayerState::Playing {
            self.state = PlayerState::Paused;
        }
    }

    /// Resumes auto-advance. No-op when auto-advance is off.
    pub fn play(&mut self) {
        if self.auto && self.len > 0 {
            self.state = PlayerState::Playing;
        }
    }
}
