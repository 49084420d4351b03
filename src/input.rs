// SPDX-License-Identifier: GPL-3.0-only

//! Debounced button edges
//!
//! [`ButtonPad`] samples the raw input source once per tick and turns level
//! changes into edges: a button fires when its level rises from released to
//! pressed, and a second rise within the debounce interval is ignored.
//! A held button does not re-fire without a release in between.

use crate::devices::{Button, ButtonLevels, InputSource};
use std::time::{Duration, Instant};

pub struct ButtonPad {
    source: Box<dyn InputSource>,
    debounce: Duration,
    prev_levels: ButtonLevels,
    last_edge: [Option<Instant>; Button::ALL.len()],
    edges: ButtonLevels,
}

impl ButtonPad {
    pub fn new(source: Box<dyn InputSource>, debounce: Duration) -> Self {
        Self {
            source,
            debounce,
            prev_levels: ButtonLevels::default(),
            last_edge: [None; Button::ALL.len()],
            edges: ButtonLevels::default(),
        }
    }

    /// Sample every button once and compute this tick's edges
    ///
    /// Called exactly once per tick, before any [`Self::poll_edge`].
    pub fn refresh(&mut self, now: Instant) {
        let levels = self.source.sample();
        let mut edges = ButtonLevels::default();
        for button in Button::ALL {
            let rising = levels.is_pressed(button) && !self.prev_levels.is_pressed(button);
            if !rising {
                continue;
            }
            let accepted = match self.last_edge[button as usize] {
                Some(last) => now.saturating_duration_since(last) > self.debounce,
                None => true,
            };
            if accepted {
                edges.set(button, true);
                self.last_edge[button as usize] = Some(now);
            }
        }
        self.prev_levels = levels;
        self.edges = edges;
    }

    /// Consume the edge computed for `button` this tick
    pub fn poll_edge(&mut self, button: Button) -> bool {
        let fired = self.edges.is_pressed(button);
        self.edges.set(button, false);
        fired
    }
}
