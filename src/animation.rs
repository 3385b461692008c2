//! Progressive reveal of an emission set.
//!
//! Frames never copy points: each one is a prefix length into the immutable,
//! already shuffled point array.

use std::thread;
use std::time::Duration;

use serde::Serialize;
use tracing::trace;

use crate::error::SimResult;
use crate::geometry::Point;

/// Pause between frames when nothing else is configured.
pub const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(20);

/// One step of the reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Frame {
    /// 1-based step number.
    pub index: usize,
    /// Length of the visible prefix.
    pub visible: usize,
    /// The last frame, showing every point.
    pub terminal: bool,
}

/// `ceil(step * total / steps)` without going through floats.
pub fn reveal_count(step: usize, total: usize, steps: usize) -> usize {
    if steps == 0 {
        return total;
    }
    let step = step.min(steps) as u128;
    let k = (step * total as u128).div_ceil(steps as u128);
    k as usize
}

/// Iterator over the frames of one playback.
#[derive(Debug, Clone)]
pub struct RevealPlan {
    total: usize,
    steps: usize,
    next: usize,
}

impl RevealPlan {
    /// `steps <= 1` collapses to a single terminal frame.
    pub fn new(total: usize, steps: usize) -> Self {
        RevealPlan {
            total,
            steps: steps.max(1),
            next: 1,
        }
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Visible counts of every frame, in order.
    pub fn counts(&self) -> Vec<usize> {
        self.clone().map(|f| f.visible).collect()
    }
}

impl Iterator for RevealPlan {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if self.next > self.steps {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(Frame {
            index,
            visible: reveal_count(index, self.total, self.steps),
            terminal: index == self.steps,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.steps + 1).saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for RevealPlan {}

/// Receives each frame with its visible prefix of the point set.
pub trait FrameSink {
    fn draw(&mut self, frame: Frame, visible: &[Point]) -> SimResult<()>;
}

impl<F> FrameSink for F
where
    F: FnMut(Frame, &[Point]) -> SimResult<()>,
{
    fn draw(&mut self, frame: Frame, visible: &[Point]) -> SimResult<()> {
        self(frame, visible)
    }
}

/// Paced, single-threaded playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sequencer {
    pub steps: usize,
    pub delay: Duration,
}

impl Default for Sequencer {
    fn default() -> Self {
        Sequencer {
            steps: 30,
            delay: DEFAULT_FRAME_DELAY,
        }
    }
}

impl Sequencer {
    pub fn new(steps: usize, delay: Duration) -> Self {
        Sequencer { steps, delay }
    }

    /// A sequencer that draws the full set once.
    pub fn still() -> Self {
        Sequencer {
            steps: 1,
            delay: Duration::ZERO,
        }
    }

    pub fn plan(&self, total: usize) -> RevealPlan {
        RevealPlan::new(total, self.steps)
    }

    /// Draw every frame into `sink`, sleeping between frames.
    /// Stops at the first sink error. Returns the number of frames drawn.
    pub fn play<S: FrameSink + ?Sized>(&self, points: &[Point], sink: &mut S) -> SimResult<usize> {
        let mut drawn = 0;
        for frame in self.plan(points.len()) {
            trace!(index = frame.index, visible = frame.visible, "frame");
            sink.draw(frame, &points[..frame.visible])?;
            drawn += 1;
            if !frame.terminal && !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
        }
        Ok(drawn)
    }
}
