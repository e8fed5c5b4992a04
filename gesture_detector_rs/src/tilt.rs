use log::debug;

use crate::config::TiltConfig;
use crate::listener::TiltListener;
use crate::timer::TickTimer;
use crate::types::{AccelSample, Direction, TouchRate};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TiltState {
    /// No direction recognized.
    Unestablished,
    /// Direction recognized, waiting for the first tick to confirm it.
    Establishing,
    /// Confirmed; ticks emit repeat counters.
    Established,
    /// Direction lost; the next tick emits the release.
    Clearing,
}

/// Turns a held tilt into a direction plus an auto-repeat counter.
///
/// Time is the sample clock in nanoseconds. Ticks are driven either by the
/// samples themselves (each sample first fires every tick that fell due before
/// it) or by the host calling [`TiltEngine::advance_to`] when no samples arrive.
pub struct TiltEngine {
    config: TiltConfig,
    listener: Option<Box<dyn TiltListener>>,

    state: TiltState,
    direction: Direction,
    counter: i32,
    start_time: i64,
    next_fire_delay: i64,
    timer: TickTimer,
}

impl TiltEngine {
    /// A detached engine; nothing happens until [`TiltEngine::attach`].
    pub fn new(config: &TiltConfig) -> Self {
        TiltEngine {
            config: config.clone(),
            listener: None,
            state: TiltState::Unestablished,
            direction: Direction::Up,
            counter: 0,
            start_time: 0,
            next_fire_delay: 0,
            timer: TickTimer::new(),
        }
    }

    pub fn with_listener(config: &TiltConfig, listener: Box<dyn TiltListener>) -> Self {
        let mut engine = Self::new(config);
        engine.attach(listener);
        engine
    }

    /// Start reporting to `listener` from a clean state.
    pub fn attach(&mut self, listener: Box<dyn TiltListener>) {
        self.reset();
        self.listener = Some(listener);
        debug!("tilt engine attached");
    }

    /// Stop reporting. Any pending tick is dropped without a release.
    pub fn detach(&mut self) {
        self.reset();
        self.listener = None;
        debug!("tilt engine detached");
    }

    pub fn is_attached(&self) -> bool {
        self.listener.is_some()
    }

    pub fn state(&self) -> TiltState {
        self.state
    }

    pub fn direction(&self) -> Option<Direction> {
        match self.state {
            TiltState::Unestablished => None,
            _ => Some(self.direction),
        }
    }

    pub fn counter(&self) -> i32 {
        self.counter
    }

    pub fn next_deadline(&self) -> Option<i64> {
        self.timer.deadline()
    }

    pub fn on_accel_sample(&mut self, sample: &AccelSample) {
        if self.listener.is_none() {
            return;
        }
        self.advance_to(sample.timestamp);

        let (p, q) = tilt_angles(sample);
        match self.state {
            TiltState::Unestablished => self.try_establish(p, q, sample.timestamp),
            TiltState::Establishing | TiltState::Established => self.check_clearing(p, q),
            TiltState::Clearing => {}
        }
    }

    /// Fire every tick due at or before `now`, each at its own deadline.
    pub fn advance_to(&mut self, now: i64) {
        while let Some(deadline) = self.timer.take_due(now) {
            self.on_tick(deadline);
            if matches!(self.timer.deadline(), Some(next) if next <= deadline) {
                // A non-positive interval would never catch up.
                self.timer.cancel();
                break;
            }
        }
    }

    /// Periodic tick. Cancels whatever was pending before acting.
    pub fn on_tick(&mut self, now: i64) {
        self.timer.cancel();

        let promoted = match self.state {
            TiltState::Unestablished => {
                debug!("stale tilt tick at {} ignored", now);
                return;
            }
            TiltState::Establishing => {
                debug!("tilt {:?} established", self.direction);
                self.state = TiltState::Established;
                true
            }
            TiltState::Established => false,
            TiltState::Clearing => {
                debug!("tilt {:?} released", self.direction);
                self.state = TiltState::Unestablished;
                self.emit(TouchRate::Release);
                return;
            }
        };

        let interval = self.config.interval_ns();
        self.timer.arm(now, interval);

        if !promoted && now - self.start_time >= self.next_fire_delay {
            self.emit(TouchRate::Repeat(self.counter));
            self.start_time = now;
            self.next_fire_delay = interval;
            self.counter += 1;
        }
    }

    fn reset(&mut self) {
        self.timer.cancel();
        self.state = TiltState::Unestablished;
        self.counter = 0;
        self.start_time = 0;
        self.next_fire_delay = 0;
    }

    fn try_establish(&mut self, p: i32, q: i32, now: i64) {
        let angle = self.config.default_angle_deg;
        let tolerance = self.config.tolerance_deg;
        if !axes_separated(p, q, angle) {
            return;
        }

        let direction = if p >= 0 && (p - angle).abs() < tolerance {
            Direction::Up
        } else if p < 0 && (-p - angle).abs() < tolerance {
            Direction::Down
        } else if q <= 0 && (-q - angle).abs() < tolerance {
            Direction::Left
        } else if q > 0 && (q - angle).abs() < tolerance {
            Direction::Right
        } else {
            return;
        };

        debug!("tilt {:?} recognized (p={}, q={})", direction, p, q);
        let half_interval = self.config.interval_ns() / 2;
        self.direction = direction;
        self.state = TiltState::Establishing;
        self.counter = 0;
        self.start_time = now;
        self.next_fire_delay = half_interval;
        self.timer.arm(now, half_interval);
    }

    fn check_clearing(&mut self, p: i32, q: i32) {
        let angle = self.config.default_angle_deg;
        // 1.5x the recognition tolerance
        let limit = self.config.tolerance_deg * 3 / 2;

        let lost = !axes_separated(p, q, angle)
            || match self.direction {
                Direction::Up => p < 0 || (p - angle).abs() > limit,
                Direction::Down => p >= 0 || (-p - angle).abs() > limit,
                Direction::Left => q > 0 || (-q - angle).abs() > limit,
                Direction::Right => q <= 0 || (q - angle).abs() > limit,
            };
        if !lost {
            return;
        }

        if self.state == TiltState::Establishing {
            debug!("tilt {:?} dropped before confirmation", self.direction);
            self.timer.cancel();
            self.state = TiltState::Unestablished;
        } else {
            debug!("tilt {:?} clearing (p={}, q={})", self.direction, p, q);
            self.state = TiltState::Clearing;
        }
    }

    fn emit(&mut self, value: TouchRate) {
        if let Some(listener) = self.listener.as_mut() {
            listener.on_touch_rate(self.direction, value);
        }
    }
}

/// Pitch-like and roll-like angles in whole degrees, rounded half-up.
pub fn tilt_angles(sample: &AccelSample) -> (i32, i32) {
    let x = sample.x as f64;
    let y = sample.y as f64;
    let z = sample.z as f64;
    let p = (x.atan2(z).to_degrees() + 0.5).floor() as i32;
    let q = (y.atan2(z).to_degrees() + 0.5).floor() as i32;
    (p, q)
}

fn axes_separated(p: i32, q: i32, angle: i32) -> bool {
    ((p.abs() - q.abs()).abs() as f64) > angle as f64 / 2.0
}
