//! Fixed-step tick scheduling
//!
//! Turns elapsed time into a number of fixed engine ticks, independent of how often
//! the host renders. Each completed tick raises a single pending "frame ready"
//! signal and notifies the one after-update subscriber.
use log::{info, warn};
use std::time::{Duration, Instant};

/// Passed to the after-update subscriber once per completed tick
#[derive(Debug)]
pub struct TickContext {
    tick: u64,
    stop_requested: bool,
    dispose_requested: bool,
}

impl TickContext {
    /// Total ticks completed, this one included
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Stop continuous ticking once this notification returns
    pub fn stop(&mut self) {
        self.stop_requested = true;
    }

    /// Dispose the world once this notification returns; implies `stop`
    pub fn dispose(&mut self) {
        self.stop_requested = true;
        self.dispose_requested = true;
    }
}

/// The single after-update subscriber slot
pub type AfterUpdate = Box<dyn FnMut(&mut TickContext)>;

/// Simulation loop timing state
pub struct SimulationLoop {
    /// Fixed tick length
    timestep: Duration,

    /// Cap on ticks per frame to prevent a spiral of death
    max_ticks_per_frame: u32,

    /// Accumulated time not yet consumed by ticks
    accumulator: Duration,

    /// Time of last wall-clock frame, `None` right after starting
    last_frame_time: Option<Instant>,

    /// Whether continuous ticking is active
    running: bool,

    /// Total ticks completed
    tick_count: u64,

    /// At most one pending redraw request
    frame_ready: bool,

    /// Subscriber notified after each tick
    after_update: Option<AfterUpdate>,
}

impl SimulationLoop {
    /// Create a stopped loop
    pub fn new(timestep: Duration, max_ticks_per_frame: u32) -> Self {
        Self {
            timestep,
            max_ticks_per_frame,
            accumulator: Duration::ZERO,
            last_frame_time: None,
            running: false,
            tick_count: 0,
            frame_ready: false,
            after_update: None,
        }
    }

    /// Start continuous ticking
    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            // Reset timing to prevent an update burst
            self.accumulator = Duration::ZERO;
            self.last_frame_time = None;
            info!("Simulation running");
        }
    }

    /// Stop continuous ticking; a no-op when already stopped
    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            info!("Simulation stopped after {} ticks", self.tick_count);
        }
    }

    /// Check if continuous ticking is active
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Measure wall-clock time since the previous frame and return the ticks due
    pub fn begin_frame(&mut self) -> u32 {
        let now = Instant::now();
        let elapsed = self
            .last_frame_time
            .map(|last| now.duration_since(last))
            .unwrap_or(Duration::ZERO);
        self.last_frame_time = Some(now);
        self.accumulate(elapsed)
    }

    /// Add host-measured elapsed time and return the ticks due
    pub fn accumulate(&mut self, elapsed: Duration) -> u32 {
        // Stopped loops don't bank time
        if !self.running {
            return 0;
        }

        self.accumulator += elapsed;

        let mut ticks = 0;
        while self.accumulator >= self.timestep && ticks < self.max_ticks_per_frame {
            self.accumulator -= self.timestep;
            ticks += 1;
        }

        if self.accumulator >= self.timestep {
            warn!(
                "Simulation fell behind, dropping {:?} of backlog",
                self.accumulator
            );
            self.accumulator = Duration::ZERO;
        }

        ticks
    }

    /// Record one completed tick: raise the frame-ready signal and notify the subscriber.
    ///
    /// Returns `true` when the subscriber asked for the world to be disposed.
    pub fn complete_tick(&mut self) -> bool {
        self.tick_count += 1;
        self.frame_ready = true;

        let Some(callback) = self.after_update.as_mut() else {
            return false;
        };
        let mut ctx = TickContext {
            tick: self.tick_count,
            stop_requested: false,
            dispose_requested: false,
        };
        callback(&mut ctx);
        if ctx.stop_requested {
            self.stop();
        }
        ctx.dispose_requested
    }

    /// Consume the pending frame-ready signal
    pub fn take_frame_ready(&mut self) -> bool {
        std::mem::take(&mut self.frame_ready)
    }

    /// Install the after-update subscriber, returning the previous one
    pub fn set_after_update(&mut self, callback: AfterUpdate) -> Option<AfterUpdate> {
        self.after_update.replace(callback)
    }

    /// Remove the after-update subscriber
    pub fn clear_after_update(&mut self) -> Option<AfterUpdate> {
        self.after_update.take()
    }

    /// Get the fixed timestep
    pub fn timestep(&self) -> Duration {
        self.timestep
    }

    /// Get total number of ticks completed
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
