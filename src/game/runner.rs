//! Drives a controller from an audio source on two cadences: the
//! simulation tick and the slower pitch sampler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info, warn};

use super::session::{GameSessionController, SessionResult};
use super::SessionState;
use crate::audio::{AudioSource, SilentSource, SpectrumFrame};
use crate::error::{CaptureError, Result};

/// How often a runner retries a capture device that failed to open
pub const CAPTURE_RETRY_PERIOD: Duration = Duration::from_millis(500);

/// Shared handle to a controller driven by a runner thread
pub type SharedController<R = StdRng> = Arc<Mutex<GameSessionController<R>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Real-time session driver owning one background thread
pub struct SessionRunner<R: Rng + Send + 'static = StdRng> {
    controller: SharedController<R>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl<R: Rng + Send + 'static> SessionRunner<R> {
    /// Start the session (if not already running) and begin ticking.
    ///
    /// `source_factory` runs on the runner thread: sources such as cpal
    /// streams cannot cross threads, so they are built where they are used.
    /// If it fails the session runs on silence and the factory is retried
    /// every [`CAPTURE_RETRY_PERIOD`] until capture comes up.
    pub fn spawn<F>(mut controller: GameSessionController<R>, source_factory: F) -> Result<Self>
    where
        F: FnMut() -> std::result::Result<Box<dyn AudioSource>, CaptureError> + Send + 'static,
    {
        if controller.state() != SessionState::Running {
            controller.start()?;
        }

        let tick_period = Duration::from_secs_f64(1.0 / controller.config().timing.tick_rate_hz as f64);
        let sample_period = Duration::from_millis(controller.config().timing.sampler_interval_ms);

        let controller = Arc::new(Mutex::new(controller));
        let stop = Arc::new(AtomicBool::new(false));

        let thread_controller = Arc::clone(&controller);
        let thread_stop = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("session-runner".into())
            .spawn(move || {
                run_loop(
                    &thread_controller,
                    &thread_stop,
                    source_factory,
                    tick_period,
                    sample_period,
                )
            })?;

        Ok(Self {
            controller,
            stop,
            handle: Some(handle),
        })
    }

    pub fn controller(&self) -> SharedController<R> {
        Arc::clone(&self.controller)
    }

    /// Run `f` against the controller under its lock
    pub fn with_controller<T>(&self, f: impl FnOnce(&mut GameSessionController<R>) -> T) -> T {
        f(&mut lock(&self.controller))
    }

    /// True once the runner thread has exited
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Stop ticking, release the audio source and end the session.
    pub fn stop(mut self) -> Option<SessionResult> {
        self.shutdown();
        let result = lock(&self.controller).result().cloned();
        result
    }

    /// Wait for the session to end on its own
    pub fn join(mut self) -> Option<SessionResult> {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Session thread panicked");
            }
        }
        let result = lock(&self.controller).result().cloned();
        result
    }

    /// End the session before stopping the thread, so no observer sees a
    /// live session that nothing ticks.
    fn shutdown(&mut self) {
        {
            let mut controller = lock(&self.controller);
            if controller.state().is_live() {
                let _ = controller.end();
            }
        }
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Session thread panicked");
            }
        }
    }
}

impl<R: Rng + Send + 'static> Drop for SessionRunner<R> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_loop<R: Rng, F>(
    controller: &Mutex<GameSessionController<R>>,
    stop: &AtomicBool,
    mut source_factory: F,
    tick_period: Duration,
    sample_period: Duration,
) where
    F: FnMut() -> std::result::Result<Box<dyn AudioSource>, CaptureError>,
{
    let mut capturing = true;
    let mut source: Box<dyn AudioSource> = match source_factory() {
        Ok(source) => source,
        Err(e) => {
            lock(controller).report_capture_unavailable(e.to_string());
            capturing = false;
            Box::new(SilentSource)
        }
    };
    let mut next_retry = Instant::now() + CAPTURE_RETRY_PERIOD;

    info!(
        tick_ms = tick_period.as_secs_f64() * 1000.0,
        sample_ms = sample_period.as_millis() as u64,
        "Session runner started"
    );

    let mut pending: Option<SpectrumFrame> = None;
    let mut next_tick = Instant::now();
    let mut next_sample = next_tick;

    while !stop.load(Ordering::Acquire) {
        let now = Instant::now();

        if !capturing && now >= next_retry {
            match source_factory() {
                Ok(opened) => {
                    source = opened;
                    capturing = true;
                    lock(controller).report_capture_restored();
                }
                Err(e) => debug!(error = %e, "Capture still unavailable"),
            }
            next_retry = now + CAPTURE_RETRY_PERIOD;
        }

        if now >= next_sample {
            if let Some(frame) = source.latest_frequency_buffer() {
                pending = Some(frame);
            }
            next_sample += sample_period;
        }

        if now >= next_tick {
            let mut c = lock(controller);
            if !c.state().is_live() {
                break;
            }
            if source.is_exhausted() && pending.is_none() {
                debug!("Audio source exhausted");
                let _ = c.end();
                break;
            }
            c.tick(pending.take().as_ref());
            next_tick += tick_period;

            // Don't burst to catch up after a long stall
            if now.saturating_duration_since(next_tick) > tick_period * 10 {
                next_tick = now + tick_period;
            }
        }

        let mut wake = next_tick.min(next_sample);
        if !capturing {
            wake = wake.min(next_retry);
        }
        if let Some(wait) = wake.checked_duration_since(Instant::now()) {
            thread::sleep(wait);
        }
    }

    drop(source);
    debug!("Session runner stopped, audio source released");
}

/// Drive a started controller from a source as fast as possible: one pull
/// per sampler period, then that period's worth of ticks. Stops when the
/// source is exhausted, the session ends or `max_ticks` is reached, and ends
/// the session if it is still live.
pub fn drive_offline<R, S>(
    controller: &mut GameSessionController<R>,
    source: &mut S,
    max_ticks: Option<u64>,
) -> Option<SessionResult>
where
    R: Rng,
    S: AudioSource + ?Sized,
{
    let ticks_per_sample = controller.config().timing.ticks_per_sample().max(1);

    'outer: while controller.state() == SessionState::Running {
        if source.is_exhausted() {
            debug!(tick = controller.current_tick(), "Offline source exhausted");
            break;
        }

        let frame = source.latest_frequency_buffer();
        for i in 0..ticks_per_sample {
            if max_ticks.map_or(false, |max| controller.current_tick() >= max) {
                debug!(tick = controller.current_tick(), "Tick limit reached");
                break 'outer;
            }
            let fresh = if i == 0 { frame.as_ref() } else { None };
            controller.tick(fresh);
            if controller.state() != SessionState::Running {
                break 'outer;
            }
        }
    }

    if controller.state().is_live() {
        let _ = controller.end();
    }
    controller.result().cloned()
}
