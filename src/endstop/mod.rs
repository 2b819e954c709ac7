//! End stop module for linear-stage.
//!
//! Wraps the home limit switch input: polarity normalization, edge detection with
//! debounce, and a small table of callbacks invoked once per transition into the
//! triggered state. The input lives behind an `Arc` so an interrupt handler or the
//! background [`Poller`] can sample it from another thread.

mod poller;
mod signal;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use embedded_hal::digital::InputPin;
use log::{debug, info, trace};

use crate::config::EndStopConfig;
use crate::error::{EndStopError, Result};
use crate::io::{IoContext, Pull};

pub use poller::Poller;
pub use signal::HomeSignal;

/// Maximum number of callbacks an end stop holds.
pub const MAX_CALLBACKS: usize = 4;

/// Function invoked when the end stop becomes triggered.
///
/// Runs in whichever context detected the edge and must not block.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Electrical level that means "triggered".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    /// High level means triggered.
    #[default]
    ActiveHigh,
    /// Low level means triggered (normally-high wiring).
    ActiveLow,
}

impl Polarity {
    /// Logical state for an electrical level.
    #[inline]
    pub const fn logical(self, high: bool) -> bool {
        match self {
            Polarity::ActiveHigh => high,
            Polarity::ActiveLow => !high,
        }
    }

    /// Bias resistor that holds the line inactive.
    #[inline]
    pub const fn pull(self) -> Pull {
        match self {
            Polarity::ActiveHigh => Pull::Down,
            Polarity::ActiveLow => Pull::Up,
        }
    }
}

struct Input<IN> {
    pin: IN,
    polarity: Polarity,
    debounce: Duration,
    /// Last sampled logical state; `None` until the first sample.
    last: Option<bool>,
    last_edge: Option<Instant>,
}

impl<IN> Input<IN> {
    /// Record a logical state; returns whether it is an edge worth dispatching.
    fn record(&mut self, triggered: bool) -> bool {
        let rising = triggered && self.last == Some(false);
        self.last = Some(triggered);
        rising && self.accept_edge()
    }

    /// Record an externally detected activation.
    fn record_activation(&mut self) -> bool {
        let rising = self.last != Some(true);
        self.last = Some(true);
        rising && self.accept_edge()
    }

    fn accept_edge(&mut self) -> bool {
        let now = Instant::now();
        if let Some(prev) = self.last_edge {
            if now.duration_since(prev) < self.debounce {
                debug!("Ignoring end stop bounce");
                return false;
            }
        }
        self.last_edge = Some(now);
        true
    }
}

struct Shared<IN> {
    input: Mutex<Input<IN>>,
    callbacks: Mutex<heapless::Vec<Callback, MAX_CALLBACKS>>,
}

impl<IN: InputPin> Shared<IN> {
    fn input(&self) -> MutexGuard<'_, Input<IN>> {
        self.input.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn callbacks(&self) -> MutexGuard<'_, heapless::Vec<Callback, MAX_CALLBACKS>> {
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sample(&self) -> Result<bool> {
        let (triggered, edge) = {
            let mut input = self.input();
            let high = input.pin.is_high().map_err(|_| EndStopError::PinError)?;
            let triggered = input.polarity.logical(high);
            trace!("End stop triggered: {}", triggered);
            (triggered, input.record(triggered))
        };

        if edge {
            self.dispatch();
        }
        Ok(triggered)
    }

    fn notify(&self) {
        let edge = self.input().record_activation();
        if edge {
            self.dispatch();
        }
    }

    // Callbacks run without any lock held so they may read the end stop.
    fn dispatch(&self) {
        let callbacks = self.callbacks().clone();
        debug!("End stop triggered, invoking {} callbacks", callbacks.len());
        for callback in &callbacks {
            callback();
        }
    }
}

fn same_callback(a: &Callback, b: &Callback) -> bool {
    core::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// The home limit switch.
pub struct EndStop<IN: InputPin> {
    shared: Arc<Shared<IN>>,
}

impl<IN: InputPin> EndStop<IN> {
    /// Wrap an input pin. Debounce is off.
    pub fn new(pin: IN, polarity: Polarity) -> Self {
        info!("Initialised end stop, {:?}", polarity);
        Self {
            shared: Arc::new(Shared {
                input: Mutex::new(Input {
                    pin,
                    polarity,
                    debounce: Duration::ZERO,
                    last: None,
                    last_edge: None,
                }),
                callbacks: Mutex::new(heapless::Vec::new()),
            }),
        }
    }

    /// Ignore edges that follow an accepted edge within `debounce`.
    pub fn with_debounce(self, debounce: Duration) -> Self {
        self.shared.input().debounce = debounce;
        self
    }

    /// Build an end stop from configuration, claiming its input channel from `io`.
    ///
    /// # Errors
    ///
    /// Returns whatever `io` reports when the channel cannot be claimed.
    pub fn from_config<IO>(config: &EndStopConfig, io: &mut IO) -> Result<Self>
    where
        IO: IoContext<Input = IN>,
    {
        let polarity = config.polarity();
        let pin = io.input(config.pin, polarity.pull())?;
        Ok(Self::new(pin, polarity)
            .with_debounce(Duration::from_millis(u64::from(config.debounce_ms))))
    }

    /// Configured polarity.
    pub fn polarity(&self) -> Polarity {
        self.shared.input().polarity
    }

    /// Configured debounce window.
    pub fn debounce(&self) -> Duration {
        self.shared.input().debounce
    }

    /// Sample the switch. `true` means the carriage is at the home boundary.
    ///
    /// A sample that shows a fresh transition into the triggered state invokes the
    /// registered callbacks before returning.
    ///
    /// # Errors
    ///
    /// Returns [`EndStopError::PinError`] if the pin cannot be read.
    pub fn triggered(&self) -> Result<bool> {
        self.shared.sample()
    }

    /// Report an activation detected elsewhere, e.g. by an edge interrupt.
    pub fn notify(&self) {
        self.shared.notify();
    }

    /// Register a callback to be called when the end stop is triggered.
    ///
    /// # Errors
    ///
    /// Returns [`EndStopError::CallbackTableFull`] once [`MAX_CALLBACKS`] are registered.
    pub fn register_callback(&self, callback: Callback) -> Result<()> {
        self.shared
            .callbacks()
            .push(callback)
            .map_err(|_| EndStopError::CallbackTableFull)?;
        Ok(())
    }

    /// Deregister a previously registered callback.
    ///
    /// # Errors
    ///
    /// Returns [`EndStopError::NotRegistered`] if `callback` is not in the table.
    pub fn deregister_callback(&self, callback: &Callback) -> Result<()> {
        let mut callbacks = self.shared.callbacks();
        let index = callbacks
            .iter()
            .position(|cb| same_callback(cb, callback))
            .ok_or(EndStopError::NotRegistered)?;
        callbacks.remove(index);
        Ok(())
    }

    /// Number of registered callbacks.
    pub fn callback_count(&self) -> usize {
        self.shared.callbacks().len()
    }

    /// Handle for sampling or notifying from another execution context.
    pub fn handle(&self) -> EndStopHandle<IN> {
        EndStopHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Sample the input every `interval` on a background thread.
    pub fn spawn_poller(&self, interval: Duration) -> Poller
    where
        IN: Send + 'static,
    {
        Poller::spawn(self.handle(), interval)
    }

    /// Give the pin back, or `None` while handles or a poller still share it.
    pub fn release(self) -> Option<IN> {
        Arc::try_unwrap(self.shared).ok().map(|shared| {
            shared
                .input
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner)
                .pin
        })
    }
}

/// Cross-context handle to an [`EndStop`].
pub struct EndStopHandle<IN: InputPin> {
    shared: Arc<Shared<IN>>,
}

impl<IN: InputPin> Clone for EndStopHandle<IN> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<IN: InputPin> EndStopHandle<IN> {
    /// Sample the switch; see [`EndStop::triggered`].
    ///
    /// # Errors
    ///
    /// Returns [`EndStopError::PinError`] if the pin cannot be read.
    pub fn triggered(&self) -> Result<bool> {
        self.shared.sample()
    }

    /// Report an activation detected elsewhere; see [`EndStop::notify`].
    pub fn notify(&self) {
        self.shared.notify();
    }
}
