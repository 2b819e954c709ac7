//! Background sampling thread for end stops without interrupt support.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use embedded_hal::digital::InputPin;
use log::{debug, warn};

use super::EndStopHandle;

/// Running poller. Stops and joins its thread on [`Poller::stop`] or drop.
#[derive(Debug)]
pub struct Poller {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Poller {
    pub(super) fn spawn<IN>(handle: EndStopHandle<IN>, interval: Duration) -> Self
    where
        IN: InputPin + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        let thread = thread::spawn(move || {
            debug!("End stop poller started, interval {} us", interval.as_micros());
            while !flag.load(Ordering::Acquire) {
                if handle.triggered().is_err() {
                    warn!("End stop poller failed to read input, stopping");
                    break;
                }
                thread::sleep(interval);
            }
            debug!("End stop poller stopped");
        });

        Self {
            stop,
            thread: Some(thread),
        }
    }

    /// Whether the sampling thread is still running.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop sampling and wait for the thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.shutdown();
    }
}
