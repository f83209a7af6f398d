//! Debounced parameter save task
//!
//! Batches bursts of parameter changes into a single flash write to reduce
//! wear. Timing decisions are made by [`SaveDebouncer`]; this module only
//! wires it to an Embassy channel and timer.
//!
//! This module requires the Embassy runtime (`embassy` feature).

#![cfg(feature = "embassy")]

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embassy_time::{Instant, Timer};
use mpc_params_core::parameters::{ParameterRegistry, SaveDebouncer};
use mpc_params_core::traits::TimeSource;

use super::storage::ParamStorage;
use crate::platform::traits::flash::FlashInterface;

/// Save request message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveRequest {
    /// Schedule a save (will be debounced)
    Schedule,
    /// Force immediate save (bypass debounce)
    Immediate,
}

/// Embassy monotonic clock
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl TimeSource for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}

/// Channel carrying save requests to the saver task
pub type SaveChannel = Channel<CriticalSectionRawMutex, SaveRequest, 4>;

/// Storage shared between the saver task and on-demand callers
pub type SharedStorage<F> = Mutex<CriticalSectionRawMutex, ParamStorage<F>>;

/// Parameter save manager
///
/// Update channels call [`schedule_save`](Self::schedule_save) after a
/// successful `set`; the task writes once the burst has settled.
pub struct ParamSaver {
    channel: &'static SaveChannel,
}

impl ParamSaver {
    /// Create a saver bound to a static channel
    pub const fn new(channel: &'static SaveChannel) -> Self {
        Self { channel }
    }

    /// Schedule a save (debounced)
    pub async fn schedule_save(&self) {
        self.channel.send(SaveRequest::Schedule).await;
    }

    /// Request immediate save (bypass debounce)
    pub async fn save_immediately(&self) {
        self.channel.send(SaveRequest::Immediate).await;
    }

    /// Schedule a save from a non-async context
    ///
    /// Returns false if the channel is full; a pending request already
    /// covers the change in that case.
    pub fn try_schedule_save(&self) -> bool {
        self.channel.try_send(SaveRequest::Schedule).is_ok()
    }

    /// Run the save task (call from async executor)
    pub async fn run_task<F: FlashInterface>(
        &self,
        registry: &'static ParameterRegistry,
        storage: &'static SharedStorage<F>,
        mut debouncer: SaveDebouncer,
    ) -> ! {
        let clock = EmbassyClock;
        loop {
            let request = match debouncer.deadline() {
                None => Some(self.channel.receive().await),
                Some(deadline) => {
                    match select(
                        Timer::at(Instant::from_millis(deadline)),
                        self.channel.receive(),
                    )
                    .await
                    {
                        Either::First(()) => None,
                        Either::Second(request) => Some(request),
                    }
                }
            };

            let now = clock.now_ms();
            match request {
                Some(SaveRequest::Schedule) => debouncer.request(now),
                Some(SaveRequest::Immediate) => debouncer.request_immediate(now),
                None => {}
            }

            if debouncer.poll(now) {
                let mut storage = storage.lock().await;
                // Failures are logged by the storage; the registry still
                // reports needs_save, so the next request retries.
                let _ = storage.save_if_needed(registry);
            }
        }
    }
}
