//! tests/common/harness.rs
use lbt_access::{
    access::{AccessCommand, AccessEvent, BusySource, ChannelAccessManager},
    config::Config,
    timer::{TimerQueue, Timestamp},
};
use std::sync::Once;
use std::time::Duration;
use tracing_subscriber::fmt::format::FmtSpan;

/// Initializes tracing for tests, ensuring it's only done once.
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        let filter =
            std::env::var("RUST_LOG").unwrap_or_else(|_| "lbt_access=debug".to_string());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .with_test_writer()
            .init();
    });
}

/// A test harness that drives a manager over a deterministic timer queue with
/// scripted events.
pub struct ManagerHarness {
    pub manager: ChannelAccessManager<TimerQueue, Vec<AccessCommand>>,
    /// Every busy period the manager was told about, as `(start, end)`.
    pub busy_periods: Vec<(Timestamp, Timestamp)>,
}

impl ManagerHarness {
    pub fn new(config: Config, seed: u64) -> Self {
        init_tracing();
        let manager = ChannelAccessManager::from_seed(config, TimerQueue::new(), Vec::new(), seed)
            .expect("harness config must be valid");
        Self {
            manager,
            busy_periods: Vec::new(),
        }
    }

    /// Fires timers up to `at`, then delivers `event`.
    pub fn at(&mut self, at: Timestamp, event: AccessEvent) -> &mut Self {
        if let AccessEvent::ChannelBusy { duration, .. } = &event {
            self.busy_periods.push((at, at.saturating_add(*duration)));
        }
        self.manager.handle_event_at(at, event);
        self
    }

    pub fn busy_at(&mut self, at: Timestamp, duration: Duration) -> &mut Self {
        self.at(
            at,
            AccessEvent::ChannelBusy {
                source: BusySource::EnergyDetect,
                duration,
            },
        )
    }

    pub fn request_at(&mut self, at: Timestamp) -> &mut Self {
        self.at(at, AccessEvent::RequestAccess)
    }

    pub fn run_until(&mut self, until: Timestamp) -> &mut Self {
        self.manager.run_until(until);
        self
    }

    pub fn grants(&self) -> Vec<Timestamp> {
        self.manager
            .sink()
            .iter()
            .filter_map(|command| match command {
                AccessCommand::Grant { start, .. } => Some(*start),
                _ => None,
            })
            .collect()
    }

    pub fn reservations(&self) -> usize {
        self.manager
            .sink()
            .iter()
            .filter(|command| matches!(command, AccessCommand::SendReservationSignal { .. }))
            .count()
    }
}
