use crate::probe::dispatcher::ProbeEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

/// Fires one probe round immediately and then on a fixed interval, forever
pub struct RoundScheduler {
    engine: Arc<ProbeEngine>,
    interval: Duration,
}

impl RoundScheduler {
    pub fn new(engine: Arc<ProbeEngine>) -> Self {
        let interval = engine.config().round_interval();
        Self { engine, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn run(self) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut round = 0u64;

        loop {
            ticker.tick().await;
            round += 1;

            info!(round, "Starting probe round");
            let report = self.engine.run_round().await;
            info!(
                round,
                sent = report.sent(),
                skipped = report.skipped(),
                send_failures = report.send_failures(),
                "Probe round dispatched"
            );
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
