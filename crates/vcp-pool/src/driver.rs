use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::error::{PoolError, PoolResult};
use crate::pool::PoolLedger;

/// Periodic trigger that calls [`PoolLedger::settle`] on a fixed interval.
///
/// A failed settlement is logged and the loop keeps going. The first
/// settlement happens one full interval after spawning.
pub struct SettlementDriver;

impl SettlementDriver {
    /// Spawn the driver on the current tokio runtime.
    pub fn spawn(pool: Arc<PoolLedger>, period: Duration) -> DriverHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut settled = 0u64;

            info!(period_ms = period.as_millis() as u64, "settlement driver started");
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => match pool.settle() {
                        Ok(reward) => {
                            settled += 1;
                            info!(
                                height = reward.height,
                                payouts = reward.payout_count(),
                                "scheduled settlement applied"
                            );
                        }
                        Err(e) => warn!(error = %e, kind = %e.kind(), "scheduled settlement failed"),
                    },
                }
            }
            info!(settled, "settlement driver stopped");
            settled
        });

        DriverHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    /// Spawn with the interval from the pool's own configuration.
    pub fn spawn_configured(pool: Arc<PoolLedger>) -> DriverHandle {
        let period = pool.config().settlement_interval();
        Self::spawn(pool, period)
    }
}

/// Handle to a running [`SettlementDriver`].
pub struct DriverHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<u64>,
}

impl DriverHandle {
    /// Stop the driver and return how many settlements succeeded.
    pub async fn shutdown(mut self) -> PoolResult<u64> {
        if let Some(tx) = self.shutdown.take() {
            // The task may already be gone; joining below reports that.
            let _ = tx.send(());
        }
        self.task
            .await
            .map_err(|e| PoolError::Internal(format!("settlement driver: {e}")))
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
