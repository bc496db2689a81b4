//! Polling engine: fires due executions and applies their outcomes.

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use buildgate_core::config::TriggerMethod;

use crate::error::Result;
use crate::machine;
use crate::store::ScheduleStore;
use crate::trigger::TriggerClient;

/// Drives pending executions: polls the store every second, performs the
/// trigger call for each due key, and persists the outcome.
///
/// At-least-once semantics fall out of the polling model: a crash between
/// firing and persisting leaves the row due, so it fires again on the next
/// tick. Duplicate and late fires are made harmless by the guarded outcome
/// write in [`ScheduleStore::put_if_scheduled_at`].
pub struct SchedulerEngine {
    store: ScheduleStore,
    trigger: Box<dyn TriggerClient>,
    method: TriggerMethod,
    /// Statically configured fallback target, for deployments where the
    /// caller does not supply a URL per request.
    static_target: Option<String>,
}

impl SchedulerEngine {
    pub fn new(
        store: ScheduleStore,
        trigger: Box<dyn TriggerClient>,
        method: TriggerMethod,
        static_target: Option<String>,
    ) -> Self {
        Self {
            store,
            trigger,
            method,
            static_target,
        }
    }

    /// Main event loop. Polls every second until `shutdown` broadcasts `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("scheduler engine started");

        let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick().await {
                        error!("scheduler tick error: {e}");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("scheduler engine shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Fire every schedule whose due time has arrived. A failure on one key
    /// never blocks the others.
    async fn tick(&self) -> Result<()> {
        let now = Utc::now();
        for key in self.store.due_keys(now)? {
            if let Err(e) = self.fire(&key).await {
                error!(%key, "failed to fire due schedule: {e}");
            }
        }
        Ok(())
    }

    /// Execute the pending trigger for `key`, if one is still pending.
    async fn fire(&self, key: &str) -> Result<()> {
        let Some(mut record) = self.store.get(key)? else {
            return Ok(());
        };
        // The slot is only live while scheduled_for is set and due; anything
        // else is a stale or superseded fire.
        let Some(due_at) = record.scheduled_for else {
            debug!(%key, "fire with no pending execution — ignoring");
            return Ok(());
        };
        let now = Utc::now();
        if due_at > now {
            return Ok(());
        }

        let target = record
            .target_url
            .clone()
            .or_else(|| self.static_target.clone());
        let Some(url) = target else {
            warn!(%key, "no trigger target configured — giving up on this execution");
            machine::apply_config_failure(
                &mut record,
                now,
                "no webhook target configured: set trigger.url or supply x-webhook-url",
            );
            self.store.put_if_scheduled_at(key, &record, due_at)?;
            return Ok(());
        };

        match self.trigger.fire(self.method, &url).await {
            Ok(()) => {
                machine::apply_success(&mut record, Utc::now());
                info!(%key, %url, "trigger call succeeded");
            }
            Err(e) => {
                let delay_ms = machine::apply_failure(&mut record, Utc::now(), &e.to_string());
                warn!(
                    %key,
                    %url,
                    retry_count = record.retry_count,
                    retry_in_ms = delay_ms,
                    "trigger call failed: {e}"
                );
            }
        }

        // A request that arrived during the call owns the slot now; the
        // stale result is dropped.
        if !self.store.put_if_scheduled_at(key, &record, due_at)? {
            debug!(%key, "execution superseded mid-flight — result dropped");
        }
        Ok(())
    }
}
