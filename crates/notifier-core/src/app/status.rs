//! Status - worker の累積カウンタ
//!
//! ループ側は atomics を加算するだけ。読む側は [`WorkerCounts`] のスナップショットを取る。

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::dispatcher::DispatchOutcome;

/// Point-in-time copy of the worker counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerCounts {
    /// Events popped and decoded, whatever happened next.
    pub dispatched: u64,
    pub sent: u64,
    pub skipped_missing: u64,
    pub unknown_kind: u64,
    pub delivery_failed: u64,
    pub decode_failed: u64,
    pub dispatch_errors: u64,
    pub queue_errors: u64,
    pub sweeps: u64,
    pub sweep_failures: u64,
}

#[derive(Debug, Default)]
pub(crate) struct WorkerStats {
    dispatched: AtomicU64,
    sent: AtomicU64,
    skipped_missing: AtomicU64,
    unknown_kind: AtomicU64,
    delivery_failed: AtomicU64,
    decode_failed: AtomicU64,
    dispatch_errors: AtomicU64,
    queue_errors: AtomicU64,
    sweeps: AtomicU64,
    sweep_failures: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl WorkerStats {
    pub(crate) fn record_outcome(&self, outcome: &DispatchOutcome) {
        bump(&self.dispatched);
        match outcome {
            DispatchOutcome::Sent(_) => bump(&self.sent),
            DispatchOutcome::MissingReferent => bump(&self.skipped_missing),
            DispatchOutcome::UnknownKind => bump(&self.unknown_kind),
            DispatchOutcome::DeliveryFailed(_) => bump(&self.delivery_failed),
        }
    }

    pub(crate) fn record_dispatch_error(&self) {
        bump(&self.dispatched);
        bump(&self.dispatch_errors);
    }

    pub(crate) fn record_decode_failure(&self) {
        bump(&self.decode_failed);
    }

    pub(crate) fn record_queue_error(&self) {
        bump(&self.queue_errors);
    }

    pub(crate) fn record_sweep(&self, ok: bool) {
        if ok {
            bump(&self.sweeps);
        } else {
            bump(&self.sweep_failures);
        }
    }

    pub(crate) fn snapshot(&self) -> WorkerCounts {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        WorkerCounts {
            dispatched: load(&self.dispatched),
            sent: load(&self.sent),
            skipped_missing: load(&self.skipped_missing),
            unknown_kind: load(&self.unknown_kind),
            delivery_failed: load(&self.delivery_failed),
            decode_failed: load(&self.decode_failed),
            dispatch_errors: load(&self.dispatch_errors),
            queue_errors: load(&self.queue_errors),
            sweeps: load(&self.sweeps),
            sweep_failures: load(&self.sweep_failures),
        }
    }
}
