//! Events received by an in-memory client.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;

/// One received event.
pub type Received = (String, Vec<Value>);

/// Queue of events a client has not consumed yet, plus a full log.
///
/// `wait_for` and `try_take` consume from the queue; `received` reads the
/// log, which keeps everything in arrival order.
#[derive(Debug, Default)]
pub struct Inbox {
    pending: Mutex<VecDeque<Received>>,
    log: Mutex<Vec<Received>>,
    notify: Notify,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event and wake waiters.
    pub fn push(&self, event: &str, args: Vec<Value>) {
        self.log.lock().push((event.to_string(), args.clone()));
        self.pending.lock().push_back((event.to_string(), args));
        self.notify.notify_waiters();
    }

    /// Take the oldest unconsumed `event`, if one has arrived.
    pub fn try_take(&self, event: &str) -> Option<Vec<Value>> {
        let mut pending = self.pending.lock();
        let index = pending.iter().position(|(name, _)| name == event)?;
        pending.remove(index).map(|(_, args)| args)
    }

    /// Wait for the oldest unconsumed `event`.
    pub async fn wait_for(&self, event: &str) -> Vec<Value> {
        loop {
            let notified = self.notify.notified();
            if let Some(args) = self.try_take(event) {
                return args;
            }
            notified.await;
        }
    }

    /// Everything received so far, in arrival order.
    pub fn received(&self) -> Vec<Received> {
        self.log.lock().clone()
    }
}
