//! Data bridge: connects the core's reactive state to TUI actions.
//!
//! Two directions of the same bridge: a background task forwarding every
//! record store change as [`Action::RecordsUpdated`], and a [`StatusSink`]
//! that turns controller notices and progress into actions.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use daylog_core::{Notice, RecordStore, StatusSink};

use crate::action::Action;

/// Forward record store changes to the action loop until cancelled.
///
/// The subscription yields the current snapshot first, so the list has
/// rows immediately.
pub async fn spawn_data_bridge(
    store: Arc<RecordStore>,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut records = store.subscribe().into_stream();
    drop(store);

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!("data bridge cancelled");
                break;
            }

            next = records.next() => {
                let Some(snapshot) = next else {
                    debug!("record store dropped, data bridge stopping");
                    break;
                };
                if action_tx.send(Action::RecordsUpdated(snapshot)).is_err() {
                    break;
                }
            }
        }
    }
}

/// [`StatusSink`] backed by the action channel. Safe to call from the
/// filter worker's task; delivery is fire-and-forget.
#[derive(Debug, Clone)]
pub struct ActionStatus {
    tx: mpsc::UnboundedSender<Action>,
}

impl ActionStatus {
    pub fn new(tx: mpsc::UnboundedSender<Action>) -> Self {
        Self { tx }
    }
}

impl StatusSink for ActionStatus {
    fn notify(&self, notice: Notice) {
        let _ = self.tx.send(Action::Notify(notice));
    }

    fn set_working(&self, working: bool) {
        let _ = self.tx.send(Action::Working(working));
    }

    fn progress(&self, percent: u8) {
        let _ = self.tx.send(Action::Progress(percent));
    }
}
