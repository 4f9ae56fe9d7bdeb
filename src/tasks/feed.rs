//! Live owner-scoped task query.
//!
//! Writes publish the owner whose task set changed; each subscription re-reads
//! that owner's full list and yields it as a snapshot. Dropping a
//! [`TaskSubscription`] (or the stream made from it) unsubscribes, and an
//! owner signing out ends every subscription they hold.

use std::sync::Arc;

use futures_util::stream::{self, Stream};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;

use super::repo_types::Task;
use crate::store::DocumentStore;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
enum FeedEvent {
    Changed(String),
    SignedOut(String),
}

#[derive(Clone)]
pub struct TaskFeed {
    tx: broadcast::Sender<FeedEvent>,
}

impl Default for TaskFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, owner: &str) {
        // Err only means nobody is listening right now.
        let _ = self.tx.send(FeedEvent::Changed(owner.to_string()));
    }

    /// Ends the owner's open subscriptions.
    pub fn sign_out(&self, owner: &str) {
        let _ = self.tx.send(FeedEvent::SignedOut(owner.to_string()));
    }

    pub fn subscribe(&self, store: Arc<dyn DocumentStore>, owner: String) -> TaskSubscription {
        TaskSubscription {
            store,
            owner,
            rx: self.tx.subscribe(),
            primed: false,
        }
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

pub struct TaskSubscription {
    store: Arc<dyn DocumentStore>,
    owner: String,
    rx: broadcast::Receiver<FeedEvent>,
    primed: bool,
}

impl TaskSubscription {
    /// First call returns the current list; later calls wait for a change to it.
    /// `None` once the owner signs out or the feed is gone.
    pub async fn next_snapshot(&mut self) -> Option<anyhow::Result<Vec<Task>>> {
        if self.primed {
            loop {
                match self.rx.recv().await {
                    Ok(FeedEvent::Changed(owner)) if owner == self.owner => break,
                    Ok(FeedEvent::SignedOut(owner)) if owner == self.owner => {
                        debug!(owner = %self.owner, "owner signed out; ending subscription");
                        return None;
                    }
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(owner = %self.owner, skipped, "task feed lagged; re-reading");
                        break;
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        }
        self.primed = true;
        Some(self.store.list_tasks_by_owner(&self.owner).await)
    }

    pub fn into_stream(self) -> impl Stream<Item = anyhow::Result<Vec<Task>>> + Send {
        stream::unfold(self, |mut sub| async move {
            let snapshot = sub.next_snapshot().await?;
            Some((snapshot, sub))
        })
    }
}
