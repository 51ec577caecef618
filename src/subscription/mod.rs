use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use bytes::Bytes;
use tokio::select;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex};

use crate::context::Context;

mod topics;

pub use topics::SubscriptionTopic;

/// Buffer size of each per-topic broadcast channel. A subscriber that lags
/// further behind than this loses the oldest events for its topic, it is
/// never able to stall other subscribers or the publisher.
const TOPIC_BUFFER: usize = 64;

#[derive(thiserror::Error, Debug)]
pub enum SubscriptionError {
    #[error("send error: {0}")]
    Send(#[from] mpsc::error::SendError<Event>),
    #[error("receive error: {0}")]
    Receive(#[from] oneshot::error::RecvError),
}

#[derive(Debug)]
pub enum Event {
    Subscribe {
        topic: String,
        tx: oneshot::Sender<broadcast::Receiver<Bytes>>,
    },
    Unsubscribe {
        topic: String,
    },
    Publish {
        topic: String,
        payload: Bytes,
    },
    ReceiverCount {
        topic: String,
        tx: oneshot::Sender<usize>,
    },
}

/// Fan-out hub mapping topic names to the connections subscribed to them.
///
/// All mutations of the topic map go through one event queue consumed by
/// [`run`](SubscriptionManager::run), so subscribes, unsubscribes and
/// publishes are serialized: events published to one topic reach every
/// receiver in publish order. Publishing is fire-and-forget, a dead or
/// lagging receiver is skipped without affecting anyone else.
///
/// An instance lives on the global state and is handed to whoever needs
/// it, nothing in here is a process-wide singleton.
pub struct SubscriptionManager {
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: Mutex<mpsc::UnboundedReceiver<Event>>,
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        // Only one value is needed in the channel.
        // This is a way to get around we cannot await in a drop.
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            events_rx: Mutex::new(events_rx),
            events_tx,
        }
    }
}

pub struct SubscriberReceiver<'a> {
    topic: String,
    rx: broadcast::Receiver<Bytes>,
    manager: &'a SubscriptionManager,
}

impl Deref for SubscriberReceiver<'_> {
    type Target = broadcast::Receiver<Bytes>;

    fn deref(&self) -> &Self::Target {
        &self.rx
    }
}

impl DerefMut for SubscriberReceiver<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.rx
    }
}

impl SubscriptionManager {
    pub async fn run(&self, ctx: Context) {
        let mut topics = HashMap::<String, broadcast::Sender<Bytes>>::new();

        let mut events_rx = self.events_rx.lock().await;

        loop {
            select! {
                event = events_rx.recv() => {
                    // The sender side lives on self, it cannot have been
                    // dropped while we are borrowed.
                    match event.expect("events channel closed") {
                        Event::Subscribe { topic, tx } => {
                            match topics.get(&topic) {
                                Some(btx) => {
                                    tx.send(btx.subscribe()).ok();
                                }
                                None => {
                                    let (btx, rx) = broadcast::channel(TOPIC_BUFFER);
                                    if tx.send(rx).is_err() {
                                        // Subscriber went away before the
                                        // handshake finished.
                                        continue;
                                    }

                                    tracing::debug!(topic = %topic, "subscribed to new topic");
                                    topics.insert(topic, btx);
                                }
                            };
                        }
                        Event::Unsubscribe { topic } => {
                            if let Some(btx) = topics.get(&topic) {
                                if btx.receiver_count() == 0 {
                                    topics.remove(&topic);
                                    tracing::debug!(topic = %topic, "dropped idle topic");
                                }
                            }

                            if topics.is_empty() && ctx.is_done() {
                                break;
                            }
                        }
                        Event::ReceiverCount { topic, tx } => {
                            let count = topics
                                .get(&topic)
                                .map(|btx| btx.receiver_count())
                                .unwrap_or(0);
                            tx.send(count).ok();
                        }
                        Event::Publish { topic, payload } => {
                            let Some(btx) = topics.get(&topic) else {
                                // Nobody is listening, drop the event.
                                continue;
                            };

                            // Fails only when every receiver is already
                            // gone, which is the same as nobody listening.
                            btx.send(payload).ok();
                        }
                    }
                }
                _ = ctx.done() => {
                    break;
                }
            }
        }
    }

    /// Attach to a topic. The returned receiver detaches again when
    /// dropped, so a connection that dies in any way releases its
    /// membership.
    pub async fn subscribe(
        &self,
        topic: SubscriptionTopic,
    ) -> Result<SubscriberReceiver<'_>, SubscriptionError> {
        let (tx, rx) = oneshot::channel();

        self.events_tx.send(Event::Subscribe {
            topic: topic.to_string(),
            tx,
        })?;

        let rx = rx.await?;

        Ok(SubscriberReceiver {
            topic: topic.to_string(),
            rx,
            manager: self,
        })
    }

    /// Number of receivers currently attached to a topic.
    pub async fn receiver_count(
        &self,
        topic: SubscriptionTopic,
    ) -> Result<usize, SubscriptionError> {
        let (tx, rx) = oneshot::channel();

        self.events_tx.send(Event::ReceiverCount {
            topic: topic.to_string(),
            tx,
        })?;

        Ok(rx.await?)
    }

    /// Hand an event to the fan-out queue. Returns once the event is
    /// enqueued, client-side receipt is not guaranteed.
    pub fn publish(&self, topic: SubscriptionTopic, payload: Bytes) {
        if self
            .events_tx
            .send(Event::Publish {
                topic: topic.to_string(),
                payload,
            })
            .is_err()
        {
            tracing::warn!(topic = %topic, "publish after subscription manager stopped");
        }
    }
}

impl Drop for SubscriberReceiver<'_> {
    fn drop(&mut self) {
        self.manager
            .events_tx
            .send(Event::Unsubscribe {
                topic: self.topic.clone(),
            })
            .ok();
    }
}
