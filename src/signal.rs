use futures::future::select_all;
use tokio::signal::unix::{signal, Signal, SignalKind};

/// Listens for any of a set of unix signals.
pub struct SignalHandler {
    signals: Vec<(SignalKind, Signal)>,
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self {
            signals: Vec::new(),
        }
    }
}

impl SignalHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signal(mut self, kind: SignalKind) -> Self {
        let listener = signal(kind).expect("failed to register signal listener");
        self.signals.push((kind, listener));
        self
    }

    /// Waits for the next registered signal to fire.
    pub async fn recv(&mut self) -> SignalKind {
        if self.signals.is_empty() {
            return std::future::pending().await;
        }

        let futures = self
            .signals
            .iter_mut()
            .map(|(kind, listener)| {
                let kind = *kind;
                Box::pin(async move {
                    listener.recv().await;
                    kind
                })
            })
            .collect::<Vec<_>>();

        let (kind, _, _) = select_all(futures).await;
        kind
    }
}
