use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A cancellation scope shared by every long running task in the process.
///
/// `Context` clones are handed to tasks; the matching [`Handler`] stays in
/// `main`. Cancelling the handler wakes every `done()` future, and
/// `Handler::cancel` only resolves once every `Context` clone has been
/// dropped, which is what lets shutdown wait for connection tasks to
/// finish their cleanup.
#[derive(Clone)]
pub struct Context {
    token: CancellationToken,
    // Dropped with the last Context clone, closing the channel the
    // handler waits on.
    _alive: mpsc::Sender<()>,
}

pub struct Handler {
    token: CancellationToken,
    alive_rx: mpsc::Receiver<()>,
}

impl Context {
    pub fn new() -> (Self, Handler) {
        let token = CancellationToken::new();
        let (alive_tx, alive_rx) = mpsc::channel(1);

        (
            Self {
                token: token.clone(),
                _alive: alive_tx,
            },
            Handler { token, alive_rx },
        )
    }

    /// Resolves when the context has been cancelled.
    pub async fn done(&self) {
        self.token.cancelled().await;
    }

    pub fn is_done(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Handler {
    /// Cancel the context and wait for every clone of it to be dropped.
    pub async fn cancel(mut self) {
        self.token.cancel();

        // recv returns None once all senders (context clones) are gone.
        while self.alive_rx.recv().await.is_some() {}
    }
}
