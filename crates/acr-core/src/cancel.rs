//! A minimal cooperative cancellation signal shared by a scheduler run and
//! every reviewer it spawns.

use tokio::sync::watch;

/// Handle the caller holds to fire cancellation for every derived receiver.
#[derive(Clone)]
pub struct Cancellation {
    tx: watch::Sender<bool>,
}

impl Cancellation {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn fire(&self) {
        let _ = self.tx.send(true);
    }

    pub fn receiver(&self) -> CancellationRx {
        CancellationRx(self.tx.subscribe())
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-reviewer view of the signal. Cheap to clone; each reviewer gets its
/// own so a per-reviewer timeout can fire it independently of the parent.
#[derive(Clone)]
pub struct CancellationRx(watch::Receiver<bool>);

impl CancellationRx {
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once the signal fires; never resolves otherwise (the sender
    /// side lives at least as long as any receiver holding it in this crate's
    /// usage, so a closed channel is treated the same as "never cancelled").
    pub async fn cancelled(&mut self) {
        loop {
            if *self.0.borrow() {
                return;
            }
            if self.0.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
