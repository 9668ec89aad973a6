//! Console "please wait" indicator shown while workers run.

use std::io::Write;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const FRAMES: [&str; 3] = [".", "..", "..."];
const TICK: Duration = Duration::from_millis(500);

/// Handle to the running indicator. Purely cosmetic; owns no worker state.
pub struct ProgressIndicator {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl ProgressIndicator {
    /// Start drawing to stderr until [`ProgressIndicator::stop`] is called.
    pub fn start() -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            let mut frame = 0usize;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => {
                        let mut err = std::io::stderr();
                        let _ = write!(err, "\rPLEASE WAIT{:<3}", FRAMES[frame % FRAMES.len()]);
                        let _ = err.flush();
                        frame += 1;
                    }
                }
            }
            let mut err = std::io::stderr();
            let _ = write!(err, "\r{:<14}\r", "");
            let _ = err.flush();
        });
        Self { stop_tx, handle }
    }

    /// Signal the indicator to stop and wait for it to clear its line.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(());
        if let Err(e) = self.handle.await {
            tracing::debug!("Progress indicator task ended abnormally: {}", e);
        }
    }
}
