use super::response::Response;
use crate::exception::HandlerError;
use may::coroutine;
use may::sync::mpsc;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;
use tracing::{debug, error};

pub(crate) type Completion = mpsc::Sender<Result<Response, HandlerError>>;

/// Handle to a suspended response.
///
/// Move it to another coroutine or thread and call [`resume`](Self::resume)
/// once the response is ready. Dropping it without resuming completes the
/// request with a 500; when a timeout is configured and elapses first the
/// request completes with a 503.
pub struct AsyncResponse {
    tx: Option<Completion>,
    // Dropping it stops the watchdog.
    cancel: Option<mpsc::Sender<()>>,
}

impl AsyncResponse {
    pub(crate) fn new(tx: Completion, timeout_ms: u64) -> Self {
        let cancel = (timeout_ms > 0).then(|| {
            let (cancel, cancelled) = mpsc::channel();
            spawn_watchdog(tx.clone(), cancelled, timeout_ms);
            cancel
        });
        Self {
            tx: Some(tx),
            cancel,
        }
    }

    /// Complete the request. Returns `false` when it already completed
    /// (timed out) or the waiting side has gone.
    pub fn resume(mut self, response: Response) -> bool {
        self.complete(Ok(response))
    }

    /// Complete the request with an error, mapped like a handler error.
    pub fn resume_error(mut self, error: HandlerError) -> bool {
        self.complete(Err(error))
    }

    fn complete(&mut self, result: Result<Response, HandlerError>) -> bool {
        let sent = match self.tx.take() {
            Some(tx) => tx.send(result).is_ok(),
            None => false,
        };
        self.cancel = None;
        sent
    }
}

impl Drop for AsyncResponse {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let abandoned = HandlerError::internal("suspended response dropped without resume");
            if tx.send(Err(abandoned)).is_err() {
                debug!("suspended response dropped after completion");
            }
        }
    }
}

fn spawn_watchdog(tx: Completion, cancelled: mpsc::Receiver<()>, timeout_ms: u64) {
    // SAFETY: may::coroutine::Builder::spawn() is marked unsafe by the may runtime.
    // The closure owns everything it touches and only sends on a channel.
    let spawned = unsafe {
        coroutine::Builder::new()
            .name("async-timeout".to_string())
            .spawn(move || {
                let waited = cancelled.recv_timeout(Duration::from_millis(timeout_ms));
                if !matches!(waited, Err(RecvTimeoutError::Timeout)) {
                    return;
                }
                let timeout = HandlerError::service_unavailable("asynchronous response timed out");
                if tx.send(Err(timeout)).is_err() {
                    debug!("async watchdog fired after the request finished");
                }
            })
    };
    if let Err(e) = spawned {
        error!(error = %e, "failed to spawn async timeout watchdog");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_releases_watchdog() {
        let (tx, rx) = mpsc::channel();
        let pending = AsyncResponse::new(tx, 60_000);
        assert!(pending.resume(Response::text("done")));
        assert_eq!(rx.recv().expect("response").expect("ok").text_body(), "done");
        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(2)),
            Err(RecvTimeoutError::Disconnected)
        ));
    }

    #[test]
    fn test_watchdog_times_out() {
        let (tx, rx) = mpsc::channel();
        let pending = AsyncResponse::new(tx, 20);
        let first = rx.recv().expect("completion");
        assert_eq!(first.expect_err("timeout").status(), 503);
        drop(pending);
    }
}
