//! # Hot Reload
//!
//! Watches a resource descriptor and swaps the rebuilt model into a running
//! [`ApplicationHandler`] when the file changes.
//!
//! ```rust,ignore
//! use jaxrouter::hot_reload::watch_descriptor;
//!
//! let app = Arc::new(ApplicationHandler::new(builder, config)?);
//! let _watcher = watch_descriptor("resources.yaml", Arc::clone(&app), 200)?;
//! ```
//!
//! Reload failures (unreadable file, parse error, fatal validation issues)
//! are logged and the previous model keeps serving. In-flight requests finish
//! on the snapshot they started with.

use crate::descriptor::Descriptor;
use crate::server::ApplicationHandler;
use anyhow::bail;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Reload `path` into `app` once.
///
/// A descriptor without any root resource (an empty or truncated file) is
/// rejected rather than swapped in.
///
/// # Errors
///
/// Descriptor load failures, descriptors without roots and model
/// validation errors; `app` is untouched in every case.
pub fn reload_descriptor(path: &Path, app: &ApplicationHandler) -> anyhow::Result<()> {
    let descriptor = Descriptor::from_file(path)?;
    if descriptor.root_count() == 0 {
        bail!("{} declares no root resources", path.display());
    }
    app.replace_model(descriptor.to_builder()?)?;
    Ok(())
}

/// [`watch_descriptor`] with the debounce from `app`'s
/// `reload_debounce_ms`.
///
/// # Errors
///
/// Watcher creation and registration failures.
pub fn watch<P: AsRef<Path>>(path: P, app: Arc<ApplicationHandler>) -> notify::Result<RecommendedWatcher> {
    let debounce_ms = app.config().reload_debounce_ms;
    watch_descriptor(path, app, debounce_ms)
}

/// Watch `path` and reload it into `app` once modifications have been quiet
/// for `debounce_ms`. A burst of events (truncate then write) yields a
/// single reload of the final contents.
///
/// Reloads run on a dedicated thread that exits when the returned watcher
/// is dropped.
///
/// # Errors
///
/// Watcher creation, registration and worker thread spawn failures.
pub fn watch_descriptor<P>(
    path: P,
    app: Arc<ApplicationHandler>,
    debounce_ms: u64,
) -> notify::Result<RecommendedWatcher>
where
    P: AsRef<Path>,
{
    let path: PathBuf = path.as_ref().to_path_buf();
    let (tx, rx) = mpsc::channel::<()>();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
                    && tx.send(()).is_err()
                {
                    debug!("hot-reload: worker gone, event dropped");
                }
            }
            Err(e) => warn!(error = %e, "hot-reload: watch error"),
        },
        Config::default(),
    )?;
    watcher.watch(&path, RecursiveMode::NonRecursive)?;

    let debounce = Duration::from_millis(debounce_ms);
    thread::Builder::new()
        .name("jaxr-hot-reload".to_string())
        .spawn(move || reload_worker(&rx, &path, &app, debounce))
        .map_err(notify::Error::io)?;
    Ok(watcher)
}

fn reload_worker(rx: &Receiver<()>, path: &Path, app: &ApplicationHandler, debounce: Duration) {
    while rx.recv().is_ok() {
        loop {
            match rx.recv_timeout(debounce) {
                Ok(()) => {}
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
        match reload_descriptor(path, app) {
            Ok(()) => info!(
                path = %path.display(),
                routes = app.router().model().route_lines().len(),
                "hot-reload: descriptor applied"
            ),
            Err(e) => error!(
                path = %path.display(),
                error = %format!("{e:#}"),
                "hot-reload: keeping previous model"
            ),
        }
    }
}
