//! Window-size relay to a remote process
//!
//! While an interactive exec session is open, every window-change signal is
//! turned into a resize request against the remote. The relay lives in a
//! [`ResizeSubscription`]; once it is closed or dropped no further request is
//! issued, even if a signal is already queued.

use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::stream::{BoxStream, Stream, StreamExt};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Terminal dimensions in character cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub cols: u16,
    pub rows: u16,
}

impl WindowSize {
    /// Size of the local terminal
    pub fn current() -> io::Result<Self> {
        let (cols, rows) = crossterm::terminal::size()?;
        Ok(Self { cols, rows })
    }
}

/// A remote process that can be told about a new window size.
pub trait ResizeTarget: Send + Sync + 'static {
    fn resize(&self, size: WindowSize) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Window-change notifications for the local terminal.
#[cfg(unix)]
pub fn window_changes() -> io::Result<BoxStream<'static, ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let sigwinch = signal(SignalKind::window_change())?;
    Ok(futures_util::stream::unfold(sigwinch, |mut sigwinch| async move {
        sigwinch.recv().await.map(|()| ((), sigwinch))
    })
    .boxed())
}

/// Window-change notifications for the local terminal.
#[cfg(not(unix))]
pub fn window_changes() -> io::Result<BoxStream<'static, ()>> {
    Ok(futures_util::stream::pending().boxed())
}

/// Active resize relay; dispose with [`ResizeSubscription::close`] or by dropping.
pub struct ResizeSubscription {
    active: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl ResizeSubscription {
    /// Relay the local terminal's size to `target` on every window change.
    pub fn install<T: ResizeTarget>(target: Arc<T>) -> io::Result<Self> {
        Ok(Self::install_with(target, window_changes()?, WindowSize::current))
    }

    /// Relay sizes read by `size` to `target` on every item of `signals`.
    ///
    /// The current size is pushed once right away.
    pub fn install_with<T, S, F>(target: Arc<T>, signals: S, size: F) -> Self
    where
        T: ResizeTarget,
        S: Stream<Item = ()> + Send + 'static,
        F: Fn() -> io::Result<WindowSize> + Send + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&active);

        let task = tokio::spawn(async move {
            let mut signals = std::pin::pin!(signals);
            let mut pending = true;
            while pending || signals.next().await.is_some() {
                pending = false;
                if !flag.load(Ordering::SeqCst) {
                    break;
                }
                let size = match size() {
                    Ok(size) => size,
                    Err(e) => {
                        warn!(error = %e, "could not read window size");
                        continue;
                    }
                };
                debug!(cols = size.cols, rows = size.rows, "resizing remote");
                if let Err(e) = target.resize(size).await {
                    warn!(error = %e, "remote resize failed");
                }
            }
        });

        Self {
            active,
            task: Some(task),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop relaying and wait for the relay task to wind down.
    pub async fn close(mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for ResizeSubscription {
    fn drop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::future::Future;
    use std::sync::Mutex;

    use super::{ResizeTarget, WindowSize};

    /// Records every resize request it receives
    #[derive(Debug, Default)]
    pub struct RecordingTarget {
        pub sizes: Mutex<Vec<WindowSize>>,
    }

    impl RecordingTarget {
        pub fn calls(&self) -> Vec<WindowSize> {
            self.sizes.lock().unwrap_or_else(|p| p.into_inner()).clone()
        }
    }

    impl ResizeTarget for RecordingTarget {
        fn resize(&self, size: WindowSize) -> impl Future<Output = anyhow::Result<()>> + Send {
            self.sizes.lock().unwrap_or_else(|p| p.into_inner()).push(size);
            async { Ok(()) }
        }
    }
}
