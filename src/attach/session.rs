//! Interactive sessions against a remote process's stdio
//!
//! A session pipes local input to the remote and the remote's output to the
//! local terminal until the remote side ends or fails. Raw mode and the
//! optional resize relay are owned by [`InteractiveSession`], so they are
//! released on every exit path, including the caller dropping the future.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use super::relay::{pump, PumpError};
use super::resize::{ResizeSubscription, ResizeTarget};
use super::terminal::{RawModeGuard, TerminalMode};
use crate::error::AttachError;

/// Resources held for the duration of an interactive session.
///
/// Fields drop in declaration order: the resize relay is gone before the
/// terminal mode is restored.
pub struct InteractiveSession<'a, T: TerminalMode + ?Sized> {
    resize: Option<ResizeSubscription>,
    raw_mode: RawModeGuard<'a, T>,
}

impl<'a, T: TerminalMode + ?Sized> InteractiveSession<'a, T> {
    /// Switch the terminal to raw mode if it is interactive.
    pub fn enter(terminal: &'a T) -> Result<Self, AttachError> {
        let raw_mode = RawModeGuard::acquire(terminal).map_err(AttachError::Terminal)?;
        debug!(raw = raw_mode.changed_mode(), "interactive session started");
        Ok(Self {
            resize: None,
            raw_mode,
        })
    }

    /// Tie a resize relay to this session.
    pub fn with_resize(mut self, subscription: ResizeSubscription) -> Self {
        self.resize = Some(subscription);
        self
    }

    pub fn has_resize(&self) -> bool {
        self.resize.is_some()
    }

    /// Stop the resize relay, then restore the terminal mode.
    pub async fn exit(self) -> Result<(), AttachError> {
        let InteractiveSession { resize, raw_mode } = self;
        if let Some(subscription) = resize {
            subscription.close().await;
        }
        raw_mode.release().map_err(AttachError::Terminal)?;
        debug!("interactive session ended");
        Ok(())
    }

    /// Relay `input` to `remote` and `remote` to `output` until the remote
    /// ends (success) or fails, then exit the session.
    pub async fn run<S, I, O>(self, remote: S, mut input: I, mut output: O) -> Result<(), AttachError>
    where
        S: AsyncRead + AsyncWrite,
        I: AsyncRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        let (mut remote_out, mut remote_in) = tokio::io::split(remote);

        let outcome = {
            let upstream = async {
                match pump(&mut input, &mut remote_in).await {
                    Ok(bytes) => {
                        debug!(bytes, "local input ended");
                        let _ = remote_in.shutdown().await;
                    }
                    Err(e) => debug!(error = ?e, "input relay stopped"),
                }
            };
            let downstream = pump(&mut remote_out, &mut output);
            tokio::pin!(upstream, downstream);

            let mut upstream_done = false;
            loop {
                tokio::select! {
                    result = &mut downstream => break result,
                    _ = &mut upstream, if !upstream_done => upstream_done = true,
                }
            }
        };

        self.exit().await?;

        match outcome {
            Ok(bytes) => {
                debug!(bytes, "remote stream ended");
                Ok(())
            }
            Err(PumpError::Read(e)) => Err(AttachError::Remote(e)),
            Err(PumpError::Write(e)) => Err(AttachError::Terminal(e)),
        }
    }
}

/// Attach the local terminal to a remote process's stdio.
pub async fn attach_stream<S, I, O, T>(
    remote: S,
    input: I,
    output: O,
    terminal: &T,
) -> Result<(), AttachError>
where
    S: AsyncRead + AsyncWrite,
    I: AsyncRead + Unpin,
    O: AsyncWrite + Unpin,
    T: TerminalMode + ?Sized,
{
    InteractiveSession::enter(terminal)?
        .run(remote, input, output)
        .await
}

/// Attach to an exec'd process, relaying local window changes to `target`
/// for as long as the session is open.
pub async fn exec_stream<S, I, O, T, R>(
    remote: S,
    input: I,
    output: O,
    terminal: &T,
    target: Arc<R>,
) -> Result<(), AttachError>
where
    S: AsyncRead + AsyncWrite,
    I: AsyncRead + Unpin,
    O: AsyncWrite + Unpin,
    T: TerminalMode + ?Sized,
    R: ResizeTarget,
{
    let session = InteractiveSession::enter(terminal)?;
    let subscription = ResizeSubscription::install(target).map_err(AttachError::Terminal)?;
    session
        .with_resize(subscription)
        .run(remote, input, output)
        .await
}
