//! Driving the renderer from a live stream
//!
//! A progress stream settles exactly once: the first end or close signal
//! resolves it, an error signal rejects it, and nothing after that point is
//! looked at.

use std::io::{self, Write};

use futures_util::stream::{self, Stream, StreamExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, trace};

use super::render::{ProgressRenderer, RenderOptions};
use crate::error::ProgressError;

/// Lifecycle signal of a progress stream.
#[derive(Debug)]
pub enum StreamSignal {
    /// A chunk of frames
    Data(Vec<u8>),
    /// The producer finished writing
    End,
    /// The underlying connection closed
    Close,
    /// The stream failed
    Error(io::Error),
}

/// Latch that lets a stream settle only once.
#[derive(Debug, Default)]
pub struct Completion {
    settled: bool,
}

impl Completion {
    /// Returns `true` only for the first call.
    pub fn settle(&mut self) -> bool {
        !std::mem::replace(&mut self.settled, true)
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }
}

impl<W: Write> ProgressRenderer<W> {
    /// Consume explicit stream signals until the stream settles.
    ///
    /// A source that runs dry without an end or close signal counts as closed.
    pub async fn follow_signals<S>(&mut self, signals: S) -> Result<(), ProgressError>
    where
        S: Stream<Item = StreamSignal>,
    {
        let mut signals = std::pin::pin!(signals);
        let mut completion = Completion::default();

        while !completion.is_settled() {
            match signals.next().await {
                Some(StreamSignal::Data(chunk)) => {
                    trace!(bytes = chunk.len(), "progress chunk");
                    self.apply_chunk(&chunk)?;
                }
                Some(StreamSignal::End) | Some(StreamSignal::Close) | None => {
                    if completion.settle() {
                        debug!(lines = self.rows().len(), "progress stream finished");
                    }
                }
                Some(StreamSignal::Error(err)) => {
                    completion.settle();
                    return Err(ProgressError::Io(err));
                }
            }
        }

        Ok(())
    }

    /// Consume a stream of chunks until it ends or fails.
    pub async fn follow<S, B>(&mut self, chunks: S) -> Result<(), ProgressError>
    where
        S: Stream<Item = io::Result<B>>,
        B: AsRef<[u8]>,
    {
        let signals = chunks.map(|chunk| match chunk {
            Ok(bytes) => StreamSignal::Data(bytes.as_ref().to_vec()),
            Err(err) => StreamSignal::Error(err),
        });
        self.follow_signals(signals.chain(stream::once(async { StreamSignal::End })))
            .await
    }
}

/// Render a progress stream on stdout with a fresh set of rows.
pub async fn follow_progress<S, B>(chunks: S, options: RenderOptions) -> Result<(), ProgressError>
where
    S: Stream<Item = io::Result<B>>,
    B: AsRef<[u8]>,
{
    let mut renderer = ProgressRenderer::with_options(io::stdout(), options);
    renderer.follow(chunks).await
}

/// Split a buffered reader into newline-delimited chunks.
///
/// Captured daemon output holds one frame per line, so each line is handed to
/// the renderer as its own chunk.
pub fn line_chunks<R>(reader: R) -> impl Stream<Item = io::Result<Vec<u8>>>
where
    R: AsyncBufRead + Unpin,
{
    stream::unfold(Some(reader), |state| async move {
        let mut reader = state?;
        let mut line = Vec::new();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => None,
            Ok(_) => Some((Ok(line), Some(reader))),
            Err(err) => Some((Err(err), None)),
        }
    })
}
