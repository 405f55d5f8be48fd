//! Build and pull progress display
//!
//! Turns the daemon's chunked JSON progress stream into a live terminal view
//! where each layer, build step or BuildKit vertex owns one row that is
//! redrawn in place:
//! - Chunk framing and event classification
//! - BuildKit trace decoding
//! - Row bookkeeping and cursor-relative rendering

mod bar;
mod decode;
mod event;
mod follow;
mod render;
mod rows;
mod trace;

pub use bar::{compose_line, filled_cells, format_size, render_bar};
pub use decode::{decode_chunk, split_items};
pub use event::{ProgressEvent, StatusUpdate, IMAGE_ID, TRACE_ID};
pub use follow::{follow_progress, line_chunks, Completion, StreamSignal};
pub use render::{ProgressRenderer, RenderOptions, DIGEST_PREFIX, FALLBACK_COLUMNS};
pub use rows::RowRegistry;
pub use trace::{TraceBatch, TraceLog, TraceStatus, TraceVertex};
