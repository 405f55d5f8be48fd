//! Live multi-row progress display
//!
//! Rows are addressed relative to the bottom of the display: the cursor always
//! rests on the line below the last row, so redrawing row `r` means saving the
//! cursor, moving up `lines - r` lines, rewriting the line and restoring. A new
//! row is drawn where the cursor already is and ends with a newline.
//! Untracked text is written at the cursor and pushes the bottom down.

use std::io::{self, Write};

use tracing::{debug, warn};
use unicode_width::UnicodeWidthStr;

use super::bar::compose_line;
use super::decode::decode_chunk;
use super::event::{ProgressEvent, StatusUpdate};
use super::rows::RowRegistry;
use super::trace::TraceBatch;
use crate::error::ProgressError;
use crate::escape;

/// Characters of a vertex digest used as its row key
pub const DIGEST_PREFIX: usize = 12;

/// Width assumed when the terminal size cannot be read
pub const FALLBACK_COLUMNS: u16 = 80;

/// Display settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Fixed terminal width; `None` queries the terminal on every line
    pub columns: Option<u16>,
    pub fallback_columns: u16,
    pub digest_prefix: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            columns: None,
            fallback_columns: FALLBACK_COLUMNS,
            digest_prefix: DIGEST_PREFIX,
        }
    }
}

pub struct ProgressRenderer<W: Write> {
    out: W,
    rows: RowRegistry,
    options: RenderOptions,
}

impl<W: Write> ProgressRenderer<W> {
    pub fn new(out: W) -> Self {
        Self::with_options(out, RenderOptions::default())
    }

    pub fn with_options(out: W, options: RenderOptions) -> Self {
        Self {
            out,
            rows: RowRegistry::new(),
            options,
        }
    }

    pub fn rows(&self) -> &RowRegistry {
        &self.rows
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn columns(&self) -> usize {
        let columns = self
            .options
            .columns
            .or_else(|| crossterm::terminal::size().ok().map(|(cols, _)| cols))
            .filter(|&cols| cols > 0)
            .unwrap_or(self.options.fallback_columns);
        usize::from(columns.max(1))
    }

    /// Decode one chunk and apply its events in order.
    pub fn apply_chunk(&mut self, chunk: &[u8]) -> Result<(), ProgressError> {
        for event in decode_chunk(chunk)? {
            self.apply(event)?;
        }
        Ok(())
    }

    /// Apply a single event to the display.
    pub fn apply(&mut self, event: ProgressEvent) -> io::Result<()> {
        match event {
            ProgressEvent::Trace(batch) => self.apply_trace(batch)?,
            ProgressEvent::ImageId(id) => {
                writeln!(self.out, "Image ID: {}", id)?;
                self.rows.advance(1);
            }
            ProgressEvent::StreamText(text) => self.append(&text)?,
            ProgressEvent::Status(StatusUpdate {
                id,
                status,
                current,
                total,
            }) => self.render_line(&id, &status, current, total)?,
            ProgressEvent::Aux { id } => {
                self.append_wrapped(&format!("auxID: {}", id.unwrap_or_default()))?;
            }
            ProgressEvent::StatusText(status) => self.append_wrapped(&status)?,
            ProgressEvent::BackendError(message) => {
                warn!(%message, "daemon reported an error");
                self.append_wrapped(&format!("error: {}", message))?;
            }
            ProgressEvent::Unrecognized(item) => {
                warn!(%item, "unexpected progress item");
            }
        }
        self.out.flush()
    }

    fn apply_trace(&mut self, batch: TraceBatch) -> io::Result<()> {
        for vertex in batch.vertexes.iter().filter(|v| !v.name.is_empty()) {
            let key: String = vertex.digest.chars().take(self.options.digest_prefix).collect();
            self.render_line(&key, &vertex.name, None, None)?;
        }

        for status in &batch.statuses {
            self.render_line(
                &status.id,
                &status.name,
                status.current_count(),
                status.total_count(),
            )?;
        }

        for log in &batch.logs {
            self.append(&log.text())?;
        }

        for warning in &batch.warnings {
            self.append_wrapped(&format!("WARNING: {}", warning))?;
        }

        Ok(())
    }

    /// Draw `id`'s row in place, assigning it a row at the bottom on first sight.
    pub fn render_line(
        &mut self,
        id: &str,
        status: &str,
        current: Option<u64>,
        total: Option<u64>,
    ) -> io::Result<()> {
        let dy = match self.rows.get(id) {
            Some(row) => self.rows.distance_to(row),
            None => {
                self.rows.row_for(id);
                0
            }
        };

        if dy > 0 {
            self.out.write_all(escape::CURSOR_SAVE.as_bytes())?;
            self.out.write_all(escape::cursor_up(dy).as_bytes())?;
        }

        self.out.write_all(escape::ERASE_LINE.as_bytes())?;
        self.out.write_all(escape::CARRIAGE_RETURN.as_bytes())?;

        let line = compose_line(id, status, current, total, self.columns());
        self.out.write_all(line.as_bytes())?;

        if dy > 0 {
            self.out.write_all(escape::CURSOR_RESTORE.as_bytes())?;
        } else {
            self.out.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Write text verbatim, counting the newlines it carries.
    fn append(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.rows.advance(text.matches('\n').count());
        Ok(())
    }

    /// Write a line and count how many terminal lines it wraps onto.
    fn append_wrapped(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", text)?;
        let wrapped = text.width().div_ceil(self.columns());
        debug!(wrapped, "appended untracked line");
        self.rows.advance(wrapped);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::trace::{StatusResponse, Vertex, VertexLog, VertexStatus};
    use base64::Engine;
    use prost::Message;

    fn renderer() -> ProgressRenderer<Vec<u8>> {
        ProgressRenderer::with_options(
            Vec::new(),
            RenderOptions {
                columns: Some(80),
                ..RenderOptions::default()
            },
        )
    }

    fn output(renderer: ProgressRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    fn status(id: &str, status: &str) -> ProgressEvent {
        ProgressEvent::Status(StatusUpdate {
            id: id.to_string(),
            status: status.to_string(),
            current: None,
            total: None,
        })
    }

    #[test]
    fn test_new_row_appends_at_bottom() {
        let mut r = renderer();
        r.apply(status("a", "Waiting")).unwrap();
        assert_eq!(output(r), "\x1b[2K\ra: Waiting\n");
    }

    #[test]
    fn test_update_redraws_row_in_place() {
        let mut r = renderer();
        r.apply(status("a", "Waiting")).unwrap();
        r.apply(status("b", "Waiting")).unwrap();
        r.apply(status("c", "Waiting")).unwrap();
        r.apply(status("a", "Done")).unwrap();

        assert_eq!(r.rows().len(), 3);
        assert!(output(r).ends_with("c: Waiting\n\x1b[s\x1b[3A\x1b[2K\ra: Done\x1b[u"));
    }

    #[test]
    fn test_rows_are_stable_across_interleaving() {
        let mut r = renderer();
        let ids = ["x", "y", "z", "y", "x", "w", "z", "x"];
        let mut first_seen: Vec<&str> = Vec::new();
        for id in ids {
            if !first_seen.contains(&id) {
                first_seen.push(id);
            }
            r.apply(status(id, "Downloading")).unwrap();
        }
        for (index, id) in first_seen.iter().enumerate() {
            assert_eq!(r.rows().get(id), Some(index));
        }
        assert_eq!(r.rows().len(), 4);
    }

    #[test]
    fn test_last_row_update_stays_on_its_row() {
        let mut r = renderer();
        r.apply(status("a", "one")).unwrap();
        r.render_line("a", "two", None, None).unwrap();

        assert_eq!(r.rows().len(), 1);
        assert_eq!(
            output(r),
            "\x1b[2K\ra: one\n\x1b[s\x1b[1A\x1b[2K\ra: two\x1b[u"
        );
    }

    #[test]
    fn test_stream_text_advances_by_newlines() {
        let mut r = renderer();
        r.apply(ProgressEvent::StreamText("one\ntwo\nthree".to_string())).unwrap();
        assert_eq!(r.rows().len(), 2);
        assert_eq!(output(r), "one\ntwo\nthree");
    }

    #[test]
    fn test_text_below_rows_pushes_bottom_down() {
        let mut r = renderer();
        r.apply(status("a", "Waiting")).unwrap();
        r.apply(ProgressEvent::StreamText("log\n".to_string())).unwrap();
        r.apply(status("a", "Done")).unwrap();
        assert!(output(r).ends_with("log\n\x1b[s\x1b[2A\x1b[2K\ra: Done\x1b[u"));
    }

    #[test]
    fn test_image_id_line() {
        let mut r = renderer();
        r.apply(ProgressEvent::ImageId("sha256:beef".to_string())).unwrap();
        assert_eq!(r.rows().len(), 1);
        assert_eq!(output(r), "Image ID: sha256:beef\n");
    }

    #[test]
    fn test_aux_line_wraps() {
        let mut r = ProgressRenderer::with_options(
            Vec::new(),
            RenderOptions {
                columns: Some(10),
                ..RenderOptions::default()
            },
        );
        // "auxID: 0123456789abc" is 20 columns wide
        r.apply(ProgressEvent::Aux {
            id: Some("0123456789abc".to_string()),
        })
        .unwrap();
        assert_eq!(r.rows().len(), 2);
    }

    #[test]
    fn test_status_text_line() {
        let mut r = renderer();
        r.apply(ProgressEvent::StatusText("Digest: sha256:1".to_string())).unwrap();
        assert_eq!(r.rows().len(), 1);
        assert_eq!(output(r), "Digest: sha256:1\n");
    }

    #[test]
    fn test_unrecognized_item_is_skipped() {
        let mut r = renderer();
        r.apply(ProgressEvent::Unrecognized(serde_json::json!({"x": 1}))).unwrap();
        assert!(r.rows().is_empty());
        assert!(output(r).is_empty());
    }

    #[test]
    fn test_backend_error_is_shown() {
        let mut r = renderer();
        r.apply(ProgressEvent::BackendError("no space left".to_string())).unwrap();
        assert_eq!(output(r), "error: no space left\n");
    }

    #[test]
    fn test_trace_batch_expansion() {
        let response = StatusResponse {
            vertexes: vec![
                Vertex {
                    digest: "sha256:aaaabbbbccccdddd".to_string(),
                    name: "step1".to_string(),
                    ..Default::default()
                },
                Vertex {
                    digest: "sha256:unnamed".to_string(),
                    ..Default::default()
                },
            ],
            statuses: vec![VertexStatus {
                id: "s1".to_string(),
                name: "transferring".to_string(),
                current: 10,
                total: 20,
                ..Default::default()
            }],
            logs: vec![VertexLog {
                msg: b"hello\n".to_vec(),
                ..Default::default()
            }],
            warnings: vec![],
        };
        let payload = base64::engine::general_purpose::STANDARD.encode(response.encode_to_vec());
        let chunk = serde_json::json!({"id": "moby.buildkit.trace", "aux": payload}).to_string();

        let mut r = renderer();
        r.apply_chunk(chunk.as_bytes()).unwrap();

        assert_eq!(r.rows().get("sha256:aaaab"), Some(0));
        assert_eq!(r.rows().get("s1"), Some(1));
        assert_eq!(r.rows().len(), 3);

        let out = output(r);
        assert!(out.contains("\x1b[2K\rsha256:aaaab: step1\n"));
        let status_line = out
            .split("\x1b[2K\r")
            .find(|part| part.starts_with("s1: "))
            .unwrap()
            .to_string();
        let filled = status_line.chars().filter(|&c| c == escape::glyph::FILLED).count();
        let empty = status_line.chars().filter(|&c| c == escape::glyph::EMPTY).count();
        assert_eq!(filled, (filled + empty) / 2);
        assert!(out.ends_with("hello\n"));
        assert!(!out.contains("unnamed"));
    }

    #[test]
    fn test_trace_status_without_counts_shows_text_only() {
        let mut r = renderer();
        let batch = TraceBatch {
            statuses: vec![crate::progress::trace::TraceStatus {
                id: "s1".to_string(),
                name: "resolving".to_string(),
                current: "n/a".to_string(),
                total: "20".to_string(),
            }],
            ..TraceBatch::default()
        };
        r.apply(ProgressEvent::Trace(batch)).unwrap();
        assert_eq!(output(r), "\x1b[2K\rs1: resolving\n");
    }

    #[test]
    fn test_malformed_chunk_is_fatal() {
        let mut r = renderer();
        let err = r.apply_chunk(b"{\"status\":").unwrap_err();
        assert!(matches!(err, ProgressError::Json(_)));
    }
}
