//! Streaming script injection into HTML response bodies.
//!
//! [`ResponseInjector`] wraps a body reader and splices a `<script>` snippet
//! in right after the first `<head>` tag (ASCII case-insensitive). While
//! looking for the tag it holds back at most `window` bytes; if the tag has
//! not shown up by then, or the body ends first, the snippet goes at the
//! very start instead. After the splice every read is a straight
//! pass-through to the inner reader.

use std::io::{self, Read};

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use tracing::debug;

const HEAD_TAG: &str = "<head>";
const READ_CHUNK: usize = 8 * 1024;

/// Default look-ahead while searching for `<head>`.
pub const DEFAULT_HEAD_SEARCH_WINDOW: usize = 64 * 1024;

/// The `charset` parameter of a content type, if it names a known encoding.
pub fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        Encoding::for_label(value.trim().trim_matches('"').as_bytes())
    })
}

/// Declared charset, defaulting to UTF-8.
pub fn resolve_charset(content_type: Option<&str>) -> &'static Encoding {
    content_type
        .and_then(charset_from_content_type)
        .unwrap_or(UTF_8)
}

/// Encode text in `encoding`.
///
/// `encoding_rs` only encodes UTF-16 as UTF-8, so UTF-16 is handled here.
pub fn encode_text(text: &str, encoding: &'static Encoding) -> Vec<u8> {
    if encoding == UTF_16LE {
        text.encode_utf16().flat_map(u16::to_le_bytes).collect()
    } else if encoding == UTF_16BE {
        text.encode_utf16().flat_map(u16::to_be_bytes).collect()
    } else {
        encoding.encode(text).0.into_owned()
    }
}

fn code_unit_len(encoding: &'static Encoding) -> usize {
    if encoding == UTF_16LE || encoding == UTF_16BE {
        2
    } else {
        1
    }
}

/// The markup spliced into the document for a script.
///
/// Code is wrapped in `<script>` tags unless it already starts with one.
pub fn script_snippet(script: &str) -> String {
    let trimmed = script.trim_start();
    let tagged = trimmed
        .get(..7)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("<script"));
    if tagged {
        script.to_string()
    } else {
        format!("<script>{script}</script>")
    }
}

enum Phase {
    Searching,
    Flushing,
    PassThrough,
}

/// A reader that yields the inner body with a script snippet spliced in.
pub struct ResponseInjector<R> {
    inner: R,
    snippet: Vec<u8>,
    needle: Vec<u8>,
    unit: usize,
    window: usize,
    held: Vec<u8>,
    /// Offsets in `held` below this cannot start a match.
    scanned: usize,
    ready: Vec<u8>,
    ready_pos: usize,
    phase: Phase,
}

impl<R: Read> ResponseInjector<R> {
    pub fn new(inner: R, script: &str, encoding: &'static Encoding) -> Self {
        Self::with_window(inner, script, encoding, DEFAULT_HEAD_SEARCH_WINDOW)
    }

    pub fn with_window(
        inner: R,
        script: &str,
        encoding: &'static Encoding,
        window: usize,
    ) -> Self {
        Self {
            inner,
            snippet: encode_text(&script_snippet(script), encoding),
            needle: encode_text(HEAD_TAG, encoding),
            unit: code_unit_len(encoding),
            window: window.max(1),
            held: Vec::new(),
            scanned: 0,
            ready: Vec::new(),
            ready_pos: 0,
            phase: Phase::Searching,
        }
    }

    fn find_head(&mut self) -> Option<usize> {
        let n = self.needle.len();
        let limit = self.held.len().min(self.window);
        let mut i = self.scanned;
        while i + n <= limit {
            if self.held[i..i + n].eq_ignore_ascii_case(&self.needle) {
                return Some(i);
            }
            i += self.unit;
        }
        self.scanned = i;
        None
    }

    /// Move held bytes to the output buffer with the snippet at `at`
    /// (an offset into `held`), or at the start when `None`.
    fn splice(&mut self, at: Option<usize>) {
        let held = std::mem::take(&mut self.held);
        let at = at.unwrap_or(0);
        let mut ready = Vec::with_capacity(held.len() + self.snippet.len());
        ready.extend_from_slice(&held[..at]);
        ready.extend_from_slice(&self.snippet);
        ready.extend_from_slice(&held[at..]);
        self.ready = ready;
        self.ready_pos = 0;
        self.phase = Phase::Flushing;
    }

    fn search(&mut self) -> io::Result<()> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let n = self.inner.read(&mut chunk)?;
            if n == 0 {
                debug!(held = self.held.len(), "no <head> before end of body");
                self.splice(None);
                return Ok(());
            }
            self.held.extend_from_slice(&chunk[..n]);
            if let Some(start) = self.find_head() {
                self.splice(Some(start + self.needle.len()));
                return Ok(());
            }
            if self.held.len() >= self.window {
                debug!(window = self.window, "no <head> within search window");
                self.splice(None);
                return Ok(());
            }
        }
    }
}

impl<R: Read> Read for ResponseInjector<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            match self.phase {
                Phase::Searching => self.search()?,
                Phase::Flushing => {
                    let remaining = &self.ready[self.ready_pos..];
                    if remaining.is_empty() {
                        self.ready = Vec::new();
                        self.phase = Phase::PassThrough;
                        continue;
                    }
                    let n = remaining.len().min(buf.len());
                    buf[..n].copy_from_slice(&remaining[..n]);
                    self.ready_pos += n;
                    return Ok(n);
                }
                Phase::PassThrough => return self.inner.read(buf),
            }
        }
    }
}
