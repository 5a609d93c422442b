//! RenderSession - Per-stream state of the renderer.

use quill_snippet::ExecutionResult;

use crate::table::Alignment;

/// Which block kind the renderer is inside. Exactly one is active.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    CodeBlock(OpenBlock),
    Table,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::CodeBlock(_) => "code_block",
            Self::Table => "table",
        }
    }
}

/// A fenced block that has not been closed yet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OpenBlock {
    pub tag: Option<String>,
    /// Id reserved at the opening fence for executable blocks
    pub id: Option<u64>,
    pub body: String,
}

/// A captured executable block.
///
/// Id and source never change once captured; running the block again only
/// replaces `result`.
#[derive(Debug, Clone)]
pub struct CapturedBlock {
    pub id: u64,
    pub tag: String,
    /// Block body with surrounding whitespace trimmed
    pub source: String,
    pub result: Option<ExecutionResult>,
}

/// Raw rows collected while in table mode.
#[derive(Debug, Clone, Default)]
pub struct TableBuffer {
    pub rows: Vec<String>,
    /// From the first separator row seen
    pub alignments: Vec<Alignment>,
}

impl TableBuffer {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.alignments.clear();
    }
}

/// Everything one stream mutates.
#[derive(Debug, Clone)]
pub struct RenderSession {
    /// Decoded text not yet terminated by a newline
    pub(crate) buffer: String,
    /// Trailing bytes of an incomplete UTF-8 sequence
    pub(crate) pending_bytes: Vec<u8>,
    pub(crate) mode: Mode,
    pub(crate) blank_run: usize,
    pub(crate) next_id: u64,
    pub(crate) blocks: Vec<CapturedBlock>,
    pub(crate) table: TableBuffer,
}

impl Default for RenderSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSession {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            pending_bytes: Vec::new(),
            mode: Mode::Normal,
            blank_run: 0,
            next_id: 1,
            blocks: Vec::new(),
            table: TableBuffer::default(),
        }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn blocks(&self) -> &[CapturedBlock] {
        &self.blocks
    }

    /// Text buffered since the last newline.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Hands out the next block id. Ids are never reused within a session.
    pub(crate) fn reserve_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn block_mut(&mut self, id: u64) -> Option<&mut CapturedBlock> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    /// Clears stream state. Captured blocks and the id counter survive.
    pub(crate) fn reset(&mut self) {
        self.buffer.clear();
        self.pending_bytes.clear();
        self.mode = Mode::Normal;
        self.blank_run = 0;
        self.table.clear();
    }

    /// Appends raw bytes, decoding every complete UTF-8 sequence.
    ///
    /// An incomplete sequence at the end stays pending for the next call.
    /// Invalid bytes become U+FFFD.
    pub(crate) fn push_bytes(&mut self, bytes: &[u8]) {
        self.pending_bytes.extend_from_slice(bytes);
        let mut consumed = 0;
        loop {
            match std::str::from_utf8(&self.pending_bytes[consumed..]) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    consumed = self.pending_bytes.len();
                    break;
                }
                Err(err) => {
                    let valid = consumed + err.valid_up_to();
                    if let Ok(text) = std::str::from_utf8(&self.pending_bytes[consumed..valid]) {
                        self.buffer.push_str(text);
                    }
                    match err.error_len() {
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            consumed = valid + len;
                        }
                        None => {
                            consumed = valid;
                            break;
                        }
                    }
                }
            }
        }
        self.pending_bytes.drain(..consumed);
    }

    /// Appends text, first resolving any pending bytes as invalid.
    pub(crate) fn push_str(&mut self, text: &str) {
        self.drain_pending_bytes();
        self.buffer.push_str(text);
    }

    /// Decodes leftover bytes lossily. Used before text input and at flush.
    pub(crate) fn drain_pending_bytes(&mut self) {
        if !self.pending_bytes.is_empty() {
            let bytes = std::mem::take(&mut self.pending_bytes);
            self.buffer.push_str(&String::from_utf8_lossy(&bytes));
        }
    }

    /// Removes and returns the next complete line, without its terminator.
    pub(crate) fn next_line(&mut self) -> Option<String> {
        let end = self.buffer.find('\n')?;
        let mut line: String = self.buffer.drain(..=end).collect();
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
        Some(line)
    }

    /// Removes and returns the unterminated remainder, if any.
    pub(crate) fn take_partial(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let mut line = std::mem::take(&mut self.buffer);
        if line.ends_with('\r') {
            line.pop();
        }
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lines_split_on_newline() {
        let mut session = RenderSession::new();
        session.push_str("one\r\ntwo\nthr");
        assert_eq!(session.next_line().as_deref(), Some("one"));
        assert_eq!(session.next_line().as_deref(), Some("two"));
        assert_eq!(session.next_line(), None);
        assert_eq!(session.pending(), "thr");
        assert_eq!(session.take_partial().as_deref(), Some("thr"));
        assert_eq!(session.take_partial(), None);
    }

    #[test]
    fn test_split_utf8_sequence_is_carried() {
        let bytes = "é→".as_bytes();
        let mut session = RenderSession::new();
        session.push_bytes(&bytes[..1]);
        assert_eq!(session.pending(), "");
        session.push_bytes(&bytes[1..3]);
        assert_eq!(session.pending(), "é");
        session.push_bytes(&bytes[3..]);
        assert_eq!(session.pending(), "é→");
    }

    #[test]
    fn test_invalid_bytes_become_replacement() {
        let mut session = RenderSession::new();
        session.push_bytes(b"a\xffb");
        assert_eq!(session.pending(), "a\u{FFFD}b");
    }

    #[test]
    fn test_dangling_bytes_resolved_before_text() {
        let mut session = RenderSession::new();
        session.push_bytes(&[0xE2, 0x86]);
        session.push_str("x");
        assert_eq!(session.pending(), "\u{FFFD}x");
    }

    #[test]
    fn test_ids_are_monotonic_across_reset() {
        let mut session = RenderSession::new();
        assert_eq!(session.reserve_id(), 1);
        session.reset();
        assert_eq!(session.reserve_id(), 2);
    }
}
