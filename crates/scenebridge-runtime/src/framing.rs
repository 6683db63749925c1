//! Length-prefix-free framing: a connection sends one JSON object per request,
//! with no delimiter and no length header. The scanner below tracks brace/bracket
//! nesting, string, and escape state byte-by-byte so the transport layer knows the
//! instant a complete JSON value has arrived, without parsing it twice.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// No complete JSON value yet; keep reading.
    NeedMore,
    /// A complete JSON value ends at byte offset `len` (exclusive) of the buffer
    /// scanned so far.
    Complete(usize),
    /// The buffer can never become valid JSON (e.g. started with an invalid byte).
    Invalid,
}

#[derive(Debug, Default, Clone)]
pub struct JsonFrameScanner {
    depth: i64,
    in_string: bool,
    escaped: bool,
    started: bool,
    scanned: usize,
}

impl JsonFrameScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed newly-read bytes in. `buffer` is the *entire* accumulated buffer so
    /// far (not just the new bytes); the scanner resumes from where it left off
    /// internally and returns the outcome for the buffer as a whole.
    pub fn scan(&mut self, buffer: &[u8]) -> ScanOutcome {
        while self.scanned < buffer.len() {
            let byte = buffer[self.scanned];
            self.scanned += 1;

            if !self.started {
                if byte.is_ascii_whitespace() {
                    continue;
                }
                if byte != b'{' && byte != b'[' {
                    return ScanOutcome::Invalid;
                }
                self.started = true;
            }

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                }
                continue;
            }

            match byte {
                b'"' => self.in_string = true,
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        return ScanOutcome::Complete(self.scanned);
                    }
                }
                _ => {}
            }
        }
        ScanOutcome::NeedMore
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
