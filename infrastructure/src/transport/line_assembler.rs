//! Byte-safe line assembly.
//!
//! Transports deliver bytes in arbitrary chunks: a chunk may end in the
//! middle of a line or in the middle of a multi-byte UTF-8 character.
//! [`LineAssembler`] keeps two tails (undecoded bytes and undelimited text)
//! so that splitting the input differently never changes the output.

/// Reassembles `\n`-delimited lines from a chunked byte stream
#[derive(Debug, Default)]
pub struct LineAssembler {
    /// Trailing bytes of an incomplete UTF-8 sequence
    bytes: Vec<u8>,
    /// Decoded text after the last newline
    text: String,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every line it completed.
    ///
    /// Lines are returned without their terminator (`\n` or `\r\n`).
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.bytes.extend_from_slice(chunk);
        self.decode_bytes();
        self.take_lines()
    }

    /// End of input: return the unterminated last line, if any.
    ///
    /// A partial character still waiting for its continuation bytes is
    /// discarded.
    pub fn finish(&mut self) -> Option<String> {
        self.bytes.clear();
        let rest = std::mem::take(&mut self.text);
        let rest = rest.strip_suffix('\r').map(str::to_string).unwrap_or(rest);
        (!rest.is_empty()).then_some(rest)
    }

    /// True when nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty() && self.text.is_empty()
    }

    /// Move the valid UTF-8 prefix of the byte tail into the text tail.
    ///
    /// Invalid sequences become U+FFFD; an incomplete trailing sequence
    /// stays behind for the next chunk.
    fn decode_bytes(&mut self) {
        loop {
            match std::str::from_utf8(&self.bytes) {
                Ok(valid) => {
                    self.text.push_str(valid);
                    self.bytes.clear();
                    return;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    self.text
                        .push_str(&String::from_utf8_lossy(&self.bytes[..valid_up_to]));
                    match e.error_len() {
                        Some(invalid) => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            self.bytes.drain(..valid_up_to + invalid);
                        }
                        None => {
                            self.bytes.drain(..valid_up_to);
                            return;
                        }
                    }
                }
            }
        }
    }

    fn take_lines(&mut self) -> Vec<String> {
        let Some(last_newline) = self.text.rfind('\n') else {
            return Vec::new();
        };
        let rest = self.text.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.text, rest);
        complete.lines().map(str::to_string).collect()
    }
}
