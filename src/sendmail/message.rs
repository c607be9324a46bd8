//! Message data structures and header parsing

use std::io::BufRead;

use crate::sendmail::error::{MessageLimits, SendmailError};
use crate::sendmail::headers::{HeaderBlock, is_token_byte};

fn is_blank(b: &u8) -> bool {
    matches!(*b, b' ' | b'\t')
}

/// A message read from the input stream.
///
/// The header block is parsed eagerly; the body stays in the reader and is
/// consumed exactly once by whoever takes it.
#[derive(Debug)]
pub struct Message<R> {
    /// Parsed header fields
    headers: HeaderBlock,

    /// The rest of the input, positioned just after the blank separator line
    body: R,
}

impl<R: BufRead> Message<R> {
    /// Read the header block from `reader`.
    ///
    /// Lines may end in LF or CRLF. The block ends at the first empty line or
    /// at end of input; an input with no bytes at all is rejected. Field
    /// values are kept byte for byte, whatever their character set.
    pub fn read_from(mut reader: R) -> Result<Self, SendmailError> {
        let mut headers = HeaderBlock::new();
        let mut current: Option<(String, Vec<u8>)> = None;
        let mut line = Vec::new();
        let mut total = 0;

        loop {
            line.clear();
            let n = reader.read_until(b'\n', &mut line)?;
            if n == 0 {
                if total == 0 {
                    return Err(SendmailError::HeaderParse("empty message".to_string()));
                }
                break;
            }

            total += n;
            if total > MessageLimits::HEADER_BLOCK_MAX_SIZE {
                return Err(SendmailError::HeaderParse(format!(
                    "header block too large (max {} bytes)",
                    MessageLimits::HEADER_BLOCK_MAX_SIZE
                )));
            }

            let text = trim_line_ending(&line);
            if text.is_empty() {
                break;
            }

            if text.first().is_some_and(is_blank) {
                let Some((_, value)) = current.as_mut() else {
                    return Err(malformed("malformed initial header line", text));
                };
                let continuation = trim_blanks(text);
                if !continuation.is_empty() {
                    if !value.is_empty() {
                        value.push(b' ');
                    }
                    value.extend_from_slice(continuation);
                }
                continue;
            }

            if let Some((name, value)) = current.take() {
                headers.add(&name, value);
            }

            let Some(colon) = text.iter().position(|&b| b == b':') else {
                return Err(malformed("malformed header line", text));
            };
            let (name, value) = (&text[..colon], &text[colon + 1..]);
            if name.is_empty() || !name.iter().copied().all(is_token_byte) {
                return Err(malformed("malformed header line", text));
            }
            // Token bytes are ASCII
            let name = name.iter().copied().map(char::from).collect();
            current = Some((name, trim_blanks(value).to_vec()));
        }

        if let Some((name, value)) = current {
            headers.add(&name, value);
        }

        Ok(Self {
            headers,
            body: reader,
        })
    }
}

impl<R> Message<R> {
    pub fn headers(&self) -> &HeaderBlock {
        &self.headers
    }

    pub fn into_parts(self) -> (HeaderBlock, R) {
        (self.headers, self.body)
    }
}

fn malformed(what: &str, line: &[u8]) -> SendmailError {
    SendmailError::HeaderParse(format!("{what}: {:?}", String::from_utf8_lossy(line)))
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn trim_blanks(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !is_blank(b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !is_blank(b)).map_or(start, |i| i + 1);
    &bytes[start..end]
}
