//! MBOX archive reader
//!
//! Byte-oriented so that messages in legacy 8-bit charsets never abort a
//! pass. Messages start at lines beginning with `From `; the separator line
//! itself is not part of the message.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::{Result, SpamError};

/// A message from an MBOX file
#[derive(Debug)]
pub struct MboxMessage {
    /// Sender from the From_ line
    pub from: String,
    /// Raw message content (headers + body)
    pub content: Vec<u8>,
}

/// MBOX reader yielding raw messages
pub struct MboxReader<R: Read> {
    reader: BufReader<R>,
    current_line: Vec<u8>,
    message_count: u64,
    eof: bool,
    /// The next From_ line was already consumed into current_line
    has_pending_from: bool,
}

impl MboxReader<File> {
    /// Open an mbox file; a missing file is reported immediately
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SpamError::MailboxNotFound(path.display().to_string()),
            _ => SpamError::Io(e),
        })?;
        Ok(Self::new(file))
    }
}

impl<R: Read> MboxReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            current_line: Vec::new(),
            message_count: 0,
            eof: false,
            has_pending_from: false,
        }
    }

    /// Read the next message from the MBOX file
    pub fn read_message(&mut self) -> Result<Option<MboxMessage>> {
        if self.eof {
            return Ok(None);
        }

        if !self.has_pending_from {
            // Skip anything before the first From_ line
            loop {
                self.current_line.clear();
                let bytes_read = self.reader.read_until(b'\n', &mut self.current_line)?;

                if bytes_read == 0 {
                    self.eof = true;
                    return Ok(None);
                }

                if self.current_line.starts_with(b"From ") {
                    break;
                }
            }
        }

        self.has_pending_from = false;

        let from = parse_from_line(&self.current_line);
        let mut content = Vec::new();

        loop {
            self.current_line.clear();
            let bytes_read = self.reader.read_until(b'\n', &mut self.current_line)?;

            if bytes_read == 0 {
                self.eof = true;
                break;
            }

            if self.current_line.starts_with(b"From ") {
                self.has_pending_from = true;
                break;
            }

            let line = if self.current_line.starts_with(b">From ") {
                &self.current_line[1..]
            } else {
                &self.current_line[..]
            };

            content.extend_from_slice(line);
        }

        // Drop the blank separator line(s) before the next From_
        while content.ends_with(b"\n\n") {
            content.pop();
        }

        self.message_count += 1;

        Ok(Some(MboxMessage { from, content }))
    }

    /// Number of messages read so far
    pub fn message_count(&self) -> u64 {
        self.message_count
    }
}

impl<R: Read> Iterator for MboxReader<R> {
    type Item = Result<MboxMessage>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_message() {
            Ok(Some(message)) => Some(Ok(message)),
            Ok(None) => None,
            Err(e) => {
                // A broken container ends the pass
                self.eof = true;
                Some(Err(e))
            }
        }
    }
}

/// Sender address from a `From sender@example.com Wed Dec 25 12:00:00 2024` line
fn parse_from_line(line: &[u8]) -> String {
    String::from_utf8_lossy(line)
        .trim_end()
        .split(' ')
        .nth(1)
        .unwrap_or_default()
        .to_string()
}
