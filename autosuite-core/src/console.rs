//! Console streams used by the recorder
//!
//! The recorder echoes results to an output stream, tracebacks to an error
//! stream, and reads verdicts from an input stream. [`Console::stdio`] binds
//! these to the process streams; [`SharedInput`] and [`SharedBuffer`] let a
//! caller script the input and inspect what was written.

use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::sync::{Arc, Mutex, PoisonError};

use crate::record::Response;

/// Input, output and error streams of an interactive session
pub struct Console {
    input: Box<dyn BufRead + Send>,
    output: Box<dyn Write + Send>,
    error: Box<dyn Write + Send>,
}

impl Console {
    /// Bind to the process's standard streams
    pub fn stdio() -> Self {
        Self {
            input: Box::new(BufReader::new(io::stdin())),
            output: Box::new(io::stdout()),
            error: Box::new(io::stderr()),
        }
    }

    /// Bind to arbitrary streams
    pub fn new(
        input: impl BufRead + Send + 'static,
        output: impl Write + Send + 'static,
        error: impl Write + Send + 'static,
    ) -> Self {
        Self {
            input: Box::new(input),
            output: Box::new(output),
            error: Box::new(error),
        }
    }

    /// Write a line to the output stream
    pub fn echo(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{}", text)?;
        self.output.flush()
    }

    /// Write text to the error stream as-is
    pub fn echo_error(&mut self, text: &str) -> io::Result<()> {
        self.error.write_all(text.as_bytes())?;
        self.error.flush()
    }

    /// Ask until a valid answer arrives.
    ///
    /// The prompt is repeated for every line that is empty or starts with
    /// anything other than `y`, `n` or `c`. End of input counts as a cancel.
    pub fn ask(&mut self, prompt: &str) -> io::Result<Response> {
        let mut line = String::new();
        loop {
            write!(self.output, "{}", prompt)?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(Response::Cancel);
            }
            if let Some(response) = Response::parse(&line) {
                return Ok(response);
            }
        }
    }

    /// Read one raw line, or `None` at end of input
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    /// Write text to the output stream without a trailing newline
    pub fn write(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes())?;
        self.output.flush()
    }
}

/// A cloneable in-memory sink whose contents can be read back
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock().unwrap_or_else(PoisonError::into_inner)).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A cloneable scripted input that hands out at most one line per read,
/// so unread lines stay observable through [`SharedInput::remaining`]
#[derive(Debug, Clone, Default)]
pub struct SharedInput {
    bytes: Arc<Mutex<VecDeque<u8>>>,
}

impl SharedInput {
    pub fn new(script: &str) -> Self {
        Self {
            bytes: Arc::new(Mutex::new(script.bytes().collect())),
        }
    }

    /// Input not yet consumed
    pub fn remaining(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes.iter().copied().collect::<Vec<u8>>()).into_owned()
    }

    /// Wrap in a line reader suitable for [`Console::new`]
    pub fn reader(&self) -> BufReader<SharedInput> {
        BufReader::new(self.clone())
    }
}

impl Read for SharedInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        let line_len = bytes
            .iter()
            .position(|&b| b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(bytes.len());
        let count = line_len.min(buf.len());
        for (slot, byte) in buf.iter_mut().zip(bytes.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scripted(script: &str) -> (Console, SharedInput, SharedBuffer) {
        let input = SharedInput::new(script);
        let output = SharedBuffer::new();
        let console = Console::new(input.reader(), output.clone(), io::sink());
        (console, input, output)
    }

    #[test]
    fn test_ask_reprompts_until_valid() {
        let (mut console, input, output) = scripted("\nmaybe\n  Yes\n  no thanks\ny\n");
        assert_eq!(console.ask("ok? ").unwrap(), Response::No);
        assert_eq!(output.contents(), "ok? ok? ok? ok? ");
        assert_eq!(input.remaining(), "y\n");
    }

    #[test]
    fn test_ask_at_end_of_input_cancels() {
        let (mut console, _, _) = scripted("what\n");
        assert_eq!(console.ask("ok? ").unwrap(), Response::Cancel);
    }

    #[test]
    fn test_shared_input_reads_line_at_a_time() {
        let input = SharedInput::new("a\nb\n");
        let mut reader = input.reader();
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        assert_eq!(line, "a\n");
        assert_eq!(input.remaining(), "b\n");
    }
}
