//! Output sinks.
//!
//! The renderer delivers every rendered line as one `append` call ending in
//! `\n`. A sink error aborts the current `write`/`flush` and is returned to
//! the caller unchanged.

use std::io::{self, Stdout, Write};

/// Receives rendered output in emission order.
pub trait Sink {
    fn append(&mut self, text: &str) -> io::Result<()>;
}

impl Sink for String {
    fn append(&mut self, text: &str) -> io::Result<()> {
        self.push_str(text);
        Ok(())
    }
}

/// Collects each fragment separately.
impl Sink for Vec<String> {
    fn append(&mut self, text: &str) -> io::Result<()> {
        self.push(text.to_string());
        Ok(())
    }
}

impl<F> Sink for F
where
    F: FnMut(&str) -> io::Result<()>,
{
    fn append(&mut self, text: &str) -> io::Result<()> {
        self(text)
    }
}

/// Adapts any [`Write`] into a sink.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl WriterSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl Default for WriterSink<Stdout> {
    fn default() -> Self {
        Self::stdout()
    }
}

impl<W: Write> Sink for WriterSink<W> {
    fn append(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes())?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_sink() {
        let mut sink = String::new();
        sink.append("a\n").unwrap();
        sink.append("b\n").unwrap();
        assert_eq!(sink, "a\nb\n");
    }

    #[test]
    fn test_closure_sink_propagates_errors() {
        let mut sink = |_: &str| -> io::Result<()> { Err(io::Error::other("closed")) };
        assert!(sink.append("x").is_err());
    }

    #[test]
    fn test_writer_sink() {
        let mut sink = WriterSink::new(Vec::new());
        sink.append("hello\n").unwrap();
        assert_eq!(sink.into_inner(), b"hello\n");
    }
}
