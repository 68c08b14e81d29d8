//! Output sinks

use std::io;

/// Append-only text destination of the encoder
pub trait OutputSink {
	/// Append `text`
	fn write(&mut self, text: &str) -> io::Result<()>;
}

impl OutputSink for String {
	fn write(&mut self, text: &str) -> io::Result<()> {
		self.push_str(text);
		Ok(())
	}
}

/// Sink over any [`io::Write`], e.g. a response body or a file
///
/// # Examples
///
/// ```
/// use reinhardt_resume_core::serialize::{IoSink, OutputSink};
///
/// let mut sink = IoSink::new(Vec::new());
/// sink.write("[1]").unwrap();
/// assert_eq!(sink.into_inner(), b"[1]");
/// ```
#[derive(Debug)]
pub struct IoSink<W: io::Write> {
	inner: W,
}

impl<W: io::Write> IoSink<W> {
	/// Wrap a writer
	pub fn new(inner: W) -> Self {
		Self { inner }
	}

	/// The wrapped writer
	pub fn into_inner(self) -> W {
		self.inner
	}
}

impl<W: io::Write> OutputSink for IoSink<W> {
	fn write(&mut self, text: &str) -> io::Result<()> {
		self.inner.write_all(text.as_bytes())
	}
}
