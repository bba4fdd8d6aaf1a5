// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;
use std::io;

/// The error type returned by plog operations.
///
/// An error carries a human readable message, an optional list of `key: value` context entries
/// describing where it happened, and the underlying causes.
pub struct Error {
    message: String,
    context: Vec<(&'static str, String)>,
    sources: Vec<anyhow::Error>,
}

impl Error {
    /// Create a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: vec![],
            sources: vec![],
        }
    }

    /// Attach a context entry to the error.
    pub fn with_context(mut self, key: &'static str, value: impl ToString) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    /// Attach an underlying cause to the error.
    pub fn with_source(mut self, src: impl Into<anyhow::Error>) -> Self {
        self.sources.push(src.into());
        self
    }

    /// The message of this error, without context and sources.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Look up a context entry by key.
    pub fn context(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Return an iterator over all sources of this error.
    pub fn sources(&self) -> impl ExactSizeIterator<Item = &(dyn std::error::Error + 'static)> {
        self.sources.iter().map(|v| v.as_ref())
    }

    /// Wrap an [`io::Error`] raised while writing a record.
    pub fn from_io_error(err: io::Error) -> Error {
        Error::new("failed to write log record").with_source(err)
    }

    /// Wrap a [`fmt::Error`] raised while rendering a record.
    pub fn from_fmt_error(err: fmt::Error) -> Error {
        Error::new("failed to format log record").with_source(err)
    }

    /// Wrap a [`serde_json::Error`] raised while encoding a record.
    pub fn from_json_error(err: serde_json::Error) -> Error {
        Error::new("failed to encode log record as json").with_source(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;

        if !self.context.is_empty() {
            f.write_str(", context: { ")?;
            for (i, (k, v)) in self.context.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{k}: {v}")?;
            }
            f.write_str(" }")?;
        }

        if !self.sources.is_empty() {
            f.write_str(", sources: [")?;
            for (i, source) in self.sources.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{source}")?;
            }
            f.write_str("]")?;
        }

        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            return f
                .debug_struct("Error")
                .field("message", &self.message)
                .field("context", &self.context)
                .field("sources", &self.sources)
                .finish();
        }

        writeln!(f, "{}", self.message)?;
        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "Context:")?;
            for (k, v) in &self.context {
                writeln!(f, "   {k}: {v}")?;
            }
        }
        if !self.sources.is_empty() {
            writeln!(f)?;
            writeln!(f, "Sources:")?;
            for source in &self.sources {
                writeln!(f, "   {source:#}")?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.sources.first().map(|v| v.as_ref())
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::from_io_error(err)
    }
}

impl From<fmt::Error> for Error {
    fn from(err: fmt::Error) -> Self {
        Error::from_fmt_error(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::from_json_error(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_context_and_sources() {
        let err = Error::new("failed to format log record")
            .with_context("key", "bad key")
            .with_context("layout", "text")
            .with_source(anyhow::anyhow!("key contains special chars"));

        assert_eq!(
            err.to_string(),
            "failed to format log record, context: { key: bad key, layout: text }, sources: [key contains special chars]"
        );
        assert_eq!(err.context("layout"), Some("text"));
        assert_eq!(err.context("missing"), None);
        assert_eq!(err.sources().len(), 1);
    }

    #[test]
    fn test_io_error_is_source() {
        let err = Error::from(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
        assert_eq!(err.message(), "failed to write log record");
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("pipe closed"));
    }
}
