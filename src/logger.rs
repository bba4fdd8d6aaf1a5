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

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::io::Write;
use std::sync::Mutex;
use std::sync::PoisonError;

use jiff::Timestamp;
use log::Level;

use crate::Error;
use crate::Excerpt;
use crate::Layout;
use crate::Marks;
use crate::Value;
use crate::filter::Filter;
use crate::layout::JsonLayout;
use crate::pool::Pool;
use crate::record::Keys;
use crate::record::Record;
use crate::trap::DefaultTrap;
use crate::trap::Trap;

// target used for filtering records that do not come through the `log` facade
const DEFAULT_TARGET: &str = "plog";

/// A structured logger that writes one record per call to an output stream.
///
/// Every record carries the full message and an excerpt of it produced by the configured
/// [`Excerpt`], next to the level, the timestamp and any key-value fields.
///
/// # Examples
///
/// ```
/// use plog::Log;
/// use plog::Value;
///
/// let log = Log::builder().output(std::io::sink()).build();
/// log.info("user signed in", &[("user", Value::from("alice"))]).unwrap();
/// ```
pub struct Log {
    output: Mutex<Box<dyn Write + Send>>,
    layout: Box<dyn Layout>,
    filter: Filter,
    excerpt: Excerpt,
    keys: Keys,
    fields: Vec<(String, Value)>,
    level: Level,
    trap: Box<dyn Trap>,
    buffers: Pool<Vec<u8>>,
    maps: Pool<BTreeMap<String, Value>>,
}

impl fmt::Debug for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Log")
            .field("layout", &self.layout)
            .field("filter", &self.filter)
            .field("excerpt", &self.excerpt)
            .field("keys", &self.keys)
            .field("fields", &self.fields)
            .field("level", &self.level)
            .field("trap", &self.trap)
            .finish_non_exhaustive()
    }
}

impl Log {
    /// Create a [`LogBuilder`] with the default configuration.
    pub fn builder() -> LogBuilder {
        LogBuilder::default()
    }

    /// The excerpt configuration applied to every message.
    pub fn excerpt(&self) -> &Excerpt {
        &self.excerpt
    }

    /// Whether a record at `level` would be written.
    pub fn enabled(&self, level: Level) -> bool {
        self.filter.enabled(level, DEFAULT_TARGET)
    }

    /// Write a record for `msg` at `level` with the given fields.
    ///
    /// Records rejected by the filter are silently dropped.
    pub fn log(&self, level: Level, msg: &[u8], fields: &[(&str, Value)]) -> Result<(), Error> {
        if !self.enabled(level) {
            return Ok(());
        }
        let fields = fields.iter().map(|(k, v)| (*k, v.clone()));
        self.write_record(level, msg, fields)
    }

    /// Write a record at [`Level::Error`].
    pub fn error(&self, msg: impl AsRef<[u8]>, fields: &[(&str, Value)]) -> Result<(), Error> {
        self.log(Level::Error, msg.as_ref(), fields)
    }

    /// Write a record at [`Level::Warn`].
    pub fn warn(&self, msg: impl AsRef<[u8]>, fields: &[(&str, Value)]) -> Result<(), Error> {
        self.log(Level::Warn, msg.as_ref(), fields)
    }

    /// Write a record at [`Level::Info`].
    pub fn info(&self, msg: impl AsRef<[u8]>, fields: &[(&str, Value)]) -> Result<(), Error> {
        self.log(Level::Info, msg.as_ref(), fields)
    }

    /// Write a record at [`Level::Debug`].
    pub fn debug(&self, msg: impl AsRef<[u8]>, fields: &[(&str, Value)]) -> Result<(), Error> {
        self.log(Level::Debug, msg.as_ref(), fields)
    }

    /// Write a record at [`Level::Trace`].
    pub fn trace(&self, msg: impl AsRef<[u8]>, fields: &[(&str, Value)]) -> Result<(), Error> {
        self.log(Level::Trace, msg.as_ref(), fields)
    }

    /// Flush the output stream.
    pub fn flush(&self) -> Result<(), Error> {
        let mut output = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        output.flush().map_err(Error::from_io_error)
    }

    /// Set up the global logger of the `log` facade with this [`Log`].
    ///
    /// # Errors
    ///
    /// This function will fail if another global logger is already installed.
    pub fn try_apply(self) -> Result<(), log::SetLoggerError> {
        let max_level = self.filter.max_level();
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(max_level);
        Ok(())
    }

    /// Set up the global logger of the `log` facade with this [`Log`].
    ///
    /// # Panics
    ///
    /// This function will panic if another global logger is already installed.
    pub fn apply(self) {
        self.try_apply()
            .expect("Log::apply should not be called after the global logger initialized");
    }

    fn write_record<K>(
        &self,
        level: Level,
        msg: &[u8],
        fields: impl IntoIterator<Item = (K, Value)>,
    ) -> Result<(), Error>
    where
        K: Into<String>,
    {
        let keys = &self.keys;
        let mut map = self.maps.acquire();
        for (k, v) in &self.fields {
            map.insert(k.clone(), v.clone());
        }
        for (k, v) in fields {
            map.insert(k.into(), v);
        }

        if !keys.message.is_empty() {
            map.insert(keys.message.clone(), text_value(msg));
        }
        if !keys.excerpt.is_empty() {
            let mut excerpt = self.buffers.acquire();
            excerpt.reserve(self.excerpt.capacity_hint(msg));
            self.excerpt.excerpt(&mut excerpt, msg)?;
            map.insert(keys.excerpt.clone(), text_value(&excerpt));
        }

        let record = Record::new(Timestamp::now(), level, keys, &map);
        let mut line = self.buffers.acquire();
        self.layout.format(&record, &mut line)?;
        line.push(b'\n');

        let mut output = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        output.write_all(&line).map_err(Error::from_io_error)
    }

    fn write_log_record(&self, record: &log::Record) -> Result<(), Error> {
        let mut msg = self.buffers.acquire();
        write!(&mut *msg, "{}", record.args()).map_err(Error::from_io_error)?;

        let mut collector = KvCollector { fields: vec![] };
        record.key_values().visit(&mut collector).map_err(|err| {
            Error::new("failed to collect key-values")
                .with_context("target", record.target())
                .with_source(err)
        })?;

        self.write_record(record.level(), &msg, collector.fields)
    }
}

// valid UTF-8 renders as a string, anything else as raw bytes
fn text_value(bytes: &[u8]) -> Value {
    match std::str::from_utf8(bytes) {
        Ok(s) => Value::from(s),
        Err(_) => Value::bytes(bytes),
    }
}

struct KvCollector {
    fields: Vec<(String, Value)>,
}

impl<'kvs> log::kv::VisitSource<'kvs> for KvCollector {
    fn visit_pair(
        &mut self,
        key: log::kv::Key<'kvs>,
        value: log::kv::Value<'kvs>,
    ) -> Result<(), log::kv::Error> {
        self.fields
            .push((key.as_str().to_owned(), Value::from_kv(&value)));
        Ok(())
    }
}

impl log::Log for Log {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.filter.enabled(metadata.level(), metadata.target())
    }

    fn log(&self, record: &log::Record) {
        if !log::Log::enabled(self, record.metadata()) {
            return;
        }
        if let Err(err) = self.write_log_record(record) {
            self.trap.trap(&err);
        }
    }

    fn flush(&self) {
        if let Err(err) = Log::flush(self) {
            self.trap.trap(&err);
        }
    }
}

/// Each call to `write` logs the whole buffer as one message at the default level.
impl Write for &Log {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.log(self.level, buf, &[]).map_err(io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Log::flush(self).map_err(io::Error::other)
    }
}

impl Write for Log {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Write::write(&mut &*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(&mut &*self)
    }
}

/// A builder for configuring a [`Log`].
///
/// # Examples
///
/// ```
/// use log::LevelFilter;
/// use plog::Log;
/// use plog::Marks;
/// use plog::layout::TextLayout;
///
/// let log = Log::builder()
///     .output(std::io::stderr())
///     .layout(TextLayout::default())
///     .filter(LevelFilter::Debug)
///     .trunc(80)
///     .marks(Marks::new("...", "<empty>", "<blank>"))
///     .replace("\t", " ")
///     .field("service", "billing")
///     .build();
/// ```
pub struct LogBuilder {
    output: Option<Box<dyn Write + Send>>,
    layout: Option<Box<dyn Layout>>,
    filter: Filter,
    excerpt: Excerpt,
    keys: Keys,
    fields: Vec<(String, Value)>,
    level: Level,
    trap: Option<Box<dyn Trap>>,
    max_idle: usize,
}

impl fmt::Debug for LogBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogBuilder")
            .field("layout", &self.layout)
            .field("filter", &self.filter)
            .field("excerpt", &self.excerpt)
            .field("keys", &self.keys)
            .field("fields", &self.fields)
            .field("level", &self.level)
            .field("max_idle", &self.max_idle)
            .finish_non_exhaustive()
    }
}

impl Default for LogBuilder {
    fn default() -> Self {
        Self {
            output: None,
            layout: None,
            filter: Filter::default(),
            excerpt: default_excerpt(),
            keys: Keys::default(),
            fields: vec![],
            level: Level::Info,
            trap: None,
            max_idle: 16,
        }
    }
}

fn default_excerpt() -> Excerpt {
    Excerpt::new()
        .with_trunc(120)
        .with_marks(Marks::new("…", "_EMPTY_", "_BLANK_"))
        .with_replace("\n", " ")
}

impl LogBuilder {
    /// Set the output stream. Default to stdout.
    pub fn output(mut self, output: impl Write + Send + 'static) -> Self {
        self.output = Some(Box::new(output));
        self
    }

    /// Set the layout. Default to [`JsonLayout`].
    pub fn layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    /// Set the filter. Default to [`log::LevelFilter::Info`].
    pub fn filter(mut self, filter: impl Into<Filter>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Replace the whole excerpt configuration.
    ///
    /// The default keeps 120 runes, marks with `…`, `_EMPTY_` and `_BLANK_` and replaces newlines
    /// with spaces.
    pub fn excerpt(mut self, excerpt: Excerpt) -> Self {
        self.excerpt = excerpt;
        self
    }

    /// Set the rune limit of excerpts. Zero means unlimited.
    pub fn trunc(mut self, trunc: usize) -> Self {
        self.excerpt = self.excerpt.with_trunc(trunc);
        self
    }

    /// Set the excerpt marks.
    pub fn marks(mut self, marks: Marks) -> Self {
        self.excerpt = self.excerpt.with_marks(marks);
        self
    }

    /// Append an excerpt replacement pair.
    pub fn replace(
        mut self,
        pattern: impl Into<Vec<u8>>,
        replacement: impl Into<Vec<u8>>,
    ) -> Self {
        self.excerpt = self.excerpt.with_replace(pattern, replacement);
        self
    }

    /// Set the keys of the built-in fields.
    pub fn keys(mut self, keys: Keys) -> Self {
        self.keys = keys;
        self
    }

    /// Add a field written on every record.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    /// Set the level used by the [`Write`] implementation. Default to [`Level::Info`].
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set the trap for errors raised through the `log` facade. Default to [`DefaultTrap`].
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = Some(trap.into());
        self
    }

    /// Set how many scratch buffers and field maps are kept for reuse.
    pub fn max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    /// Build the [`Log`].
    pub fn build(self) -> Log {
        Log {
            output: Mutex::new(
                self.output
                    .unwrap_or_else(|| Box::new(io::stdout())),
            ),
            layout: self
                .layout
                .unwrap_or_else(|| Box::new(JsonLayout::default())),
            filter: self.filter,
            excerpt: self.excerpt,
            keys: self.keys,
            fields: self.fields,
            level: self.level,
            trap: self.trap.unwrap_or_else(|| Box::new(DefaultTrap::default())),
            buffers: Pool::new(self.max_idle),
            maps: Pool::new(self.max_idle),
        }
    }
}
