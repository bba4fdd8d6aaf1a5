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

use jiff::tz::TimeZone;
use serde::Serialize;
use serde::ser::SerializeMap;

use crate::Error;
use crate::layout::Layout;
use crate::layout::format_time;
use crate::record::Record;

/// A JSON layout for formatting log records.
///
/// Output format:
///
/// ```json
/// {"timestamp":"2024-08-11T22:44:57.172051+08:00","level":"ERROR","excerpt":"disk full…","message":"disk full\nwhile writing /var/lib/db"}
/// {"timestamp":"2024-08-11T22:44:57.172187+08:00","level":"INFO","excerpt":"_EMPTY_","message":"","request":42}
/// ```
///
/// Fields other than the timestamp and level are sorted by key.
///
/// # Examples
///
/// ```
/// use plog::layout::JsonLayout;
///
/// let json_layout = JsonLayout::default();
/// ```
#[derive(Default, Debug, Clone)]
pub struct JsonLayout {
    tz: Option<TimeZone>,
}

impl JsonLayout {
    /// Sets the timezone for timestamps.
    ///
    /// # Examples
    ///
    /// ```
    /// use jiff::tz::TimeZone;
    /// use plog::layout::JsonLayout;
    ///
    /// let json_layout = JsonLayout::default().timezone(TimeZone::UTC);
    /// ```
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = Some(tz);
        self
    }
}

struct RecordLine<'a> {
    record: &'a Record<'a>,
    tz: Option<&'a TimeZone>,
}

impl Serialize for RecordLine<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let keys = self.record.keys();
        let mut map = serializer.serialize_map(None)?;
        if !keys.time.is_empty() {
            map.serialize_entry(&keys.time, &format_time(self.record.time(), self.tz))?;
        }
        if !keys.level.is_empty() {
            map.serialize_entry(&keys.level, self.record.level().as_str())?;
        }
        for (key, value) in self.record.fields() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Layout for JsonLayout {
    fn format(&self, record: &Record, out: &mut Vec<u8>) -> Result<(), Error> {
        let line = RecordLine {
            record,
            tz: self.tz.as_ref(),
        };
        serde_json::to_writer(&mut *out, &line)
            .map_err(|err| Error::from_json_error(err).with_context("layout", "json"))
    }
}
