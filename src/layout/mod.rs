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

//! Layouts for formatting log records.

use std::fmt;

use jiff::Timestamp;
use jiff::tz::TimeZone;

use crate::Error;
use crate::record::Record;

mod json;
mod text;

pub use self::json::JsonLayout;
pub use self::text::TextLayout;

/// A layout for formatting log records.
pub trait Layout: fmt::Debug + Send + Sync + 'static {
    /// Append the formatted record to `out`, without a trailing newline.
    fn format(&self, record: &Record, out: &mut Vec<u8>) -> Result<(), Error>;
}

impl<T: Layout> From<T> for Box<dyn Layout> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

// RFC 3339 with microseconds, in `tz` or the system time zone
fn format_time(time: Timestamp, tz: Option<&TimeZone>) -> String {
    let tz = match tz {
        Some(tz) => tz.clone(),
        None => TimeZone::system(),
    };
    time.to_zoned(tz)
        .strftime("%Y-%m-%dT%H:%M:%S.%6f%:z")
        .to_string()
}
