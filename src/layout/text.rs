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

use std::fmt::Write;

use jiff::tz::TimeZone;

use crate::Error;
use crate::layout::Layout;
use crate::layout::format_time;
use crate::record::Record;

/// A logfmt-style text layout for formatting log records.
///
/// Output format:
///
/// ```text
/// timestamp=2024-08-11T22:44:57.172051+08:00 level=ERROR excerpt="disk full…" message="disk full\nwhile writing /var/lib/db"
/// timestamp=2024-08-11T22:44:57.172187+08:00 level=INFO excerpt=_EMPTY_ message= request=42
/// ```
///
/// Values containing spaces, `=`, `"` or control characters are quoted and escaped. Keys
/// containing any of those are rejected.
///
/// # Examples
///
/// ```
/// use plog::layout::TextLayout;
///
/// let text_layout = TextLayout::default();
/// ```
#[derive(Default, Debug, Clone)]
pub struct TextLayout {
    tz: Option<TimeZone>,
}

impl TextLayout {
    /// Sets the timezone for timestamps.
    ///
    /// # Examples
    ///
    /// ```
    /// use jiff::tz::TimeZone;
    /// use plog::layout::TextLayout;
    ///
    /// let text_layout = TextLayout::default().timezone(TimeZone::UTC);
    /// ```
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = Some(tz);
        self
    }
}

fn needs_quoting(c: char) -> bool {
    matches!(c, ' ' | '=' | '"') || c.is_control()
}

fn encode_key_value(text: &mut String, key: &str, value: &str) -> Result<(), Error> {
    if key.is_empty() || key.contains(needs_quoting) {
        return Err(Error::new("key contains special chars")
            .with_context("layout", "text")
            .with_context("key", key.escape_debug()));
    }

    if !text.is_empty() {
        text.push(' ');
    }
    if value.contains(needs_quoting) {
        write!(text, "{key}=\"{}\"", value.escape_debug())?;
    } else {
        write!(text, "{key}={value}")?;
    }
    Ok(())
}

impl Layout for TextLayout {
    fn format(&self, record: &Record, out: &mut Vec<u8>) -> Result<(), Error> {
        let keys = record.keys();
        let mut text = String::new();

        if !keys.time.is_empty() {
            let time = format_time(record.time(), self.tz.as_ref());
            encode_key_value(&mut text, &keys.time, &time)?;
        }
        if !keys.level.is_empty() {
            encode_key_value(&mut text, &keys.level, record.level().as_str())?;
        }

        let mut value = String::new();
        for (key, v) in record.fields() {
            value.clear();
            write!(&mut value, "{v}")?;
            encode_key_value(&mut text, key, &value)?;
        }

        out.extend_from_slice(text.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use jiff::Timestamp;
    use log::Level;

    use super::*;
    use crate::Value;
    use crate::record::Keys;

    fn format(keys: &Keys, fields: &BTreeMap<String, Value>) -> Result<String, Error> {
        let time = Timestamp::new(1_723_387_497, 172_051_000).unwrap();
        let record = Record::new(time, Level::Info, keys, fields);
        let mut out = vec![];
        TextLayout::default()
            .timezone(TimeZone::UTC)
            .format(&record, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_text_layout() {
        let mut fields = BTreeMap::new();
        fields.insert("message".to_owned(), Value::from("disk full\nretrying"));
        fields.insert("excerpt".to_owned(), Value::from("disk full retrying"));
        fields.insert("attempt".to_owned(), Value::from(3u8));
        fields.insert("path".to_owned(), Value::from("/var/lib/db"));

        insta::assert_snapshot!(
            format(&Keys::default(), &fields).unwrap(),
            @r#"timestamp=2024-08-11T14:44:57.172051+00:00 level=INFO attempt=3 excerpt="disk full retrying" message="disk full\nretrying" path=/var/lib/db"#
        );
    }

    #[test]
    fn test_text_layout_rejects_bad_key() {
        let mut fields = BTreeMap::new();
        fields.insert("bad key".to_owned(), Value::from(1));

        let err = format(&Keys::default(), &fields).unwrap_err();
        assert_eq!(err.message(), "key contains special chars");
        assert_eq!(err.context("key"), Some("bad key"));
    }

    #[test]
    fn test_text_layout_without_time() {
        let keys = Keys {
            time: String::new(),
            ..Keys::default()
        };
        let mut fields = BTreeMap::new();
        fields.insert("message".to_owned(), Value::from(""));
        fields.insert("quote".to_owned(), Value::from(r#"say "hi""#));

        assert_eq!(
            format(&keys, &fields).unwrap(),
            r#"level=INFO message= quote="say \"hi\"""#
        );
    }
}
