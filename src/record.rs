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

//! Log records and the keys they are written under.

use std::collections::BTreeMap;

use jiff::Timestamp;
use log::Level;

use crate::Value;

/// The keys of the fields every record carries.
///
/// An empty key omits the corresponding field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keys {
    /// Key of the record timestamp. Default: `timestamp`.
    pub time: String,
    /// Key of the record level. Default: `level`.
    pub level: String,
    /// Key of the full message. Default: `message`.
    pub message: String,
    /// Key of the message excerpt. Default: `excerpt`.
    pub excerpt: String,
}

impl Default for Keys {
    fn default() -> Self {
        Self {
            time: "timestamp".to_owned(),
            level: "level".to_owned(),
            message: "message".to_owned(),
            excerpt: "excerpt".to_owned(),
        }
    }
}

/// A log record ready to be formatted by a [`Layout`](crate::Layout).
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    time: Timestamp,
    level: Level,
    keys: &'a Keys,
    fields: &'a BTreeMap<String, Value>,
}

impl<'a> Record<'a> {
    /// Create a record.
    pub fn new(
        time: Timestamp,
        level: Level,
        keys: &'a Keys,
        fields: &'a BTreeMap<String, Value>,
    ) -> Self {
        Self {
            time,
            level,
            keys,
            fields,
        }
    }

    /// The observed time.
    pub fn time(&self) -> Timestamp {
        self.time
    }

    /// The verbosity level of the record.
    pub fn level(&self) -> Level {
        self.level
    }

    /// The keys the record is written under.
    pub fn keys(&self) -> &'a Keys {
        self.keys
    }

    /// The fields of the record, message and excerpt included, sorted by key.
    ///
    /// Fields shadowed by the time or level key are skipped.
    pub fn fields(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + use<'a> {
        let keys = self.keys;
        self.fields
            .iter()
            .filter(move |(k, _)| **k != keys.time && **k != keys.level)
            .map(|(k, v)| (k.as_str(), v))
    }
}
