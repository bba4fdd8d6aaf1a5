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

//! Level filtering for log records.

use std::borrow::Cow;

pub use env_filter::Builder as EnvFilterBuilder;
use log::Level;
use log::LevelFilter;
use log::Metadata;

const DEFAULT_FILTER_ENV: &str = "RUST_LOG";

/// Decides whether a record of a given level and target is written.
#[derive(Debug)]
pub enum Filter {
    /// Accept every level up to and including the given one.
    Level(LevelFilter),
    /// An env_logger style directive filter.
    Env(EnvFilter),
}

impl Default for Filter {
    fn default() -> Self {
        Filter::Level(LevelFilter::Info)
    }
}

impl Filter {
    /// Whether a record at `level` for `target` passes the filter.
    pub fn enabled(&self, level: Level, target: &str) -> bool {
        match self {
            Filter::Level(max) => level <= *max,
            Filter::Env(filter) => filter.enabled(level, target),
        }
    }

    /// The most verbose level that can pass the filter.
    pub fn max_level(&self) -> LevelFilter {
        match self {
            Filter::Level(max) => *max,
            Filter::Env(filter) => filter.0.filter(),
        }
    }
}

impl From<LevelFilter> for Filter {
    fn from(filter: LevelFilter) -> Self {
        Filter::Level(filter)
    }
}

impl From<Level> for Filter {
    fn from(level: Level) -> Self {
        Filter::Level(level.to_level_filter())
    }
}

impl From<EnvFilter> for Filter {
    fn from(filter: EnvFilter) -> Self {
        Filter::Env(filter)
    }
}

impl From<&str> for Filter {
    fn from(spec: &str) -> Self {
        Filter::Env(EnvFilter::from(spec))
    }
}

/// A filter that respects the `RUST_LOG` environment variable.
///
/// Read [the `env_logger` documentation](https://docs.rs/env_logger/#enabling-logging) for the
/// directive syntax.
#[derive(Debug)]
pub struct EnvFilter(env_filter::Filter);

impl EnvFilter {
    /// Initializes the filter from the `RUST_LOG` environment variable.
    ///
    /// # Examples
    ///
    /// ```
    /// use plog::filter::EnvFilter;
    /// let filter = EnvFilter::from_default_env();
    /// ```
    pub fn from_default_env() -> Self {
        EnvFilter::from_env(DEFAULT_FILTER_ENV)
    }

    /// Initializes the filter from the `RUST_LOG` environment variable, or from `default` if the
    /// variable is not set.
    ///
    /// # Examples
    ///
    /// ```
    /// use plog::filter::EnvFilter;
    /// let filter = EnvFilter::from_default_env_or("info");
    /// ```
    pub fn from_default_env_or<'a, V>(default: V) -> Self
    where
        V: Into<Cow<'a, str>>,
    {
        EnvFilter::from_env_or(DEFAULT_FILTER_ENV, default)
    }

    /// Initializes the filter from the environment variable `name`.
    ///
    /// An unset variable yields a filter that rejects everything.
    pub fn from_env<'a, E>(name: E) -> Self
    where
        E: Into<Cow<'a, str>>,
    {
        let mut builder = EnvFilterBuilder::new();
        if let Ok(spec) = std::env::var(&*name.into()) {
            builder.parse(&spec);
        }
        EnvFilter::new(builder)
    }

    /// Initializes the filter from the environment variable `name`, or from `default` if the
    /// variable is not set.
    pub fn from_env_or<'a, 'b, E, V>(name: E, default: V) -> Self
    where
        E: Into<Cow<'a, str>>,
        V: Into<Cow<'b, str>>,
    {
        let mut builder = EnvFilterBuilder::new();
        match std::env::var(&*name.into()) {
            Ok(spec) => builder.parse(&spec),
            Err(_) => builder.parse(&default.into()),
        };
        EnvFilter::new(builder)
    }

    /// Initializes the filter from an [`EnvFilterBuilder`].
    pub fn new(mut builder: EnvFilterBuilder) -> Self {
        EnvFilter(builder.build())
    }

    fn enabled(&self, level: Level, target: &str) -> bool {
        let metadata = Metadata::builder().level(level).target(target).build();
        self.0.enabled(&metadata)
    }
}

impl From<&str> for EnvFilter {
    fn from(spec: &str) -> Self {
        let mut builder = EnvFilterBuilder::new();
        builder.parse(spec);
        EnvFilter::new(builder)
    }
}

impl From<LevelFilter> for EnvFilter {
    fn from(level: LevelFilter) -> Self {
        let mut builder = EnvFilterBuilder::new();
        builder.filter_level(level);
        EnvFilter::new(builder)
    }
}
