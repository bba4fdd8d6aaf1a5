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

//! plog is a small structured logger that writes one record per call, carrying both the full
//! message and a short excerpt of it.
//!
//! # Overview
//!
//! A [`Log`] assembles each record from its static fields, the fields of the call, the level, the
//! timestamp, the raw message and the message [`Excerpt`]: the message trimmed of surrounding
//! whitespace, capped at a number of runes, rewritten by replacement pairs and tagged with
//! [`Marks`] when it was truncated, empty or blank. Records are formatted by a [`Layout`] (JSON by
//! default) and written to an output stream.
//!
//! # Examples
//!
//! ```
//! use plog::Log;
//! use plog::Value;
//!
//! let log = Log::builder().output(std::io::sink()).trunc(16).build();
//!
//! log.warn(
//!     "  connection reset by peer\nretrying in 5s",
//!     &[("attempt", Value::from(2))],
//! )
//! .unwrap();
//! ```
//!
//! The [`Log`] also bridges the `log` facade:
//!
//! ```no_run
//! plog::Log::builder().build().apply();
//!
//! log::info!(user = "alice"; "signed in");
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod filter;
pub mod layout;
pub mod pool;
pub mod trap;

mod error;
mod excerpt;
mod logger;
mod record;
mod value;

pub use self::error::Error;
pub use self::excerpt::Excerpt;
pub use self::excerpt::Marks;
pub use self::filter::Filter;
pub use self::layout::Layout;
pub use self::logger::Log;
pub use self::logger::LogBuilder;
pub use self::record::Keys;
pub use self::record::Record;
pub use self::trap::Trap;
pub use self::value::Value;
