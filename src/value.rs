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

//! Values attached to log records.
//!
//! [`Value`] is a closed set of primitive kinds. Every kind knows how to render itself as text
//! ([`fmt::Display`]) and as JSON ([`serde::Serialize`]).

use std::borrow::Cow;
use std::fmt;
use std::fmt::Write as _;
use std::time::Duration;
use std::time::SystemTime;

use jiff::SignedDuration;
use jiff::Timestamp;
use serde::Serialize;
use serde::Serializer;

/// A value of a log record field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An absent value.
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    I128(i128),
    U128(u128),
    F32(f32),
    F64(f64),
    Complex64 { re: f32, im: f32 },
    Complex128 { re: f64, im: f64 },
    Str(String),
    /// Raw bytes, rendered as lossy UTF-8.
    Bytes(Vec<u8>),
    /// A sequence of runes, rendered as the string they spell.
    Runes(Vec<char>),
    Duration(SignedDuration),
    Timestamp(Timestamp),
    /// The rendered message of an error.
    Error(String),
    Array(Vec<Value>),
}

impl Value {
    /// Create a bytes value.
    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(value.into())
    }

    /// Create a runes value.
    pub fn runes(value: impl IntoIterator<Item = char>) -> Self {
        Value::Runes(value.into_iter().collect())
    }

    /// Create a single precision complex value.
    pub fn complex64(re: f32, im: f32) -> Self {
        Value::Complex64 { re, im }
    }

    /// Create a double precision complex value.
    pub fn complex128(re: f64, im: f64) -> Self {
        Value::Complex128 { re, im }
    }

    /// Create an error value from the message of `err`.
    pub fn error(err: &(dyn std::error::Error + 'static)) -> Self {
        Value::Error(err.to_string())
    }

    /// Convert a value of the `log` facade.
    pub fn from_kv(value: &log::kv::Value<'_>) -> Self {
        let mut visitor = KvValueVisitor(None);
        match value.visit(&mut visitor) {
            Ok(()) => visitor.0.unwrap_or(Value::Null),
            Err(_) => Value::Str(value.to_string()),
        }
    }

    /// Whether this value is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

struct KvValueVisitor(Option<Value>);

impl<'v> log::kv::VisitValue<'v> for KvValueVisitor {
    fn visit_any(&mut self, value: log::kv::Value) -> Result<(), log::kv::Error> {
        self.0 = Some(Value::Str(value.to_string()));
        Ok(())
    }

    fn visit_u64(&mut self, value: u64) -> Result<(), log::kv::Error> {
        self.0 = Some(Value::U64(value));
        Ok(())
    }

    fn visit_i64(&mut self, value: i64) -> Result<(), log::kv::Error> {
        self.0 = Some(Value::I64(value));
        Ok(())
    }

    fn visit_f64(&mut self, value: f64) -> Result<(), log::kv::Error> {
        self.0 = Some(Value::F64(value));
        Ok(())
    }

    fn visit_bool(&mut self, value: bool) -> Result<(), log::kv::Error> {
        self.0 = Some(Value::Bool(value));
        Ok(())
    }

    fn visit_str(&mut self, value: &str) -> Result<(), log::kv::Error> {
        self.0 = Some(Value::Str(value.to_owned()));
        Ok(())
    }

    fn visit_char(&mut self, value: char) -> Result<(), log::kv::Error> {
        self.0 = Some(Value::Str(value.to_string()));
        Ok(())
    }
}

fn fmt_float(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.is_nan() {
        f.write_str("NaN")
    } else if value.is_infinite() {
        f.write_str(if value > 0.0 { "+Inf" } else { "-Inf" })
    } else {
        write!(f, "{value}")
    }
}

fn fmt_complex(f: &mut fmt::Formatter<'_>, re: f64, im: f64) -> fmt::Result {
    f.write_str("(")?;
    fmt_float(f, re)?;
    if im.is_nan() || im.is_infinite() {
        // NaN and infinities carry their own sign
        if im.is_nan() {
            f.write_str("+")?;
        }
        fmt_float(f, im)?;
    } else {
        if !im.is_sign_negative() {
            f.write_str("+")?;
        }
        fmt_float(f, im)?;
    }
    f.write_str("i)")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::I128(v) => write!(f, "{v}"),
            Value::U128(v) => write!(f, "{v}"),
            // widening keeps the shortest f32 digits only when printed as f32
            Value::F32(v) if v.is_finite() => write!(f, "{v}"),
            Value::F32(v) => fmt_float(f, f64::from(*v)),
            Value::F64(v) => fmt_float(f, *v),
            Value::Complex64 { re, im } => {
                if re.is_finite() && im.is_finite() {
                    let sign = if im.is_sign_negative() { "" } else { "+" };
                    write!(f, "({re}{sign}{im}i)")
                } else {
                    fmt_complex(f, f64::from(*re), f64::from(*im))
                }
            }
            Value::Complex128 { re, im } => fmt_complex(f, *re, *im),
            Value::Str(v) => f.write_str(v),
            Value::Bytes(v) => f.write_str(&String::from_utf8_lossy(v)),
            Value::Runes(v) => {
                for c in v {
                    f.write_char(*c)?;
                }
                Ok(())
            }
            Value::Duration(v) => write!(f, "{v:#}"),
            Value::Timestamp(v) => write!(f, "{v}"),
            Value::Error(v) => f.write_str(v),
            Value::Array(vs) => {
                f.write_str("[")?;
                for (i, v) in vs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    fmt::Display::fmt(v, f)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::I64(v) => serializer.serialize_i64(*v),
            Value::U64(v) => serializer.serialize_u64(*v),
            Value::I128(v) => match i64::try_from(*v) {
                Ok(v) => serializer.serialize_i64(v),
                Err(_) => serializer.collect_str(v),
            },
            Value::U128(v) => match u64::try_from(*v) {
                Ok(v) => serializer.serialize_u64(v),
                Err(_) => serializer.collect_str(v),
            },
            Value::F32(v) if v.is_finite() => serializer.serialize_f32(*v),
            Value::F64(v) if v.is_finite() => serializer.serialize_f64(*v),
            Value::Str(v) => serializer.serialize_str(v),
            Value::Bytes(v) => serializer.serialize_str(&String::from_utf8_lossy(v)),
            Value::Array(vs) => serializer.collect_seq(vs),
            Value::F32(_)
            | Value::F64(_)
            | Value::Complex64 { .. }
            | Value::Complex128 { .. }
            | Value::Runes(_)
            | Value::Duration(_)
            | Value::Timestamp(_)
            | Value::Error(_) => serializer.collect_str(self),
        }
    }
}

macro_rules! impl_from {
    ($variant:ident: $($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value.into())
                }
            }
        )+
    };
}

impl_from!(Bool: bool);
impl_from!(I64: i8, i16, i32, i64);
impl_from!(U64: u8, u16, u32, u64);
impl_from!(I128: i128);
impl_from!(U128: u128);
impl_from!(F32: f32);
impl_from!(F64: f64);
impl_from!(Str: &str, String, Cow<'_, str>);
impl_from!(Duration: SignedDuration);
impl_from!(Timestamp: Timestamp);

impl From<isize> for Value {
    fn from(value: isize) -> Self {
        Value::I64(value as i64)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::U64(value as u64)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<Duration> for Value {
    fn from(value: Duration) -> Self {
        Value::Duration(SignedDuration::try_from(value).unwrap_or(SignedDuration::MAX))
    }
}

impl From<SystemTime> for Value {
    fn from(value: SystemTime) -> Self {
        match Timestamp::try_from(value) {
            Ok(ts) => Value::Timestamp(ts),
            Err(err) => Value::Error(err.to_string()),
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<Value>> From<&[T]> for Value {
    fn from(values: &[T]) -> Self {
        Value::Array(values.iter().cloned().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(value: impl Into<Value>) -> String {
        serde_json::to_string(&value.into()).unwrap()
    }

    fn text(value: impl Into<Value>) -> String {
        value.into().to_string()
    }

    #[test]
    fn test_text_rendering() {
        assert_eq!(text(true), "true");
        assert_eq!(text(-42i8), "-42");
        assert_eq!(text(u64::MAX), "18446744073709551615");
        assert_eq!(text(i128::MIN), "-170141183460469231731687303715884105728");
        assert_eq!(text(1.5f64), "1.5");
        assert_eq!(text(0.1f32), "0.1");
        assert_eq!(text(f64::NAN), "NaN");
        assert_eq!(text(f64::INFINITY), "+Inf");
        assert_eq!(text(f32::NEG_INFINITY), "-Inf");
        assert_eq!(text("hello"), "hello");
        assert_eq!(text(Value::bytes(&b"by\xfftes"[..])), "by\u{fffd}tes");
        assert_eq!(text(Value::runes("руны".chars())), "руны");
        assert_eq!(text(None::<i32>), "null");
        assert_eq!(text(vec![1, 2, 3]), "[1 2 3]");
    }

    #[test]
    fn test_complex_rendering() {
        assert_eq!(text(Value::complex128(1.0, 2.0)), "(1+2i)");
        assert_eq!(text(Value::complex128(1.5, -2.0)), "(1.5-2i)");
        assert_eq!(text(Value::complex64(0.0, 0.5)), "(0+0.5i)");
        assert_eq!(text(Value::complex128(1.0, f64::NAN)), "(1+NaNi)");
        assert_eq!(text(Value::complex128(f64::INFINITY, f64::NEG_INFINITY)), "(+Inf-Infi)");
    }

    #[test]
    fn test_time_rendering() {
        assert_eq!(text(Timestamp::UNIX_EPOCH), "1970-01-01T00:00:00Z");
        assert_eq!(text(SystemTime::UNIX_EPOCH), "1970-01-01T00:00:00Z");
        assert_eq!(text(Duration::from_millis(1500)), "1s 500ms");
        assert_eq!(json(Duration::from_secs(2)), r#""2s""#);
    }

    #[test]
    fn test_json_rendering() {
        assert_eq!(json(false), "false");
        assert_eq!(json(-7i64), "-7");
        assert_eq!(json(42u16), "42");
        assert_eq!(json(1i128 << 100), r#""1267650600228229401496703205376""#);
        assert_eq!(json(12u128), "12");
        assert_eq!(json(2.5f64), "2.5");
        assert_eq!(json(f64::NAN), r#""NaN""#);
        assert_eq!(json(f32::INFINITY), r#""+Inf""#);
        assert_eq!(json(Value::complex128(1.0, 2.0)), r#""(1+2i)""#);
        assert_eq!(json("say \"hi\""), r#""say \"hi\"""#);
        assert_eq!(json(Value::runes(['a', 'b'])), r#""ab""#);
        assert_eq!(json(Some("x")), r#""x""#);
        assert_eq!(json(None::<&str>), "null");
        assert_eq!(json(&[1.5f32, 2.0][..]), "[1.5,2.0]");
    }

    #[test]
    fn test_error_value() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let value = Value::error(&err);
        assert_eq!(value, Value::Error("no such file".to_owned()));
        assert_eq!(json(value), r#""no such file""#);
    }

    #[test]
    fn test_from_kv() {
        assert_eq!(Value::from_kv(&log::kv::Value::from(42u64)), Value::U64(42));
        assert_eq!(Value::from_kv(&log::kv::Value::from(-1i32)), Value::I64(-1));
        assert_eq!(Value::from_kv(&log::kv::Value::from(true)), Value::Bool(true));
        assert_eq!(Value::from_kv(&log::kv::Value::from("abc")), Value::Str("abc".to_owned()));
        assert_eq!(Value::from_kv(&log::kv::Value::from(0.25f64)), Value::F64(0.25));
    }
}
