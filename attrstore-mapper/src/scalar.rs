/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Scalar codecs for standard Rust types.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use attrstore_types::{AttributeValue, BigDecimal, BigInteger};
use num_integer::div_mod_floor;
use serde::de::DeserializeOwned;
use serde::Serialize;
use time::OffsetDateTime;

use crate::error::CodecError;

const NANOS_PER_MILLI: i128 = 1_000_000;

/// A value that encodes into a single attribute and back.
///
/// Decoding is strict: a wrong wire type or an unparseable payload is an
/// error, never a silent truncation. Implementations for the built-in types
/// are registered by [`ScalarRegistry::with_defaults`](crate::ScalarRegistry::with_defaults);
/// custom types are added through [`ScalarRegistry::register`](crate::ScalarRegistry::register).
pub trait Scalar: Sized + Send + Sync + 'static {
    /// The wire label values of this type encode to: `"N"`, `"S"` or `"BOOL"`.
    const WIRE: &'static str;

    /// Encodes this value as an attribute.
    fn to_attr(&self) -> AttributeValue;

    /// Decodes a value from an attribute.
    fn from_attr(value: &AttributeValue) -> Result<Self, CodecError>;
}

/// An enumerated value stored by its symbolic name.
///
/// Registered through [`ScalarRegistry::register_enum`](crate::ScalarRegistry::register_enum);
/// the variant name is stored in an `S` attribute.
pub trait EnumScalar: Sized + Send + Sync + 'static {
    /// Returns the symbolic name of this variant.
    fn name(&self) -> &'static str;

    /// Resolves a variant from its symbolic name.
    fn from_name(name: &str) -> Option<Self>;
}

// ============================================================================
// Integers
// ============================================================================

macro_rules! integer_scalar {
    ($($ty:ty),*) => {
        $(
            impl Scalar for $ty {
                const WIRE: &'static str = "N";

                fn to_attr(&self) -> AttributeValue {
                    let mut buffer = itoa::Buffer::new();
                    AttributeValue::N(buffer.format(*self).to_string())
                }

                fn from_attr(value: &AttributeValue) -> Result<Self, CodecError> {
                    match value {
                        AttributeValue::N(n) => n.parse().map_err(|_| {
                            CodecError::invalid_value(format!(
                                "cannot parse '{}' as {}",
                                n,
                                stringify!($ty)
                            ))
                        }),
                        other => Err(CodecError::invalid_type("N", other.type_label())),
                    }
                }
            }
        )*
    };
}

integer_scalar!(i8, i16, i32, i64, u8, u16, u32, u64);

// ============================================================================
// Floats
// ============================================================================

macro_rules! float_scalar {
    ($($ty:ty),*) => {
        $(
            impl Scalar for $ty {
                const WIRE: &'static str = "N";

                fn to_attr(&self) -> AttributeValue {
                    let mut buffer = ryu::Buffer::new();
                    AttributeValue::N(buffer.format(*self).to_string())
                }

                fn from_attr(value: &AttributeValue) -> Result<Self, CodecError> {
                    match value {
                        AttributeValue::N(n) => n.parse().map_err(|_| {
                            CodecError::invalid_value(format!(
                                "cannot parse '{}' as {}",
                                n,
                                stringify!($ty)
                            ))
                        }),
                        other => Err(CodecError::invalid_type("N", other.type_label())),
                    }
                }
            }
        )*
    };
}

float_scalar!(f32, f64);

// ============================================================================
// Strings, chars and booleans
// ============================================================================

impl Scalar for String {
    const WIRE: &'static str = "S";

    fn to_attr(&self) -> AttributeValue {
        AttributeValue::S(self.clone())
    }

    fn from_attr(value: &AttributeValue) -> Result<Self, CodecError> {
        match value {
            AttributeValue::S(s) => Ok(s.clone()),
            other => Err(CodecError::invalid_type("S", other.type_label())),
        }
    }
}

impl Scalar for char {
    const WIRE: &'static str = "S";

    fn to_attr(&self) -> AttributeValue {
        AttributeValue::S(self.to_string())
    }

    fn from_attr(value: &AttributeValue) -> Result<Self, CodecError> {
        match value {
            // The first character wins, mirroring how a single-character
            // field is read back from a plain string attribute.
            AttributeValue::S(s) => s
                .chars()
                .next()
                .ok_or_else(|| CodecError::invalid_value("cannot read a char from an empty string")),
            other => Err(CodecError::invalid_type("S", other.type_label())),
        }
    }
}

impl Scalar for bool {
    const WIRE: &'static str = "BOOL";

    fn to_attr(&self) -> AttributeValue {
        AttributeValue::Bool(*self)
    }

    fn from_attr(value: &AttributeValue) -> Result<Self, CodecError> {
        match value {
            AttributeValue::Bool(b) => Ok(*b),
            other => Err(CodecError::invalid_type("BOOL", other.type_label())),
        }
    }
}

// ============================================================================
// Big numbers
// ============================================================================

impl Scalar for BigInteger {
    const WIRE: &'static str = "N";

    fn to_attr(&self) -> AttributeValue {
        AttributeValue::N(self.as_str().to_string())
    }

    fn from_attr(value: &AttributeValue) -> Result<Self, CodecError> {
        match value {
            AttributeValue::N(n) => Ok(BigInteger::from(n.clone())),
            other => Err(CodecError::invalid_type("N", other.type_label())),
        }
    }
}

impl Scalar for BigDecimal {
    const WIRE: &'static str = "N";

    fn to_attr(&self) -> AttributeValue {
        AttributeValue::N(self.as_str().to_string())
    }

    fn from_attr(value: &AttributeValue) -> Result<Self, CodecError> {
        match value {
            AttributeValue::N(n) => Ok(BigDecimal::from(n.clone())),
            other => Err(CodecError::invalid_type("N", other.type_label())),
        }
    }
}

// ============================================================================
// Timestamps
// ============================================================================

// Timestamps normalize to whole epoch milliseconds; sub-millisecond
// precision does not survive a round trip.

impl Scalar for SystemTime {
    const WIRE: &'static str = "N";

    fn to_attr(&self) -> AttributeValue {
        let millis: i128 = match self.duration_since(UNIX_EPOCH) {
            Ok(since) => since.as_millis() as i128,
            Err(before) => -(before.duration().as_millis() as i128),
        };
        let mut buffer = itoa::Buffer::new();
        AttributeValue::N(buffer.format(millis).to_string())
    }

    fn from_attr(value: &AttributeValue) -> Result<Self, CodecError> {
        let millis = parse_epoch_millis(value)?;
        if millis >= 0 {
            Ok(UNIX_EPOCH + Duration::from_millis(millis as u64))
        } else {
            Ok(UNIX_EPOCH - Duration::from_millis(millis.unsigned_abs()))
        }
    }
}

impl Scalar for OffsetDateTime {
    const WIRE: &'static str = "N";

    fn to_attr(&self) -> AttributeValue {
        let (millis, _) = div_mod_floor(self.unix_timestamp_nanos(), NANOS_PER_MILLI);
        let mut buffer = itoa::Buffer::new();
        AttributeValue::N(buffer.format(millis).to_string())
    }

    fn from_attr(value: &AttributeValue) -> Result<Self, CodecError> {
        let millis = parse_epoch_millis(value)?;
        OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * NANOS_PER_MILLI).map_err(|_| {
            CodecError::invalid_value(format!("epoch milliseconds {} are out of range", millis))
        })
    }
}

fn parse_epoch_millis(value: &AttributeValue) -> Result<i64, CodecError> {
    match value {
        AttributeValue::N(n) => n.parse().map_err(|_| {
            CodecError::invalid_value(format!("cannot parse '{}' as epoch milliseconds", n))
        }),
        other => Err(CodecError::invalid_type("N", other.type_label())),
    }
}

// ============================================================================
// Structured fallback
// ============================================================================

impl Scalar for serde_json::Value {
    const WIRE: &'static str = "S";

    fn to_attr(&self) -> AttributeValue {
        AttributeValue::S(self.to_string())
    }

    fn from_attr(value: &AttributeValue) -> Result<Self, CodecError> {
        match value {
            // A payload that is not valid JSON is surfaced as the raw string,
            // so values written outside this codec still decode.
            AttributeValue::S(s) => Ok(serde_json::from_str(s)
                .unwrap_or_else(|_| serde_json::Value::String(s.clone()))),
            other => Err(CodecError::invalid_type("S", other.type_label())),
        }
    }
}

pub(crate) fn json_to_attr<T: Serialize + fmt::Debug>(value: &T) -> AttributeValue {
    match serde_json::to_string(value) {
        Ok(json) => AttributeValue::S(json),
        Err(_) => AttributeValue::S(format!("{:?}", value)),
    }
}

pub(crate) fn json_from_attr<T: DeserializeOwned>(
    value: &AttributeValue,
    type_name: &'static str,
) -> Result<T, CodecError> {
    match value {
        AttributeValue::S(s) => serde_json::from_str(s).map_err(|err| {
            CodecError::invalid_value(format!("cannot parse JSON as {}: {}", type_name, err))
        }),
        other => Err(CodecError::invalid_type("S", other.type_label())),
    }
}
