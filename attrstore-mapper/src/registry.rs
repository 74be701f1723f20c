/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The scalar codec registry.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use attrstore_types::AttributeValue;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::erase::AnyValue;
use crate::error::CodecError;
use crate::scalar::{json_from_attr, json_to_attr, EnumScalar, Scalar};

/// One registered scalar codec: a matched pair of type-erased encode and
/// decode functions.
#[derive(Clone, Copy)]
pub(crate) struct ScalarCodec {
    type_name: &'static str,
    wire: &'static str,
    encode_fn: fn(&dyn Any) -> Result<AttributeValue, CodecError>,
    decode_fn: fn(&AttributeValue) -> Result<AnyValue, CodecError>,
}

impl ScalarCodec {
    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn wire(&self) -> &'static str {
        self.wire
    }

    pub(crate) fn encode(&self, value: &dyn Any) -> Result<AttributeValue, CodecError> {
        (self.encode_fn)(value)
    }

    pub(crate) fn decode(&self, value: &AttributeValue) -> Result<AnyValue, CodecError> {
        (self.decode_fn)(value)
    }
}

/// The table of scalar codecs, keyed by Rust type identity.
///
/// The table is populated once, then frozen inside a
/// [`CodecSet`](crate::CodecSet) and only read from there. A registry shared
/// process-wide with every built-in registered is available through
/// [`ScalarRegistry::shared`].
pub struct ScalarRegistry {
    entries: HashMap<TypeId, ScalarCodec>,
}

impl ScalarRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Creates a registry with every built-in scalar registered.
    ///
    /// Built-ins: the signed and unsigned fixed-width integers, `f32`/`f64`,
    /// `bool`, `char`, `String`, [`BigInteger`](attrstore_types::BigInteger),
    /// [`BigDecimal`](attrstore_types::BigDecimal), `SystemTime`,
    /// [`OffsetDateTime`](time::OffsetDateTime) and `serde_json::Value` as
    /// the structured-object fallback.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register::<i8>();
        registry.register::<i16>();
        registry.register::<i32>();
        registry.register::<i64>();
        registry.register::<u8>();
        registry.register::<u16>();
        registry.register::<u32>();
        registry.register::<u64>();
        registry.register::<f32>();
        registry.register::<f64>();
        registry.register::<bool>();
        registry.register::<char>();
        registry.register::<String>();
        registry.register::<attrstore_types::BigInteger>();
        registry.register::<attrstore_types::BigDecimal>();
        registry.register::<std::time::SystemTime>();
        registry.register::<time::OffsetDateTime>();
        registry.register::<serde_json::Value>();
        registry
    }

    /// Returns the shared registry holding the built-in scalars.
    pub fn shared() -> &'static Arc<ScalarRegistry> {
        static SHARED: Lazy<Arc<ScalarRegistry>> =
            Lazy::new(|| Arc::new(ScalarRegistry::with_defaults()));
        &SHARED
    }

    /// Registers `T` as a scalar, replacing any previous entry for `T`.
    pub fn register<T: Scalar>(&mut self) {
        self.entries.insert(
            TypeId::of::<T>(),
            ScalarCodec {
                type_name: std::any::type_name::<T>(),
                wire: T::WIRE,
                encode_fn: encode_erased::<T>,
                decode_fn: decode_erased::<T>,
            },
        );
    }

    /// Registers an enum stored by its symbolic variant name.
    pub fn register_enum<T: EnumScalar>(&mut self) {
        self.entries.insert(
            TypeId::of::<T>(),
            ScalarCodec {
                type_name: std::any::type_name::<T>(),
                wire: "S",
                encode_fn: encode_enum_erased::<T>,
                decode_fn: decode_enum_erased::<T>,
            },
        );
    }

    /// Registers a serde-capable type, stored as a JSON string.
    ///
    /// Encoding falls back to the value's `Debug` form when serialization
    /// fails; decoding a payload that does not parse as `T` is an error.
    pub fn register_json<T>(&mut self)
    where
        T: Serialize + DeserializeOwned + fmt::Debug + Send + Sync + 'static,
    {
        self.entries.insert(
            TypeId::of::<T>(),
            ScalarCodec {
                type_name: std::any::type_name::<T>(),
                wire: "S",
                encode_fn: encode_json_erased::<T>,
                decode_fn: decode_json_erased::<T>,
            },
        );
    }

    /// True when `T` has an entry.
    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub(crate) fn get(&self, id: TypeId) -> Option<&ScalarCodec> {
        self.entries.get(&id)
    }
}

impl Default for ScalarRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ScalarRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarRegistry")
            .field("entries", &self.entries.len())
            .finish()
    }
}

fn encode_erased<T: Scalar>(value: &dyn Any) -> Result<AttributeValue, CodecError> {
    match value.downcast_ref::<T>() {
        Some(value) => Ok(value.to_attr()),
        None => Err(not_the_registered_type::<T>()),
    }
}

fn decode_erased<T: Scalar>(value: &AttributeValue) -> Result<AnyValue, CodecError> {
    T::from_attr(value).map(AnyValue::new)
}

fn encode_enum_erased<T: EnumScalar>(value: &dyn Any) -> Result<AttributeValue, CodecError> {
    match value.downcast_ref::<T>() {
        Some(value) => Ok(AttributeValue::S(value.name().to_string())),
        None => Err(not_the_registered_type::<T>()),
    }
}

fn decode_enum_erased<T: EnumScalar>(value: &AttributeValue) -> Result<AnyValue, CodecError> {
    match value {
        AttributeValue::S(name) => T::from_name(name).map(AnyValue::new).ok_or_else(|| {
            CodecError::invalid_value(format!(
                "unknown variant '{}' for {}",
                name,
                std::any::type_name::<T>()
            ))
        }),
        other => Err(CodecError::invalid_type("S", other.type_label())),
    }
}

fn encode_json_erased<T>(value: &dyn Any) -> Result<AttributeValue, CodecError>
where
    T: Serialize + fmt::Debug + Send + Sync + 'static,
{
    match value.downcast_ref::<T>() {
        Some(value) => Ok(json_to_attr(value)),
        None => Err(not_the_registered_type::<T>()),
    }
}

fn decode_json_erased<T>(value: &AttributeValue) -> Result<AnyValue, CodecError>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    json_from_attr::<T>(value, std::any::type_name::<T>()).map(AnyValue::new)
}

fn not_the_registered_type<T>() -> CodecError {
    CodecError::invalid_value(format!(
        "value is not a {}",
        std::any::type_name::<T>()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn defaults_cover_the_built_in_scalars() {
        let registry = ScalarRegistry::with_defaults();
        assert!(registry.contains::<i32>());
        assert!(registry.contains::<u64>());
        assert!(registry.contains::<f64>());
        assert!(registry.contains::<bool>());
        assert!(registry.contains::<char>());
        assert!(registry.contains::<String>());
        assert!(registry.contains::<attrstore_types::BigInteger>());
        assert!(registry.contains::<attrstore_types::BigDecimal>());
        assert!(registry.contains::<std::time::SystemTime>());
        assert!(registry.contains::<time::OffsetDateTime>());
        assert!(registry.contains::<serde_json::Value>());
        assert!(!registry.contains::<Vec<u8>>());
    }

    #[test]
    fn erased_encode_rejects_the_wrong_type() {
        let registry = ScalarRegistry::with_defaults();
        let codec = registry.get(TypeId::of::<i32>()).unwrap();
        let err = codec.encode(&"nope".to_string() as &dyn Any).unwrap_err();
        assert!(err.to_string().contains("is not a i32"));
    }

    #[test]
    fn erased_roundtrip_through_the_table() {
        let registry = ScalarRegistry::with_defaults();
        let codec = registry.get(TypeId::of::<i64>()).unwrap();
        let av = codec.encode(&99i64 as &dyn Any).unwrap();
        assert_eq!(av, AttributeValue::N("99".to_string()));
        let value = codec.decode(&av).unwrap();
        assert_eq!(value.downcast::<i64>().ok(), Some(99));
    }

    #[derive(Debug, PartialEq)]
    enum Color {
        Red,
        Green,
    }

    impl EnumScalar for Color {
        fn name(&self) -> &'static str {
            match self {
                Color::Red => "RED",
                Color::Green => "GREEN",
            }
        }

        fn from_name(name: &str) -> Option<Self> {
            match name {
                "RED" => Some(Color::Red),
                "GREEN" => Some(Color::Green),
                _ => None,
            }
        }
    }

    #[test]
    fn registered_enum_stores_the_variant_name() {
        let mut registry = ScalarRegistry::new();
        registry.register_enum::<Color>();
        let codec = registry.get(TypeId::of::<Color>()).unwrap();

        let av = codec.encode(&Color::Green as &dyn Any).unwrap();
        assert_eq!(av, AttributeValue::S("GREEN".to_string()));

        let value = codec.decode(&av).unwrap();
        assert_eq!(value.downcast::<Color>().ok(), Some(Color::Green));

        let err = codec
            .decode(&AttributeValue::S("BLUE".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("unknown variant 'BLUE'"));
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Dimensions {
        width: u32,
        height: u32,
    }

    #[test]
    fn registered_json_type_roundtrips_as_a_string() {
        let mut registry = ScalarRegistry::new();
        registry.register_json::<Dimensions>();
        let codec = registry.get(TypeId::of::<Dimensions>()).unwrap();

        let original = Dimensions {
            width: 1920,
            height: 1080,
        };
        let av = codec.encode(&original as &dyn Any).unwrap();
        assert_eq!(
            av,
            AttributeValue::S(r#"{"width":1920,"height":1080}"#.to_string())
        );

        let value = codec.decode(&av).unwrap();
        assert_eq!(value.downcast::<Dimensions>().ok(), Some(original));
    }

    #[test]
    fn registered_json_type_rejects_bad_payloads() {
        let mut registry = ScalarRegistry::new();
        registry.register_json::<Dimensions>();
        let codec = registry.get(TypeId::of::<Dimensions>()).unwrap();

        let err = codec
            .decode(&AttributeValue::S("not json".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("cannot parse JSON"));
    }
}
