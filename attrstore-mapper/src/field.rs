/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Field declarations: the declared shape of an entity field and the typed
//! accessors that bridge it to the type-erased codec machinery.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::codec::{CodecSet, Entity, ErasedEntityCodec};
use crate::erase::AnyValue;
use crate::error::{CodecError, SchemaError};

/// The declared type of an entity field.
///
/// A `FieldType` describes the shape the mapper should expect: a scalar, a
/// list, a string-keyed map, or a nested record. Constructors capture the
/// concrete Rust type so the codec can move values across the `dyn Any`
/// boundary without the caller writing any glue.
pub struct FieldType {
    pub(crate) type_name: &'static str,
    pub(crate) kind: TypeKind,
}

pub(crate) enum TypeKind {
    Scalar {
        id: TypeId,
    },
    List {
        element: Option<Box<FieldType>>,
        seq: SeqAdapter,
    },
    Map {
        key: Box<FieldType>,
        value: Box<FieldType>,
        map: MapAdapter,
    },
    Record {
        entity: EntityRef,
    },
    Other,
}

impl FieldType {
    /// A scalar field of type `T`.
    ///
    /// `T` must have a codec in the [`ScalarRegistry`](crate::ScalarRegistry)
    /// in use, otherwise the field is dropped with a warning when the entity
    /// codec is built.
    pub fn scalar<T: Any>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            kind: TypeKind::Scalar {
                id: TypeId::of::<T>(),
            },
        }
    }

    /// A nested record field holding another [`Entity`].
    pub fn record<E: Entity>() -> Self {
        Self {
            type_name: std::any::type_name::<E>(),
            kind: TypeKind::Record {
                entity: EntityRef::of::<E>(),
            },
        }
    }

    /// A `Vec<E>` field with the given element type.
    pub fn list<E: Send + Sync + 'static>(element: FieldType) -> Self {
        Self {
            type_name: std::any::type_name::<Vec<E>>(),
            kind: TypeKind::List {
                element: Some(Box::new(element)),
                seq: SeqAdapter::of_vec::<E>(),
            },
        }
    }

    /// A `Vec<serde_json::Value>` field with no declared element type.
    ///
    /// Elements are stored through the `serde_json::Value` codec, so the
    /// list can hold mixed shapes.
    pub fn untyped_list() -> Self {
        Self {
            type_name: std::any::type_name::<Vec<serde_json::Value>>(),
            kind: TypeKind::List {
                element: None,
                seq: SeqAdapter::of_vec::<serde_json::Value>(),
            },
        }
    }

    /// A `HashMap<K, V>` field.
    ///
    /// Only `String` keys are storable; a map declared with any other key
    /// type is dropped with a warning when the entity codec is built.
    pub fn map<K: Any, V: Send + Sync + 'static>(key: FieldType, value: FieldType) -> Self {
        Self {
            type_name: std::any::type_name::<HashMap<K, V>>(),
            kind: TypeKind::Map {
                key: Box::new(key),
                value: Box::new(value),
                map: MapAdapter::of_hash_map::<V>(),
            },
        }
    }

    /// Shorthand for a `Vec<S>` of scalars.
    pub fn scalar_list<S: Send + Sync + 'static>() -> Self {
        Self::list::<S>(Self::scalar::<S>())
    }

    /// Shorthand for a `Vec<E>` of nested records.
    pub fn record_list<E: Entity>() -> Self {
        Self::list::<E>(Self::record::<E>())
    }

    /// Shorthand for a `HashMap<K, V>` with scalar values.
    pub fn scalar_map<K: Any, V: Send + Sync + 'static>() -> Self {
        Self::map::<K, V>(Self::scalar::<K>(), Self::scalar::<V>())
    }

    /// Shorthand for a `HashMap<String, E>` with nested record values.
    pub fn record_map<E: Entity>() -> Self {
        Self::map::<String, E>(Self::scalar::<String>(), Self::record::<E>())
    }

    /// A field of a shape the mapper cannot store.
    ///
    /// Declaring a field with this type documents the field in the schema
    /// while excluding it from storage; building the codec records a warning
    /// for it.
    pub fn other<T: Any>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            kind: TypeKind::Other,
        }
    }
}

impl fmt::Debug for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldType")
            .field("type_name", &self.type_name)
            .field("kind", &self.kind.label())
            .finish()
    }
}

impl TypeKind {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            TypeKind::Scalar { .. } => "scalar",
            TypeKind::List { .. } => "list",
            TypeKind::Map { .. } => "map",
            TypeKind::Record { .. } => "record",
            TypeKind::Other => "other",
        }
    }
}

/// Type-erased view of a `Vec<E>`: breaks a borrowed vector into element
/// references for encoding, and reassembles decoded elements into the
/// concrete vector.
#[derive(Clone, Copy)]
pub(crate) struct SeqAdapter {
    pub(crate) explode: for<'a> fn(&'a dyn Any) -> Option<Vec<&'a dyn Any>>,
    pub(crate) rebuild: fn(Vec<AnyValue>) -> Result<AnyValue, CodecError>,
}

impl SeqAdapter {
    fn of_vec<E: Send + Sync + 'static>() -> Self {
        Self {
            explode: explode_vec::<E>,
            rebuild: rebuild_vec::<E>,
        }
    }
}

/// Type-erased view of a `HashMap<String, V>`.
#[derive(Clone, Copy)]
pub(crate) struct MapAdapter {
    pub(crate) explode: for<'a> fn(&'a dyn Any) -> Option<Vec<(&'a str, &'a dyn Any)>>,
    pub(crate) rebuild: fn(Vec<(String, AnyValue)>) -> Result<AnyValue, CodecError>,
}

impl MapAdapter {
    fn of_hash_map<V: Send + Sync + 'static>() -> Self {
        Self {
            explode: explode_map::<V>,
            rebuild: rebuild_map::<V>,
        }
    }
}

/// A deferred reference to a nested entity type.
///
/// Holds the constructor for the nested codec rather than the codec itself,
/// so entity graphs can be declared in any order and cycles fail at build
/// time instead of overflowing the stack.
#[derive(Clone, Copy)]
pub(crate) struct EntityRef {
    pub(crate) ensure: fn(&mut CodecSet) -> Result<Arc<dyn ErasedEntityCodec>, SchemaError>,
}

impl EntityRef {
    fn of<E: Entity>() -> Self {
        Self {
            ensure: CodecSet::ensure_erased::<E>,
        }
    }
}

fn explode_vec<E: Send + Sync + 'static>(value: &dyn Any) -> Option<Vec<&dyn Any>> {
    value
        .downcast_ref::<Vec<E>>()
        .map(|vec| vec.iter().map(|element| element as &dyn Any).collect())
}

fn rebuild_vec<E: Send + Sync + 'static>(elements: Vec<AnyValue>) -> Result<AnyValue, CodecError> {
    let mut out = Vec::with_capacity(elements.len());
    for element in elements {
        match element.downcast::<E>() {
            Ok(element) => out.push(element),
            Err(_) => {
                return Err(CodecError::invalid_value(format!(
                    "list element is not a {}",
                    std::any::type_name::<E>()
                )))
            }
        }
    }
    Ok(AnyValue::new(out))
}

fn explode_map<V: Send + Sync + 'static>(value: &dyn Any) -> Option<Vec<(&str, &dyn Any)>> {
    value.downcast_ref::<HashMap<String, V>>().map(|map| {
        map.iter()
            .map(|(key, value)| (key.as_str(), value as &dyn Any))
            .collect()
    })
}

fn rebuild_map<V: Send + Sync + 'static>(
    entries: Vec<(String, AnyValue)>,
) -> Result<AnyValue, CodecError> {
    let mut out = HashMap::with_capacity(entries.len());
    for (key, value) in entries {
        match value.downcast::<V>() {
            Ok(value) => {
                out.insert(key, value);
            }
            Err(_) => {
                return Err(CodecError::invalid_value(format!(
                    "map value is not a {}",
                    std::any::type_name::<V>()
                )))
            }
        }
    }
    Ok(AnyValue::new(out))
}

/// One field of an entity: its name, declared type, key role and the typed
/// accessors the codec drives.
///
/// Every field is optional on the Rust side; `get` returning `None` means
/// the field is absent and no attribute is written for it.
pub struct FieldDef<T> {
    pub(crate) name: String,
    pub(crate) field_type: FieldType,
    pub(crate) hash_key: bool,
    pub(crate) range_key: bool,
    pub(crate) get: GetFn<T>,
    pub(crate) set: SetFn<T>,
}

pub(crate) type GetFn<T> = Box<dyn for<'a> Fn(&'a T) -> Option<&'a dyn Any> + Send + Sync>;
pub(crate) type SetFn<T> =
    Box<dyn Fn(&mut T, Option<AnyValue>) -> Result<(), CodecError> + Send + Sync>;

impl<T: 'static> FieldDef<T> {
    /// Declares a field.
    ///
    /// `get` returns a reference to the field's current value, or `None`
    /// when the field is absent. `set` stores a decoded value, or clears
    /// the field when passed `None`. `F` is the value type held by the
    /// field, without the `Option` wrapper.
    pub fn new<F>(
        name: impl Into<String>,
        field_type: FieldType,
        get: fn(&T) -> Option<&F>,
        set: fn(&mut T, Option<F>),
    ) -> Self
    where
        F: Send + Sync + 'static,
    {
        let name = name.into();
        let getter: GetFn<T> = Box::new(move |record| get(record).map(|value| value as &dyn Any));
        let field_name = name.clone();
        let setter: SetFn<T> = Box::new(move |record, value| match value {
            None => {
                set(record, None);
                Ok(())
            }
            Some(value) => match value.downcast::<F>() {
                Ok(value) => {
                    set(record, Some(value));
                    Ok(())
                }
                Err(_) => Err(CodecError::invalid_value(format!(
                    "decoded value for '{}' is not a {}",
                    field_name,
                    std::any::type_name::<F>()
                ))),
            },
        });
        Self {
            name,
            field_type,
            hash_key: false,
            range_key: false,
            get: getter,
            set: setter,
        }
    }

    /// Marks this field as the hash key.
    pub fn hash_key(mut self) -> Self {
        self.hash_key = true;
        self
    }

    /// Marks this field as the range key.
    pub fn range_key(mut self) -> Self {
        self.range_key = true;
        self
    }

    /// The attribute name this field is stored under.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> fmt::Debug for FieldDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("hash_key", &self.hash_key)
            .field("range_key", &self.range_key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Sample {
        label: Option<String>,
    }

    fn label_field() -> FieldDef<Sample> {
        FieldDef::new(
            "label",
            FieldType::scalar::<String>(),
            |s: &Sample| s.label.as_ref(),
            |s: &mut Sample, v| s.label = v,
        )
    }

    #[test]
    fn accessors_move_values_both_ways() {
        let field = label_field();
        let mut sample = Sample::default();
        assert!((field.get)(&sample).is_none());

        (field.set)(&mut sample, Some(AnyValue::new("hi".to_string()))).unwrap();
        assert_eq!(sample.label.as_deref(), Some("hi"));

        let raw = (field.get)(&sample).unwrap();
        assert_eq!(raw.downcast_ref::<String>().map(String::as_str), Some("hi"));

        (field.set)(&mut sample, None).unwrap();
        assert!(sample.label.is_none());
    }

    #[test]
    fn setting_the_wrong_type_is_an_error() {
        let field = label_field();
        let mut sample = Sample::default();
        let err = (field.set)(&mut sample, Some(AnyValue::new(7i32))).unwrap_err();
        assert!(err.to_string().contains("is not a"));
    }

    #[test]
    fn key_markers_accumulate() {
        let field = label_field().hash_key();
        assert!(field.hash_key);
        assert!(!field.range_key);
        assert_eq!(field.name(), "label");
    }
}
