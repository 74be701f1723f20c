/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Entity codecs.
//!
//! A [`CodecSet`] turns [`Entity`] declarations into [`EntityCodec`]s,
//! building nested codecs on demand and memoizing them by type. The codec
//! itself is a cheap `Arc` handle that converts records to attribute maps
//! and back.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use attrstore_types::{AttributeMap, AttributeValue};

use crate::classify::{
    classify, Classified, ElementPlan, FieldCategory, FieldDescriptor, FieldPlan,
};
use crate::erase::AnyValue;
use crate::error::{CodecError, SchemaError};
use crate::field::FieldDef;
use crate::registry::{ScalarCodec, ScalarRegistry};

/// A storable application record.
///
/// Implementations declare a name, an optional table override and the list
/// of stored fields. The `Default` bound supplies the blank record decoding
/// starts from, so absent attributes leave fields at their default.
pub trait Entity: Default + Send + Sync + 'static {
    /// The logical name of the entity, used in warnings and schema errors.
    fn entity_name() -> &'static str;

    /// The table records of this entity live in. Defaults to the entity name.
    fn table_name() -> &'static str {
        Self::entity_name()
    }

    /// Declares the entity's fields.
    fn fields() -> Vec<FieldDef<Self>>;
}

/// Builds and caches entity codecs against one scalar registry.
///
/// Nested record fields pull their codecs from the same set, so an entity
/// graph shares one codec per type no matter how often it appears.
pub struct CodecSet {
    registry: Arc<ScalarRegistry>,
    codecs: HashMap<TypeId, Arc<dyn ErasedEntityCodec>>,
    building: Vec<TypeId>,
}

impl CodecSet {
    /// Creates a codec set over the given registry.
    pub fn new(registry: ScalarRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            codecs: HashMap::new(),
            building: Vec::new(),
        }
    }

    /// Creates a codec set over the shared built-in registry.
    pub fn with_default_registry() -> Self {
        Self {
            registry: ScalarRegistry::shared().clone(),
            codecs: HashMap::new(),
            building: Vec::new(),
        }
    }

    /// Returns the codec for `E`, building it first if necessary.
    pub fn entity_codec<E: Entity>(&mut self) -> Result<EntityCodec<E>, SchemaError> {
        let erased = self.ensure_erased::<E>()?;
        let inner = erased
            .as_any_arc()
            .downcast::<CodecInner<E>>()
            .expect("codec is registered under its own type id");
        Ok(EntityCodec { inner })
    }

    pub(crate) fn ensure_erased<E: Entity>(
        &mut self,
    ) -> Result<Arc<dyn ErasedEntityCodec>, SchemaError> {
        let id = TypeId::of::<E>();
        if let Some(codec) = self.codecs.get(&id) {
            return Ok(codec.clone());
        }
        if self.building.contains(&id) {
            return Err(SchemaError::recursive_entity(E::entity_name()));
        }
        self.building.push(id);
        let built = CodecInner::<E>::build(self);
        self.building.pop();
        let codec: Arc<dyn ErasedEntityCodec> = Arc::new(built?);
        self.codecs.insert(id, codec.clone());
        Ok(codec)
    }

    pub(crate) fn scalar(&self, id: TypeId) -> Option<ScalarCodec> {
        self.registry.get(id).copied()
    }
}

impl fmt::Debug for CodecSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecSet")
            .field("registry", &self.registry)
            .field("codecs", &self.codecs.len())
            .finish()
    }
}

/// Object-safe face of a built codec, used for nested records where the
/// concrete entity type is erased.
pub(crate) trait ErasedEntityCodec: Send + Sync {
    fn entity_name(&self) -> &'static str;
    fn encode_any(&self, record: &dyn Any) -> Result<AttributeMap, CodecError>;
    fn decode_any(&self, item: &AttributeMap) -> Result<AnyValue, CodecError>;
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

struct BoundField<T> {
    def: FieldDef<T>,
    plan: FieldPlan,
}

struct CodecInner<T> {
    entity_name: &'static str,
    table_name: &'static str,
    fields: Vec<BoundField<T>>,
    descriptors: Vec<FieldDescriptor>,
    hash_key: String,
    range_key: Option<String>,
    warnings: Vec<String>,
}

impl<T: Entity> CodecInner<T> {
    fn build(set: &mut CodecSet) -> Result<Self, SchemaError> {
        let entity_name = T::entity_name();
        let defs = T::fields();

        let mut hash_keys: Vec<String> = defs
            .iter()
            .filter(|def| def.hash_key)
            .map(|def| def.name.clone())
            .collect();
        match hash_keys.len() {
            0 => return Err(SchemaError::missing_hash_key(entity_name)),
            1 => {}
            _ => return Err(SchemaError::multiple_hash_keys(entity_name, hash_keys)),
        }
        let hash_key = hash_keys.remove(0);

        let mut range_keys: Vec<String> = defs
            .iter()
            .filter(|def| def.range_key)
            .map(|def| def.name.clone())
            .collect();
        if range_keys.len() > 1 {
            return Err(SchemaError::multiple_range_keys(entity_name, range_keys));
        }
        let range_key = range_keys.pop();

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(defs.len());
        let mut descriptors = Vec::with_capacity(defs.len());
        let mut warnings = Vec::new();
        for def in defs {
            if !seen.insert(def.name.clone()) {
                return Err(SchemaError::duplicate_field_name(entity_name, def.name));
            }
            match classify(entity_name, &def.name, &def.field_type, set)? {
                Classified::Supported {
                    category,
                    plan,
                    element,
                } => {
                    let wire = match &plan {
                        FieldPlan::Scalar(codec) => Some(codec.wire()),
                        _ => None,
                    };
                    descriptors.push(FieldDescriptor {
                        name: def.name.clone(),
                        type_name: def.field_type.type_name,
                        category,
                        element,
                        wire,
                        hash_key: def.hash_key,
                        range_key: def.range_key,
                    });
                    fields.push(BoundField { def, plan });
                }
                Classified::Dropped { warning } => {
                    if def.hash_key || def.range_key {
                        return Err(SchemaError::unsupported_key_field(entity_name, def.name));
                    }
                    tracing::warn!("{}", warning);
                    descriptors.push(FieldDescriptor {
                        name: def.name.clone(),
                        type_name: def.field_type.type_name,
                        category: FieldCategory::Unsupported,
                        element: None,
                        wire: None,
                        hash_key: false,
                        range_key: false,
                    });
                    warnings.push(warning);
                }
            }
        }

        Ok(Self {
            entity_name,
            table_name: T::table_name(),
            fields,
            descriptors,
            hash_key,
            range_key,
            warnings,
        })
    }

    fn encode(&self, record: &T) -> Result<AttributeMap, CodecError> {
        let mut item = AttributeMap::with_capacity(self.fields.len());
        for field in &self.fields {
            if let Some(value) = (field.def.get)(record) {
                let encoded = encode_value(&field.plan, value)
                    .map_err(|err| contextualize(err, &field.def.name))?;
                item.insert(field.def.name.clone(), encoded);
            }
        }
        Ok(item)
    }

    fn decode(&self, item: &AttributeMap) -> Result<T, CodecError> {
        let mut record = T::default();
        for field in &self.fields {
            match item.get(&field.def.name) {
                None => (field.def.set)(&mut record, None)?,
                Some(value) => {
                    let decoded = decode_value(&field.plan, value)
                        .map_err(|err| contextualize(err, &field.def.name))?;
                    (field.def.set)(&mut record, Some(decoded))
                        .map_err(|err| contextualize(err, &field.def.name))?;
                }
            }
        }
        Ok(record)
    }
}

impl<T: Entity> ErasedEntityCodec for CodecInner<T> {
    fn entity_name(&self) -> &'static str {
        self.entity_name
    }

    fn encode_any(&self, record: &dyn Any) -> Result<AttributeMap, CodecError> {
        match record.downcast_ref::<T>() {
            Some(record) => self.encode(record),
            None => Err(CodecError::invalid_value(format!(
                "record is not a {}",
                std::any::type_name::<T>()
            ))),
        }
    }

    fn decode_any(&self, item: &AttributeMap) -> Result<AnyValue, CodecError> {
        self.decode(item).map(AnyValue::new)
    }

    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Encodes and decodes records of one entity type.
///
/// Cloning shares the underlying codec, so handles are cheap to pass
/// around and across tasks.
pub struct EntityCodec<T> {
    inner: Arc<CodecInner<T>>,
}

impl<T: Entity> EntityCodec<T> {
    /// Builds a codec for `T` over the shared built-in registry.
    ///
    /// Shorthand for a fresh [`CodecSet`] when only one entity is needed;
    /// use a set directly to share nested codecs or a custom registry.
    pub fn bind() -> Result<Self, SchemaError> {
        CodecSet::with_default_registry().entity_codec::<T>()
    }

    /// Encodes a record into an attribute map.
    ///
    /// Absent fields produce no attribute at all.
    pub fn encode(&self, record: &T) -> Result<AttributeMap, CodecError> {
        self.inner.encode(record)
    }

    /// Decodes an attribute map into a record.
    ///
    /// Attributes with no declared field are ignored; declared fields with
    /// no attribute are left absent.
    pub fn decode(&self, item: &AttributeMap) -> Result<T, CodecError> {
        self.inner.decode(item)
    }

    /// Extracts the key attributes of a record.
    ///
    /// Fails with a missing-attribute error when the record does not carry
    /// a value for every key field.
    pub fn key_attributes(&self, record: &T) -> Result<AttributeMap, CodecError> {
        let mut item = self.encode(record)?;
        let mut key = AttributeMap::with_capacity(2);
        for name in self.key_names() {
            match item.remove(name) {
                Some(value) => {
                    key.insert(name.to_string(), value);
                }
                None => return Err(CodecError::missing_attribute(name)),
            }
        }
        Ok(key)
    }

    /// The entity's logical name.
    pub fn entity_name(&self) -> &'static str {
        self.inner.entity_name
    }

    /// The table records of this entity live in.
    pub fn table_name(&self) -> &'static str {
        self.inner.table_name
    }

    /// The hash key attribute name.
    pub fn hash_key(&self) -> &str {
        &self.inner.hash_key
    }

    /// The range key attribute name, if the entity declares one.
    pub fn range_key(&self) -> Option<&str> {
        self.inner.range_key.as_deref()
    }

    /// The key attribute names, hash key first.
    pub fn key_names(&self) -> impl Iterator<Item = &str> + '_ {
        std::iter::once(self.inner.hash_key.as_str()).chain(self.inner.range_key.as_deref())
    }

    /// Descriptions of every declared field, in declaration order.
    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.inner.descriptors
    }

    /// The warnings recorded for fields dropped during classification.
    pub fn warnings(&self) -> &[String] {
        &self.inner.warnings
    }
}

impl<T> Clone for EntityCodec<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> fmt::Debug for EntityCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCodec")
            .field("entity", &self.inner.entity_name)
            .field("table", &self.inner.table_name)
            .finish()
    }
}

fn contextualize(err: CodecError, field: &str) -> CodecError {
    if err.field().is_none() {
        err.with_field(field)
    } else {
        err
    }
}

fn encode_value(plan: &FieldPlan, value: &dyn Any) -> Result<AttributeValue, CodecError> {
    match plan {
        FieldPlan::Scalar(codec) => codec.encode(value),
        FieldPlan::Record(codec) => Ok(AttributeValue::M(codec.encode_any(value)?)),
        FieldPlan::List { element, seq } => {
            let elements = (seq.explode)(value).ok_or_else(|| {
                CodecError::invalid_value("value does not match the declared list type")
            })?;
            let mut out = Vec::with_capacity(elements.len());
            for element_value in elements {
                out.push(encode_element(element, element_value)?);
            }
            Ok(AttributeValue::L(out))
        }
        FieldPlan::Map { value: plan, map } => {
            let entries = (map.explode)(value).ok_or_else(|| {
                CodecError::invalid_value("value does not match the declared map type")
            })?;
            let mut out = AttributeMap::with_capacity(entries.len());
            for (key, entry) in entries {
                out.insert(key.to_string(), encode_element(plan, entry)?);
            }
            Ok(AttributeValue::M(out))
        }
    }
}

fn encode_element(plan: &ElementPlan, value: &dyn Any) -> Result<AttributeValue, CodecError> {
    match plan {
        ElementPlan::Scalar(codec) => codec.encode(value),
        ElementPlan::Record(codec) => Ok(AttributeValue::M(codec.encode_any(value)?)),
    }
}

fn decode_value(plan: &FieldPlan, value: &AttributeValue) -> Result<AnyValue, CodecError> {
    match plan {
        FieldPlan::Scalar(codec) => codec.decode(value),
        FieldPlan::Record(codec) => match value {
            AttributeValue::M(item) => codec.decode_any(item),
            other => Err(CodecError::invalid_type("M", other.type_label())),
        },
        FieldPlan::List { element, seq } => match value {
            AttributeValue::L(values) => {
                let mut out = Vec::with_capacity(values.len());
                for value in values {
                    out.push(decode_element(element, value)?);
                }
                (seq.rebuild)(out)
            }
            other => Err(CodecError::invalid_type("L", other.type_label())),
        },
        FieldPlan::Map { value: plan, map } => match value {
            AttributeValue::M(entries) => {
                let mut out = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    out.push((key.clone(), decode_element(plan, value)?));
                }
                (map.rebuild)(out)
            }
            other => Err(CodecError::invalid_type("M", other.type_label())),
        },
    }
}

fn decode_element(plan: &ElementPlan, value: &AttributeValue) -> Result<AnyValue, CodecError> {
    match plan {
        ElementPlan::Scalar(codec) => codec.decode(value),
        ElementPlan::Record(codec) => match value {
            AttributeValue::M(item) => codec.decode_any(item),
            other => Err(CodecError::invalid_type("M", other.type_label())),
        },
    }
}
