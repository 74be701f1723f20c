/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Classification of declared field types into storable plans.
//!
//! Classification happens once, when an entity codec is built. Each declared
//! field either becomes a [`FieldPlan`] driving encode and decode, or is
//! dropped with a warning naming the reason. Dropping is not an error:
//! the rest of the entity keeps working and the field is simply never
//! stored or read.

use std::any::TypeId;
use std::sync::Arc;

use crate::codec::{CodecSet, ErasedEntityCodec};
use crate::error::SchemaError;
use crate::field::{FieldType, MapAdapter, SeqAdapter, TypeKind};
use crate::registry::ScalarCodec;

/// The storage category a field was classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCategory {
    /// Stored as a single `N`, `S` or `BOOL` attribute.
    Scalar,
    /// Stored as an `L` attribute.
    List,
    /// Stored as an `M` attribute with free-form keys.
    Map,
    /// Stored as an `M` attribute holding a nested entity.
    Record,
    /// Not stored; a warning was recorded when the codec was built.
    Unsupported,
}

/// Read-only description of one classified field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub(crate) name: String,
    pub(crate) type_name: &'static str,
    pub(crate) category: FieldCategory,
    pub(crate) element: Option<&'static str>,
    pub(crate) wire: Option<&'static str>,
    pub(crate) hash_key: bool,
    pub(crate) range_key: bool,
}

impl FieldDescriptor {
    /// The attribute name the field is stored under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared Rust type of the field.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The category the field was classified into.
    pub fn category(&self) -> FieldCategory {
        self.category
    }

    /// The element type for lists, or the value type for maps.
    pub fn element(&self) -> Option<&'static str> {
        self.element
    }

    /// The wire label scalar fields encode to (`"N"`, `"S"` or `"BOOL"`).
    ///
    /// `None` for non-scalar fields.
    pub fn wire_type(&self) -> Option<&'static str> {
        self.wire
    }

    /// True when the field is the hash key.
    pub fn is_hash_key(&self) -> bool {
        self.hash_key
    }

    /// True when the field is the range key.
    pub fn is_range_key(&self) -> bool {
        self.range_key
    }
}

pub(crate) enum ElementPlan {
    Scalar(ScalarCodec),
    Record(Arc<dyn ErasedEntityCodec>),
}

pub(crate) enum FieldPlan {
    Scalar(ScalarCodec),
    Record(Arc<dyn ErasedEntityCodec>),
    List { element: ElementPlan, seq: SeqAdapter },
    Map { value: ElementPlan, map: MapAdapter },
}

pub(crate) enum Classified {
    Supported {
        category: FieldCategory,
        plan: FieldPlan,
        element: Option<&'static str>,
    },
    Dropped {
        warning: String,
    },
}

pub(crate) fn classify(
    entity: &'static str,
    field: &str,
    declared: &FieldType,
    set: &mut CodecSet,
) -> Result<Classified, SchemaError> {
    match &declared.kind {
        TypeKind::Scalar { id } => match set.scalar(*id) {
            Some(codec) => Ok(Classified::Supported {
                category: FieldCategory::Scalar,
                plan: FieldPlan::Scalar(codec),
                element: None,
            }),
            None => Ok(dropped(
                entity,
                field,
                declared,
                "no scalar codec is registered for this type",
            )),
        },
        TypeKind::Record { entity: nested } => {
            let codec = (nested.ensure)(set)?;
            Ok(Classified::Supported {
                category: FieldCategory::Record,
                plan: FieldPlan::Record(codec),
                element: None,
            })
        }
        TypeKind::List { element, seq } => {
            let resolved = match element {
                None => set
                    .scalar(TypeId::of::<serde_json::Value>())
                    .map(|codec| (ElementPlan::Scalar(codec), None)),
                Some(element) => {
                    element_plan(element, set)?.map(|plan| (plan, Some(element.type_name)))
                }
            };
            match resolved {
                Some((element, element_name)) => Ok(Classified::Supported {
                    category: FieldCategory::List,
                    plan: FieldPlan::List {
                        element,
                        seq: *seq,
                    },
                    element: element_name,
                }),
                None => Ok(dropped(
                    entity,
                    field,
                    declared,
                    "the element type has no codec",
                )),
            }
        }
        TypeKind::Map { key, value, map } => {
            let string_key =
                matches!(&key.kind, TypeKind::Scalar { id } if *id == TypeId::of::<String>());
            if !string_key {
                return Ok(dropped(entity, field, declared, "map keys must be strings"));
            }
            match element_plan(value, set)? {
                Some(plan) => Ok(Classified::Supported {
                    category: FieldCategory::Map,
                    plan: FieldPlan::Map {
                        value: plan,
                        map: *map,
                    },
                    element: Some(value.type_name),
                }),
                None => Ok(dropped(
                    entity,
                    field,
                    declared,
                    "the value type has no codec",
                )),
            }
        }
        TypeKind::Other => Ok(dropped(entity, field, declared, "the type is not supported")),
    }
}

/// Resolves an element or map-value type. Only scalars and records can sit
/// inside a container; anything else makes the whole field unsupported.
fn element_plan(
    element: &FieldType,
    set: &mut CodecSet,
) -> Result<Option<ElementPlan>, SchemaError> {
    match &element.kind {
        TypeKind::Scalar { id } => Ok(set.scalar(*id).map(ElementPlan::Scalar)),
        TypeKind::Record { entity } => Ok(Some(ElementPlan::Record((entity.ensure)(set)?))),
        _ => Ok(None),
    }
}

fn dropped(entity: &'static str, field: &str, declared: &FieldType, reason: &str) -> Classified {
    Classified::Dropped {
        warning: format!(
            "unable to handle field `{}` of entity `{}` ({}): {}; the field will not be stored",
            field, entity, declared.type_name, reason
        ),
    }
}
