/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Error types for codec construction and value conversion.

use std::fmt;

/// Error that occurs while converting between record fields and attribute values.
#[derive(Debug)]
pub struct CodecError {
    kind: CodecErrorKind,
    field: Option<String>,
}

/// The kind of conversion error that occurred.
#[derive(Debug)]
#[non_exhaustive]
pub enum CodecErrorKind {
    /// A required attribute was missing from the item.
    MissingAttribute,
    /// The attribute value had an unexpected wire type.
    InvalidType {
        /// The expected wire type.
        expected: &'static str,
        /// The actual wire type found.
        actual: &'static str,
    },
    /// The attribute value could not be parsed or was invalid.
    InvalidValue {
        /// Description of why the value was invalid.
        message: String,
    },
}

impl CodecError {
    /// Creates an error for a missing attribute.
    pub fn missing_attribute(field: impl Into<String>) -> Self {
        Self {
            kind: CodecErrorKind::MissingAttribute,
            field: Some(field.into()),
        }
    }

    /// Creates an error for an unexpected wire type.
    pub fn invalid_type(expected: &'static str, actual: &'static str) -> Self {
        Self {
            kind: CodecErrorKind::InvalidType { expected, actual },
            field: None,
        }
    }

    /// Creates an error for an unparseable or invalid value.
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self {
            kind: CodecErrorKind::InvalidValue {
                message: message.into(),
            },
            field: None,
        }
    }

    /// Attaches the field name this error occurred on.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Returns the kind of error.
    pub fn kind(&self) -> &CodecErrorKind {
        &self.kind
    }

    /// Returns the field name if available.
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.field) {
            (CodecErrorKind::MissingAttribute, Some(field)) => {
                write!(f, "missing required attribute '{}'", field)
            }
            (CodecErrorKind::MissingAttribute, None) => {
                write!(f, "missing required attribute")
            }
            (CodecErrorKind::InvalidType { expected, actual }, Some(field)) => {
                write!(
                    f,
                    "invalid type for '{}': expected {}, got {}",
                    field, expected, actual
                )
            }
            (CodecErrorKind::InvalidType { expected, actual }, None) => {
                write!(f, "invalid type: expected {}, got {}", expected, actual)
            }
            (CodecErrorKind::InvalidValue { message }, Some(field)) => {
                write!(f, "invalid value for '{}': {}", field, message)
            }
            (CodecErrorKind::InvalidValue { message }, None) => {
                write!(f, "invalid value: {}", message)
            }
        }
    }
}

impl std::error::Error for CodecError {}

/// Error that occurs while building an entity codec.
#[derive(Debug)]
pub struct SchemaError {
    kind: SchemaErrorKind,
    entity: &'static str,
}

/// The kind of schema violation that occurred.
#[derive(Debug)]
#[non_exhaustive]
pub enum SchemaErrorKind {
    /// No field carries the hash key flag.
    MissingHashKey,
    /// More than one field carries the hash key flag.
    MultipleHashKeys {
        /// The offending field names.
        fields: Vec<String>,
    },
    /// More than one field carries the range key flag.
    MultipleRangeKeys {
        /// The offending field names.
        fields: Vec<String>,
    },
    /// Two fields declare the same attribute name.
    DuplicateFieldName {
        /// The repeated name.
        name: String,
    },
    /// A key field failed classification and cannot be stored.
    UnsupportedKeyField {
        /// The key field name.
        name: String,
    },
    /// The entity refers back to itself through nested records.
    RecursiveEntity,
}

impl SchemaError {
    pub(crate) fn missing_hash_key(entity: &'static str) -> Self {
        Self {
            kind: SchemaErrorKind::MissingHashKey,
            entity,
        }
    }

    pub(crate) fn multiple_hash_keys(entity: &'static str, fields: Vec<String>) -> Self {
        Self {
            kind: SchemaErrorKind::MultipleHashKeys { fields },
            entity,
        }
    }

    pub(crate) fn multiple_range_keys(entity: &'static str, fields: Vec<String>) -> Self {
        Self {
            kind: SchemaErrorKind::MultipleRangeKeys { fields },
            entity,
        }
    }

    pub(crate) fn duplicate_field_name(entity: &'static str, name: String) -> Self {
        Self {
            kind: SchemaErrorKind::DuplicateFieldName { name },
            entity,
        }
    }

    pub(crate) fn unsupported_key_field(entity: &'static str, name: String) -> Self {
        Self {
            kind: SchemaErrorKind::UnsupportedKeyField { name },
            entity,
        }
    }

    pub(crate) fn recursive_entity(entity: &'static str) -> Self {
        Self {
            kind: SchemaErrorKind::RecursiveEntity,
            entity,
        }
    }

    /// Returns the kind of violation.
    pub fn kind(&self) -> &SchemaErrorKind {
        &self.kind
    }

    /// Returns the entity the violation was found on.
    pub fn entity(&self) -> &str {
        self.entity
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SchemaErrorKind::MissingHashKey => {
                write!(
                    f,
                    "entity '{}' must declare exactly one hash key field",
                    self.entity
                )
            }
            SchemaErrorKind::MultipleHashKeys { fields } => {
                write!(
                    f,
                    "entity '{}' declares more than one hash key field: {}",
                    self.entity,
                    fields.join(", ")
                )
            }
            SchemaErrorKind::MultipleRangeKeys { fields } => {
                write!(
                    f,
                    "entity '{}' declares more than one range key field: {}",
                    self.entity,
                    fields.join(", ")
                )
            }
            SchemaErrorKind::DuplicateFieldName { name } => {
                write!(
                    f,
                    "entity '{}' declares attribute '{}' more than once",
                    self.entity, name
                )
            }
            SchemaErrorKind::UnsupportedKeyField { name } => {
                write!(
                    f,
                    "key field '{}' of entity '{}' has a type that cannot be stored",
                    name, self.entity
                )
            }
            SchemaErrorKind::RecursiveEntity => {
                write!(
                    f,
                    "entity '{}' refers back to itself through nested records",
                    self.entity
                )
            }
        }
    }
}

impl std::error::Error for SchemaError {}
