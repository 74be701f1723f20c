/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The tagged attribute value and the item map built from it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One stored item: attribute names mapped to their values.
pub type AttributeMap = HashMap<String, AttributeValue>;

/// A single attribute value.
///
/// Values are self-describing: the variant is the wire tag. Serialization
/// uses the externally tagged form, so `AttributeValue::N("123")` becomes
/// `{"N": "123"}` and `AttributeValue::Bool(true)` becomes `{"BOOL": true}`.
///
/// Numbers are always carried as exact decimal strings. Converting a number
/// through its binary floating representation would lose precision, so the
/// string produced by the encoder is stored and returned untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// A number, as an exact decimal string.
    N(String),
    /// A UTF-8 string.
    S(String),
    /// A boolean.
    #[serde(rename = "BOOL")]
    Bool(bool),
    /// An unordered map of attribute names to nested values.
    M(AttributeMap),
    /// An ordered list of values.
    L(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Returns the wire tag of this value: `"N"`, `"S"`, `"BOOL"`, `"M"` or `"L"`.
    pub fn type_label(&self) -> &'static str {
        match self {
            AttributeValue::N(_) => "N",
            AttributeValue::S(_) => "S",
            AttributeValue::Bool(_) => "BOOL",
            AttributeValue::M(_) => "M",
            AttributeValue::L(_) => "L",
        }
    }

    /// Returns the decimal string if this value is an `N`.
    pub fn as_n(&self) -> Option<&str> {
        match self {
            AttributeValue::N(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the string if this value is an `S`.
    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean if this value is a `BOOL`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the nested map if this value is an `M`.
    pub fn as_m(&self) -> Option<&AttributeMap> {
        match self {
            AttributeValue::M(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the list if this value is an `L`.
    pub fn as_l(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::L(l) => Some(l),
            _ => None,
        }
    }

    /// True if this value is an `N`.
    pub fn is_n(&self) -> bool {
        matches!(self, AttributeValue::N(_))
    }

    /// True if this value is an `S`.
    pub fn is_s(&self) -> bool {
        matches!(self, AttributeValue::S(_))
    }

    /// True if this value is a `BOOL`.
    pub fn is_bool(&self) -> bool {
        matches!(self, AttributeValue::Bool(_))
    }

    /// True if this value is an `M`.
    pub fn is_m(&self) -> bool {
        matches!(self, AttributeValue::M(_))
    }

    /// True if this value is an `L`.
    pub fn is_l(&self) -> bool {
        matches!(self, AttributeValue::L(_))
    }
}
