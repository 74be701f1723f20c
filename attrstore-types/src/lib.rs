/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Attribute-level data model shared by the attrstore crates.
//!
//! The central type is [`AttributeValue`], a tagged union of the value shapes
//! a sparse item store understands: exact decimal numbers, strings, booleans,
//! unordered string-keyed maps and ordered lists. One stored item is an
//! [`AttributeMap`]. There is no null value: an absent field is represented by
//! the absence of its key.

#![allow(clippy::derive_partial_eq_without_eq)]
#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

mod attribute_value;
mod big_number;

pub use attribute_value::{AttributeMap, AttributeValue};
pub use big_number::{BigDecimal, BigInteger};
