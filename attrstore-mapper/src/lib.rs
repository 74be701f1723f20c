/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Maps typed application records to sparse attribute maps and back.
//!
//! An [`Entity`] declares its name, key fields and stored fields once. The
//! mapper classifies every declared field when the codec is built, so the
//! per-record conversions run without reflection or further lookups. Fields
//! the mapper cannot store are dropped with a warning instead of failing the
//! whole entity; key fields are the exception and must be storable.
//!
//! Absence is the null of this model: a field holding `None` produces no
//! attribute at all, and a missing attribute decodes back to `None`.
//!
//! # Examples
//!
//! ```
//! use attrstore_mapper::{Entity, EntityCodec, FieldDef, FieldType};
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Movie {
//!     year: Option<i32>,
//!     title: Option<String>,
//! }
//!
//! impl Entity for Movie {
//!     fn entity_name() -> &'static str {
//!         "Movie"
//!     }
//!
//!     fn fields() -> Vec<FieldDef<Self>> {
//!         vec![
//!             FieldDef::new(
//!                 "yr",
//!                 FieldType::scalar::<i32>(),
//!                 |m: &Movie| m.year.as_ref(),
//!                 |m: &mut Movie, v| m.year = v,
//!             )
//!             .hash_key(),
//!             FieldDef::new(
//!                 "title",
//!                 FieldType::scalar::<String>(),
//!                 |m: &Movie| m.title.as_ref(),
//!                 |m: &mut Movie, v| m.title = v,
//!             )
//!             .range_key(),
//!         ]
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let codec = EntityCodec::<Movie>::bind()?;
//! let movie = Movie {
//!     year: Some(1990),
//!     title: Some("Goodfellas".to_string()),
//! };
//!
//! let item = codec.encode(&movie)?;
//! assert_eq!(codec.decode(&item)?, movie);
//! # Ok(())
//! # }
//! ```

#![allow(clippy::derive_partial_eq_without_eq)]
#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

mod classify;
mod codec;
mod erase;
pub mod error;
mod field;
mod registry;
mod scalar;

pub use classify::{FieldCategory, FieldDescriptor};
pub use codec::{CodecSet, Entity, EntityCodec};
pub use error::{CodecError, CodecErrorKind, SchemaError, SchemaErrorKind};
pub use field::{FieldDef, FieldType};
pub use registry::ScalarRegistry;
pub use scalar::{EnumScalar, Scalar};
