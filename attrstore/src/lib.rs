/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Typed CRUD over a sparse attribute store, with optimistic writes.
//!
//! A [`Dao`] binds an [`Entity`](attrstore_mapper::Entity) codec to a
//! [`StoreClient`] and a table. Every write is guarded by a key-existence
//! condition evaluated atomically at the store: [`Dao::insert`] requires the
//! key to be free, [`Dao::replace`], [`Dao::update`] and [`Dao::delete`]
//! require it to be taken. Two racing writers never need client-side locks;
//! the loser gets a [`DaoError`] naming what failed.
//!
//! [`StoreClient`] is the only seam to the backend. The crate ships an
//! in-memory implementation, [`MemoryStore`], behind the `test-util` feature
//! for tests and local development.
//!
//! # Examples
//!
//! ```ignore
//! use attrstore::{Dao, MemoryStore, Scan};
//!
//! let dao = Dao::<Movie, _>::new(MemoryStore::new())?;
//! dao.create_table(dao.table_schema()?).await?;
//!
//! dao.insert(&movie).await?;
//! let stored = dao.get(&movie_key).await?;
//!
//! let page = dao.scan_page(&Scan::all(), Some(25), None).await?;
//! ```
//!
//! Operations are `async` and each one is a single round trip to the
//! store ([`Dao::scan_all`] excepted, which drives pages to exhaustion).
//! There are no internal retries: every failure surfaces as a [`DaoError`]
//! and the caller decides whether to try again.

#![allow(clippy::derive_partial_eq_without_eq)]
#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod client;
mod dao;
pub mod error;
#[cfg(feature = "test-util")]
mod memory;
mod paging;

pub use client::{KeyAttributeType, StoreClient, TableSchema};
pub use dao::{Dao, Scan, UpdateExpression};
pub use error::{BoxError, DaoError, DaoErrorKind, StoreError};
#[cfg(feature = "test-util")]
pub use memory::MemoryStore;
pub use paging::{Page, PageCursor};

// Entity declarations and attribute values appear throughout the DAO API,
// so the crates defining them are re-exported here.
pub use attrstore_mapper::{
    CodecSet, Entity, EntityCodec, EnumScalar, FieldDef, FieldType, Scalar, ScalarRegistry,
};
pub use attrstore_types::{AttributeMap, AttributeValue};
