/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The store client boundary.
//!
//! [`StoreClient`] is the seam between the [`Dao`](crate::Dao) and whatever
//! actually holds the items. Implementations translate these inputs into
//! their backend's requests and map failures onto
//! [`StoreError`](crate::StoreError); the in-memory implementation behind
//! the `test-util` feature keeps everything in process.

use std::collections::HashMap;

use async_trait::async_trait;
use attrstore_types::AttributeMap;

use crate::error::StoreError;

/// The wire type of a key attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAttributeType {
    /// String-typed keys.
    S,
    /// Number-typed keys.
    N,
}

/// The position a key attribute takes in the primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    /// The partition position.
    Hash,
    /// The sort position.
    Range,
}

/// One attribute of a table's primary key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeySchemaElement {
    /// The attribute name.
    pub attribute_name: String,
    /// Whether the attribute is the hash or the range key.
    pub role: KeyRole,
    /// The attribute's wire type.
    pub attribute_type: KeyAttributeType,
}

/// The shape a table is created with.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    /// The key attributes, hash key first.
    pub key_schema: Vec<KeySchemaElement>,
    /// Provisioned read capacity units.
    pub read_capacity: u64,
    /// Provisioned write capacity units.
    pub write_capacity: u64,
}

impl TableSchema {
    /// Starts a schema with the given hash key and default capacity.
    pub fn hash(name: impl Into<String>, attribute_type: KeyAttributeType) -> Self {
        Self {
            key_schema: vec![KeySchemaElement {
                attribute_name: name.into(),
                role: KeyRole::Hash,
                attribute_type,
            }],
            read_capacity: 5,
            write_capacity: 5,
        }
    }

    /// Adds a range key.
    pub fn and_range(mut self, name: impl Into<String>, attribute_type: KeyAttributeType) -> Self {
        self.key_schema.push(KeySchemaElement {
            attribute_name: name.into(),
            role: KeyRole::Range,
            attribute_type,
        });
        self
    }

    /// Overrides the provisioned capacity, in read and write units.
    pub fn capacity(mut self, read: u64, write: u64) -> Self {
        self.read_capacity = read;
        self.write_capacity = write;
        self
    }
}

/// Which item image a write returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnValues {
    /// Return no image.
    #[default]
    None,
    /// Return the item as it was before the write.
    AllOld,
    /// Return the item as it stands after the write.
    AllNew,
}

/// Input to [`StoreClient::create_table`].
#[derive(Debug, Clone)]
pub struct CreateTableInput {
    /// The table to create.
    pub table_name: String,
    /// The table's keys and capacity.
    pub schema: TableSchema,
}

/// Input to [`StoreClient::get_item`].
#[derive(Debug, Clone)]
pub struct GetItemInput {
    /// The table to read from.
    pub table_name: String,
    /// The full primary key of the item.
    pub key: AttributeMap,
}

/// Output of [`StoreClient::get_item`].
#[derive(Debug, Clone, Default)]
pub struct GetItemOutput {
    /// The stored item, or `None` when nothing lives under the key.
    pub item: Option<AttributeMap>,
}

/// Input to [`StoreClient::put_item`].
#[derive(Debug, Clone)]
pub struct PutItemInput {
    /// The table to write to.
    pub table_name: String,
    /// The full item to store.
    pub item: AttributeMap,
    /// A condition the current item must satisfy for the write to proceed.
    pub condition_expression: Option<String>,
    /// Which image to return.
    pub return_values: ReturnValues,
}

/// Output of [`StoreClient::put_item`].
#[derive(Debug, Clone, Default)]
pub struct PutItemOutput {
    /// The requested item image, when one was asked for and exists.
    pub attributes: Option<AttributeMap>,
}

/// Input to [`StoreClient::update_item`].
#[derive(Debug, Clone)]
pub struct UpdateItemInput {
    /// The table to write to.
    pub table_name: String,
    /// The full primary key of the item.
    pub key: AttributeMap,
    /// The update to apply, e.g. `SET #t = :title REMOVE plays`.
    pub update_expression: String,
    /// Values for the `:placeholder` tokens in the expressions.
    pub expression_values: AttributeMap,
    /// Attribute names for the `#alias` tokens in the expressions.
    pub expression_names: HashMap<String, String>,
    /// A condition the current item must satisfy for the write to proceed.
    pub condition_expression: Option<String>,
    /// Which image to return.
    pub return_values: ReturnValues,
}

/// Output of [`StoreClient::update_item`].
#[derive(Debug, Clone, Default)]
pub struct UpdateItemOutput {
    /// The requested item image, when one was asked for and exists.
    pub attributes: Option<AttributeMap>,
}

/// Input to [`StoreClient::delete_item`].
#[derive(Debug, Clone)]
pub struct DeleteItemInput {
    /// The table to delete from.
    pub table_name: String,
    /// The full primary key of the item.
    pub key: AttributeMap,
    /// A condition the current item must satisfy for the delete to proceed.
    pub condition_expression: Option<String>,
    /// Which image to return.
    pub return_values: ReturnValues,
}

/// Output of [`StoreClient::delete_item`].
#[derive(Debug, Clone, Default)]
pub struct DeleteItemOutput {
    /// The requested item image, when one was asked for and exists.
    pub attributes: Option<AttributeMap>,
}

/// Input to [`StoreClient::scan`].
#[derive(Debug, Clone, Default)]
pub struct ScanInput {
    /// The table to scan.
    pub table_name: String,
    /// An equality filter applied to evaluated items, e.g. `#g = :genre`.
    pub filter_expression: Option<String>,
    /// Values for the `:placeholder` tokens in the filter.
    pub expression_values: AttributeMap,
    /// Attribute names for the `#alias` tokens in the filter.
    pub expression_names: HashMap<String, String>,
    /// The maximum number of items to evaluate, counted before filtering.
    pub limit: Option<usize>,
    /// Resume after this key, from a previous page's `last_evaluated_key`.
    pub exclusive_start_key: Option<AttributeMap>,
}

/// Output of [`StoreClient::scan`].
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    /// The items that were evaluated and passed the filter.
    pub items: Vec<AttributeMap>,
    /// The key to resume from, present when the scan stopped at the limit
    /// before reaching the end of the table.
    pub last_evaluated_key: Option<AttributeMap>,
}

/// An item store.
///
/// Writes are conditional: when a `condition_expression` is present and the
/// current item does not satisfy it, the implementation must fail with
/// [`StoreError::ConditionalCheckFailed`] and leave the table untouched.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Creates a table.
    ///
    /// Fails with [`StoreError::ResourceInUse`] when the table already
    /// exists.
    async fn create_table(&self, input: CreateTableInput) -> Result<(), StoreError>;

    /// Reads the item stored under a key.
    async fn get_item(&self, input: GetItemInput) -> Result<GetItemOutput, StoreError>;

    /// Stores an item, replacing whatever the key held before.
    async fn put_item(&self, input: PutItemInput) -> Result<PutItemOutput, StoreError>;

    /// Applies an update expression to the item under a key.
    ///
    /// Without a condition this is an upsert: a missing item starts from
    /// just its key attributes.
    async fn update_item(&self, input: UpdateItemInput) -> Result<UpdateItemOutput, StoreError>;

    /// Deletes the item stored under a key.
    async fn delete_item(&self, input: DeleteItemInput) -> Result<DeleteItemOutput, StoreError>;

    /// Evaluates a contiguous run of items in stable key order.
    async fn scan(&self, input: ScanInput) -> Result<ScanOutput, StoreError>;
}
