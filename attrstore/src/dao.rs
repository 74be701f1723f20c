/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The data access object.
//!
//! A [`Dao`] pairs an entity codec with a store client and exposes typed
//! operations over one table. Writes are guarded by key-existence
//! conditions, so concurrent writers cannot silently overwrite or recreate
//! each other's items: an insert fails when the key is taken, and replace,
//! update and delete fail when it is not.

use std::collections::HashMap;
use std::fmt;

use attrstore_mapper::{CodecError, Entity, EntityCodec, SchemaError};
use attrstore_types::{AttributeMap, AttributeValue};

use crate::client::{
    CreateTableInput, DeleteItemInput, GetItemInput, KeyAttributeType, PutItemInput, ReturnValues,
    ScanInput, StoreClient, TableSchema, UpdateItemInput,
};
use crate::error::{DaoError, StoreError};
use crate::paging::{Page, PageCursor};

/// Typed, condition-guarded access to one table.
pub struct Dao<T, C> {
    client: C,
    codec: EntityCodec<T>,
    table_name: String,
}

impl<T: Entity, C: StoreClient> Dao<T, C> {
    /// Creates a DAO for `T` over the shared built-in scalar registry.
    pub fn new(client: C) -> Result<Self, SchemaError> {
        Ok(Self::with_codec(client, EntityCodec::<T>::bind()?))
    }

    /// Creates a DAO around an already-built codec.
    ///
    /// Use this when the codec needs a custom scalar registry or is shared
    /// with other components.
    pub fn with_codec(client: C, codec: EntityCodec<T>) -> Self {
        let table_name = codec.table_name().to_string();
        Self {
            client,
            codec,
            table_name,
        }
    }

    /// Redirects this DAO at a different table.
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// The table this DAO addresses.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The codec this DAO converts records with.
    pub fn codec(&self) -> &EntityCodec<T> {
        &self.codec
    }

    /// Creates the table this DAO addresses, forwarding `schema` to the
    /// store under the DAO's table name.
    ///
    /// [`table_schema`](Self::table_schema) derives a schema matching the
    /// codec's key fields. Fails with
    /// [`DaoErrorKind::TableExists`](crate::DaoErrorKind::TableExists)
    /// when the table is already there.
    pub async fn create_table(&self, schema: TableSchema) -> Result<(), DaoError> {
        tracing::debug!(table = %self.table_name, "creating table");
        match self
            .client
            .create_table(CreateTableInput {
                table_name: self.table_name.clone(),
                schema,
            })
            .await
        {
            Ok(()) => Ok(()),
            Err(StoreError::ResourceInUse { .. }) => Err(DaoError::table_exists(&self.table_name)),
            Err(other) => Err(self.store_error("CreateTable", other)),
        }
    }

    /// Derives the table schema from the codec: the key fields with their
    /// encoded attribute types, at the default provisioned capacity.
    pub fn table_schema(&self) -> Result<TableSchema, DaoError> {
        let mut schema =
            TableSchema::hash(self.codec.hash_key(), self.key_type(self.codec.hash_key())?);
        if let Some(range) = self.codec.range_key() {
            schema = schema.and_range(range, self.key_type(range)?);
        }
        Ok(schema)
    }

    /// Stores a new record.
    ///
    /// Fails with [`DaoErrorKind::CouldNotInsert`](crate::DaoErrorKind::CouldNotInsert)
    /// when an item already lives under the record's key, leaving the stored
    /// item untouched.
    pub async fn insert(&self, record: &T) -> Result<(), DaoError> {
        let item = self.encoded("PutItem", record)?;
        let condition = join_conditions("attribute_not_exists", self.codec.key_names());
        tracing::debug!(table = %self.table_name, "inserting item");
        match self
            .client
            .put_item(PutItemInput {
                table_name: self.table_name.clone(),
                item,
                condition_expression: Some(condition),
                return_values: ReturnValues::None,
            })
            .await
        {
            Ok(_) => Ok(()),
            Err(StoreError::ConditionalCheckFailed { .. }) => {
                Err(DaoError::could_not_insert(&self.table_name))
            }
            Err(other) => Err(self.store_error("PutItem", other)),
        }
    }

    /// Reads the record stored under `key_record`'s key.
    ///
    /// Only the key fields of `key_record` matter. Fails with
    /// [`DaoErrorKind::ItemDoesNotExist`](crate::DaoErrorKind::ItemDoesNotExist)
    /// when nothing lives under the key.
    pub async fn get(&self, key_record: &T) -> Result<T, DaoError> {
        let key = self.key_of("GetItem", key_record)?;
        tracing::debug!(table = %self.table_name, "getting item");
        let output = self
            .client
            .get_item(GetItemInput {
                table_name: self.table_name.clone(),
                key,
            })
            .await
            .map_err(|err| self.store_error("GetItem", err))?;
        match output.item {
            Some(item) => self.decoded("GetItem", &item),
            None => Err(DaoError::item_does_not_exist(&self.table_name)),
        }
    }

    /// Replaces the record stored under `record`'s key and returns the
    /// replaced record.
    ///
    /// Replacing requires prior existence: when no item lives under the key
    /// the write is rejected with
    /// [`DaoErrorKind::CouldNotInsert`](crate::DaoErrorKind::CouldNotInsert)
    /// and nothing is written.
    pub async fn replace(&self, record: &T) -> Result<T, DaoError> {
        let item = self.encoded("PutItem", record)?;
        let condition = join_conditions("attribute_exists", self.codec.key_names());
        tracing::debug!(table = %self.table_name, "replacing item");
        match self
            .client
            .put_item(PutItemInput {
                table_name: self.table_name.clone(),
                item,
                condition_expression: Some(condition),
                return_values: ReturnValues::AllOld,
            })
            .await
        {
            Ok(output) => match output.attributes {
                Some(previous) => self.decoded("PutItem", &previous),
                None => Err(self.missing_image("PutItem")),
            },
            Err(StoreError::ConditionalCheckFailed { .. }) => {
                Err(DaoError::could_not_insert(&self.table_name))
            }
            Err(other) => Err(self.store_error("PutItem", other)),
        }
    }

    /// Applies an update expression to the record under `key_record`'s key
    /// and returns the record as it stands afterwards.
    ///
    /// Fails with [`DaoErrorKind::CouldNotUpdate`](crate::DaoErrorKind::CouldNotUpdate)
    /// when no item lives under the key; the update never creates an item.
    pub async fn update(&self, key_record: &T, update: UpdateExpression) -> Result<T, DaoError> {
        let key = self.key_of("UpdateItem", key_record)?;
        let condition = join_conditions("attribute_exists", self.codec.key_names());
        let (expression, values, names) = update.into_parts();
        tracing::debug!(table = %self.table_name, expression = %expression, "updating item");
        match self
            .client
            .update_item(UpdateItemInput {
                table_name: self.table_name.clone(),
                key,
                update_expression: expression,
                expression_values: values,
                expression_names: names,
                condition_expression: Some(condition),
                return_values: ReturnValues::AllNew,
            })
            .await
        {
            Ok(output) => match output.attributes {
                Some(image) => self.decoded("UpdateItem", &image),
                None => Err(self.missing_image("UpdateItem")),
            },
            Err(StoreError::ConditionalCheckFailed { .. }) => {
                Err(DaoError::could_not_update(&self.table_name))
            }
            Err(other) => Err(self.store_error("UpdateItem", other)),
        }
    }

    /// Deletes the record stored under `key_record`'s key and returns it.
    ///
    /// Fails with [`DaoErrorKind::CouldNotDelete`](crate::DaoErrorKind::CouldNotDelete)
    /// when no item lives under the key.
    pub async fn delete(&self, key_record: &T) -> Result<T, DaoError> {
        let key = self.key_of("DeleteItem", key_record)?;
        let condition = join_conditions("attribute_exists", self.codec.key_names());
        tracing::debug!(table = %self.table_name, "deleting item");
        match self
            .client
            .delete_item(DeleteItemInput {
                table_name: self.table_name.clone(),
                key,
                condition_expression: Some(condition),
                return_values: ReturnValues::AllOld,
            })
            .await
        {
            Ok(output) => match output.attributes {
                Some(previous) => self.decoded("DeleteItem", &previous),
                None => Err(self.missing_image("DeleteItem")),
            },
            Err(StoreError::ConditionalCheckFailed { .. }) => {
                Err(DaoError::could_not_delete(&self.table_name))
            }
            Err(other) => Err(self.store_error("DeleteItem", other)),
        }
    }

    /// Reads one page of records.
    ///
    /// `limit` caps how many stored items are evaluated, counted before the
    /// scan's filter; pass the returned cursor to the next call to resume.
    pub async fn scan_page(
        &self,
        scan: &Scan,
        limit: Option<usize>,
        cursor: Option<PageCursor>,
    ) -> Result<Page<T>, DaoError> {
        tracing::debug!(table = %self.table_name, ?limit, "scanning page");
        let output = self
            .client
            .scan(ScanInput {
                table_name: self.table_name.clone(),
                filter_expression: scan.filter_expression.clone(),
                expression_values: scan.expression_values.clone(),
                expression_names: scan.expression_names.clone(),
                limit,
                exclusive_start_key: cursor.map(PageCursor::into_inner),
            })
            .await
            .map_err(|err| self.store_error("Scan", err))?;

        let mut records = Vec::with_capacity(output.items.len());
        for item in &output.items {
            records.push(self.decoded("Scan", item)?);
        }
        Ok(Page::new(
            records,
            output.last_evaluated_key.map(PageCursor::new),
        ))
    }

    /// Reads every record the scan matches, walking pages to the end.
    pub async fn scan_all(&self, scan: &Scan) -> Result<Vec<T>, DaoError> {
        let mut records = Vec::new();
        let mut cursor = None;
        loop {
            let page = self.scan_page(scan, None, cursor).await?;
            let (items, next) = page.into_parts();
            records.extend(items);
            match next {
                Some(next) => cursor = Some(next),
                None => return Ok(records),
            }
        }
    }

    /// Stores a raw item unconditionally, bypassing the codec.
    pub async fn put_item(&self, item: AttributeMap) -> Result<(), DaoError> {
        tracing::debug!(table = %self.table_name, "putting raw item");
        self.client
            .put_item(PutItemInput {
                table_name: self.table_name.clone(),
                item,
                condition_expression: None,
                return_values: ReturnValues::None,
            })
            .await
            .map_err(|err| self.store_error("PutItem", err))?;
        Ok(())
    }

    /// Reads a raw item by key, bypassing the codec.
    pub async fn get_item(&self, key: AttributeMap) -> Result<Option<AttributeMap>, DaoError> {
        tracing::debug!(table = %self.table_name, "getting raw item");
        let output = self
            .client
            .get_item(GetItemInput {
                table_name: self.table_name.clone(),
                key,
            })
            .await
            .map_err(|err| self.store_error("GetItem", err))?;
        Ok(output.item)
    }

    fn key_type(&self, name: &str) -> Result<KeyAttributeType, DaoError> {
        let wire = self
            .codec
            .descriptors()
            .iter()
            .find(|descriptor| descriptor.name() == name)
            .and_then(|descriptor| descriptor.wire_type());
        match wire {
            Some("S") => Ok(KeyAttributeType::S),
            Some("N") => Ok(KeyAttributeType::N),
            _ => Err(DaoError::data_access(
                &self.table_name,
                "CreateTable",
                format!("key field '{}' does not encode to an S or N attribute", name).into(),
            )),
        }
    }

    fn encoded(&self, operation: &'static str, record: &T) -> Result<AttributeMap, DaoError> {
        self.codec
            .encode(record)
            .map_err(|err| self.codec_error(operation, err))
    }

    fn decoded(&self, operation: &'static str, item: &AttributeMap) -> Result<T, DaoError> {
        self.codec
            .decode(item)
            .map_err(|err| self.codec_error(operation, err))
    }

    fn key_of(&self, operation: &'static str, record: &T) -> Result<AttributeMap, DaoError> {
        self.codec
            .key_attributes(record)
            .map_err(|err| self.codec_error(operation, err))
    }

    fn codec_error(&self, operation: &'static str, err: CodecError) -> DaoError {
        DaoError::data_access(&self.table_name, operation, Box::new(err))
    }

    fn store_error(&self, operation: &'static str, err: StoreError) -> DaoError {
        match err {
            StoreError::ResourceNotFound { .. } => DaoError::table_does_not_exist(&self.table_name),
            StoreError::ResourceInUse { .. } => DaoError::table_exists(&self.table_name),
            other => DaoError::data_access(&self.table_name, operation, Box::new(other)),
        }
    }

    fn missing_image(&self, operation: &'static str) -> DaoError {
        DaoError::data_access(
            &self.table_name,
            operation,
            "store returned no item image".into(),
        )
    }
}

impl<T, C> fmt::Debug for Dao<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dao")
            .field("table_name", &self.table_name)
            .field("codec", &self.codec)
            .finish()
    }
}

fn join_conditions<'a>(function: &str, names: impl Iterator<Item = &'a str>) -> String {
    names
        .map(|name| format!("{}({})", function, name))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// A scan over a table: an optional equality filter plus its placeholder
/// bindings.
#[derive(Debug, Clone, Default)]
pub struct Scan {
    filter_expression: Option<String>,
    expression_values: AttributeMap,
    expression_names: HashMap<String, String>,
}

impl Scan {
    /// A scan matching every item.
    pub fn all() -> Self {
        Self::default()
    }

    /// A scan filtered by equality clauses joined with ` AND `, e.g.
    /// `#g = :genre`.
    pub fn filtered(expression: impl Into<String>) -> Self {
        Self {
            filter_expression: Some(expression.into()),
            ..Self::default()
        }
    }

    /// Binds a `:placeholder` token to a value.
    pub fn value(mut self, placeholder: impl Into<String>, value: AttributeValue) -> Self {
        self.expression_values.insert(placeholder.into(), value);
        self
    }

    /// Binds a `#alias` token to an attribute name.
    pub fn name(mut self, alias: impl Into<String>, attribute: impl Into<String>) -> Self {
        self.expression_names.insert(alias.into(), attribute.into());
        self
    }
}

/// An update expression plus its placeholder bindings.
///
/// The expression language is the store's; the supported subset is `SET`
/// assignments and `REMOVE` lists, e.g.
/// `SET #t = :title, plays = :plays REMOVE draft`.
#[derive(Debug, Clone)]
pub struct UpdateExpression {
    expression: String,
    values: AttributeMap,
    names: HashMap<String, String>,
}

impl UpdateExpression {
    /// Wraps an update expression.
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            values: AttributeMap::new(),
            names: HashMap::new(),
        }
    }

    /// Binds a `:placeholder` token to a value.
    pub fn value(mut self, placeholder: impl Into<String>, value: AttributeValue) -> Self {
        self.values.insert(placeholder.into(), value);
        self
    }

    /// Binds a `#alias` token to an attribute name.
    pub fn name(mut self, alias: impl Into<String>, attribute: impl Into<String>) -> Self {
        self.names.insert(alias.into(), attribute.into());
        self
    }

    fn into_parts(self) -> (String, AttributeMap, HashMap<String, String>) {
        (self.expression, self.values, self.names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conditions_join_on_and() {
        assert_eq!(
            join_conditions("attribute_not_exists", ["yr", "title"].into_iter()),
            "attribute_not_exists(yr) AND attribute_not_exists(title)"
        );
        assert_eq!(
            join_conditions("attribute_exists", ["id"].into_iter()),
            "attribute_exists(id)"
        );
    }

    #[test]
    fn update_expression_collects_bindings() {
        let update = UpdateExpression::new("SET #t = :title")
            .name("#t", "title")
            .value(":title", AttributeValue::S("new".to_string()));
        let (expression, values, names) = update.into_parts();
        assert_eq!(expression, "SET #t = :title");
        assert_eq!(values.len(), 1);
        assert_eq!(names.get("#t").map(String::as_str), Some("title"));
    }
}
