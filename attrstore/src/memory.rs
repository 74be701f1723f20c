/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! An in-process store for tests.
//!
//! [`MemoryStore`] implements [`StoreClient`] against tables held in a
//! mutex, with the same observable semantics a real backend provides:
//! conditional writes, upserting updates, stable scan order and
//! limit-before-filter pagination. Items sit in a `BTreeMap` keyed by a
//! fingerprint of their key attributes, which is what gives scans their
//! stable order.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use attrstore_types::{AttributeMap, AttributeValue};

use crate::client::{
    CreateTableInput, DeleteItemInput, DeleteItemOutput, GetItemInput, GetItemOutput, KeyRole,
    PutItemInput, PutItemOutput, ReturnValues, ScanInput, ScanOutput, StoreClient, UpdateItemInput,
    UpdateItemOutput,
};
use crate::error::StoreError;

/// An in-memory [`StoreClient`].
///
/// Clones share the same tables, the way a real client handle shares its
/// connection state.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<HashMap<String, Table>>>,
}

#[derive(Debug)]
struct Table {
    key_names: Vec<String>,
    items: BTreeMap<String, AttributeMap>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn create_table(&self, input: CreateTableInput) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.contains_key(&input.table_name) {
            return Err(StoreError::ResourceInUse {
                message: format!("table '{}' already exists", input.table_name),
            });
        }
        if !input
            .schema
            .key_schema
            .iter()
            .any(|element| element.role == KeyRole::Hash)
        {
            return Err(StoreError::Service {
                message: "the key schema must contain a hash key".to_string(),
            });
        }
        let mut key_names = Vec::with_capacity(input.schema.key_schema.len());
        for role in [KeyRole::Hash, KeyRole::Range] {
            for element in &input.schema.key_schema {
                if element.role == role {
                    key_names.push(element.attribute_name.clone());
                }
            }
        }
        tables.insert(
            input.table_name,
            Table {
                key_names,
                items: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn get_item(&self, input: GetItemInput) -> Result<GetItemOutput, StoreError> {
        let tables = self.tables.lock().unwrap();
        let table = lookup(&tables, &input.table_name)?;
        let fingerprint = fingerprint(&table.key_names, &input.key)?;
        Ok(GetItemOutput {
            item: table.items.get(&fingerprint).cloned(),
        })
    }

    async fn put_item(&self, input: PutItemInput) -> Result<PutItemOutput, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let table = lookup_mut(&mut tables, &input.table_name)?;
        let fingerprint = fingerprint(&table.key_names, &input.item)?;
        if let Some(condition) = &input.condition_expression {
            let current = table.items.get(&fingerprint);
            if !evaluate_condition(condition, &HashMap::new(), current)? {
                return Err(conditional_failure());
            }
        }
        let previous = table.items.insert(fingerprint, input.item);
        Ok(PutItemOutput {
            attributes: match input.return_values {
                ReturnValues::AllOld => previous,
                _ => None,
            },
        })
    }

    async fn update_item(&self, input: UpdateItemInput) -> Result<UpdateItemOutput, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let table = lookup_mut(&mut tables, &input.table_name)?;
        let fingerprint = fingerprint(&table.key_names, &input.key)?;
        let previous = table.items.get(&fingerprint).cloned();
        if let Some(condition) = &input.condition_expression {
            if !evaluate_condition(condition, &input.expression_names, previous.as_ref())? {
                return Err(conditional_failure());
            }
        }
        let mut item = match &previous {
            Some(previous) => previous.clone(),
            None => input.key.clone(),
        };
        apply_update(
            &mut item,
            &input.update_expression,
            &input.expression_values,
            &input.expression_names,
        )?;
        table.items.insert(fingerprint, item.clone());
        Ok(UpdateItemOutput {
            attributes: match input.return_values {
                ReturnValues::AllNew => Some(item),
                ReturnValues::AllOld => previous,
                ReturnValues::None => None,
            },
        })
    }

    async fn delete_item(&self, input: DeleteItemInput) -> Result<DeleteItemOutput, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let table = lookup_mut(&mut tables, &input.table_name)?;
        let fingerprint = fingerprint(&table.key_names, &input.key)?;
        if let Some(condition) = &input.condition_expression {
            let current = table.items.get(&fingerprint);
            if !evaluate_condition(condition, &HashMap::new(), current)? {
                return Err(conditional_failure());
            }
        }
        let previous = table.items.remove(&fingerprint);
        Ok(DeleteItemOutput {
            attributes: match input.return_values {
                ReturnValues::AllOld => previous,
                _ => None,
            },
        })
    }

    async fn scan(&self, input: ScanInput) -> Result<ScanOutput, StoreError> {
        let tables = self.tables.lock().unwrap();
        let table = lookup(&tables, &input.table_name)?;
        let start = match &input.exclusive_start_key {
            Some(key) => Some(fingerprint(&table.key_names, key)?),
            None => None,
        };
        let limit = match input.limit {
            Some(0) => {
                return Err(StoreError::Service {
                    message: "limit must be at least 1".to_string(),
                })
            }
            Some(limit) => limit,
            None => usize::MAX,
        };

        let mut items = Vec::new();
        let mut evaluated = 0usize;
        let mut last_evaluated: Option<&AttributeMap> = None;
        let mut truncated = false;
        for (fp, item) in table.items.iter() {
            if let Some(start) = &start {
                if fp <= start {
                    continue;
                }
            }
            if evaluated == limit {
                truncated = true;
                break;
            }
            evaluated += 1;
            last_evaluated = Some(item);
            if passes_filter(
                item,
                input.filter_expression.as_deref(),
                &input.expression_values,
                &input.expression_names,
            )? {
                items.push(item.clone());
            }
        }

        let last_evaluated_key = match (truncated, last_evaluated) {
            (true, Some(item)) => Some(key_attributes_of(&table.key_names, item)?),
            _ => None,
        };

        Ok(ScanOutput {
            items,
            last_evaluated_key,
        })
    }
}

fn lookup<'a>(tables: &'a HashMap<String, Table>, name: &str) -> Result<&'a Table, StoreError> {
    tables.get(name).ok_or_else(|| StoreError::ResourceNotFound {
        message: format!("table '{}' does not exist", name),
    })
}

fn lookup_mut<'a>(
    tables: &'a mut HashMap<String, Table>,
    name: &str,
) -> Result<&'a mut Table, StoreError> {
    tables
        .get_mut(name)
        .ok_or_else(|| StoreError::ResourceNotFound {
            message: format!("table '{}' does not exist", name),
        })
}

/// Builds the ordering key an item is stored under. Key attributes must be
/// present and `S` or `N` typed.
fn fingerprint(key_names: &[String], item: &AttributeMap) -> Result<String, StoreError> {
    let mut parts = Vec::with_capacity(key_names.len());
    for name in key_names {
        let value = item.get(name).ok_or_else(|| StoreError::Service {
            message: format!("key attribute '{}' is missing", name),
        })?;
        match value {
            AttributeValue::S(s) => parts.push(format!("S:{}", s)),
            AttributeValue::N(n) => parts.push(format!("N:{}", n)),
            other => {
                return Err(StoreError::Service {
                    message: format!(
                        "key attribute '{}' must be S or N, got {}",
                        name,
                        other.type_label()
                    ),
                })
            }
        }
    }
    Ok(parts.join("\u{1f}"))
}

fn key_attributes_of(key_names: &[String], item: &AttributeMap) -> Result<AttributeMap, StoreError> {
    let mut key = AttributeMap::with_capacity(key_names.len());
    for name in key_names {
        let value = item.get(name).ok_or_else(|| StoreError::Service {
            message: format!("key attribute '{}' is missing", name),
        })?;
        key.insert(name.clone(), value.clone());
    }
    Ok(key)
}

fn conditional_failure() -> StoreError {
    StoreError::ConditionalCheckFailed {
        message: "the conditional request failed".to_string(),
    }
}

fn unsupported_expression(clause: &str) -> StoreError {
    StoreError::Service {
        message: format!("unsupported expression: '{}'", clause),
    }
}

/// Evaluates ` AND `-joined `attribute_exists(..)` and
/// `attribute_not_exists(..)` clauses against the current item.
fn evaluate_condition(
    expression: &str,
    names: &HashMap<String, String>,
    current: Option<&AttributeMap>,
) -> Result<bool, StoreError> {
    for clause in expression.split(" AND ") {
        let clause = clause.trim();
        let passed = if let Some(rest) = clause.strip_prefix("attribute_not_exists(") {
            !attribute_present(current, &parse_argument(rest, names)?)
        } else if let Some(rest) = clause.strip_prefix("attribute_exists(") {
            attribute_present(current, &parse_argument(rest, names)?)
        } else {
            return Err(unsupported_expression(clause));
        };
        if !passed {
            return Ok(false);
        }
    }
    Ok(true)
}

fn parse_argument(rest: &str, names: &HashMap<String, String>) -> Result<String, StoreError> {
    let argument = rest
        .strip_suffix(')')
        .ok_or_else(|| unsupported_expression(rest))?;
    resolve_name(argument.trim(), names)
}

fn attribute_present(current: Option<&AttributeMap>, attribute: &str) -> bool {
    current
        .map(|item| item.contains_key(attribute))
        .unwrap_or(false)
}

fn resolve_name(token: &str, names: &HashMap<String, String>) -> Result<String, StoreError> {
    if token.starts_with('#') {
        names.get(token).cloned().ok_or_else(|| StoreError::Service {
            message: format!("expression attribute name '{}' is not defined", token),
        })
    } else {
        Ok(token.to_string())
    }
}

fn lookup_value<'a>(
    values: &'a AttributeMap,
    placeholder: &str,
) -> Result<&'a AttributeValue, StoreError> {
    values.get(placeholder).ok_or_else(|| StoreError::Service {
        message: format!(
            "expression attribute value '{}' is not defined",
            placeholder
        ),
    })
}

enum Keyword {
    Set,
    Remove,
}

fn keyword(token: &str) -> Option<Keyword> {
    if token.eq_ignore_ascii_case("SET") {
        Some(Keyword::Set)
    } else if token.eq_ignore_ascii_case("REMOVE") {
        Some(Keyword::Remove)
    } else {
        None
    }
}

fn split_clauses(expression: &str) -> Result<Vec<(Keyword, String)>, StoreError> {
    let mut clauses: Vec<(Keyword, String)> = Vec::new();
    for token in expression.split_whitespace() {
        match keyword(token) {
            Some(keyword) => clauses.push((keyword, String::new())),
            None => match clauses.last_mut() {
                Some((_, body)) => {
                    if !body.is_empty() {
                        body.push(' ');
                    }
                    body.push_str(token);
                }
                None => return Err(unsupported_expression(expression)),
            },
        }
    }
    if clauses.is_empty() {
        return Err(unsupported_expression(expression));
    }
    Ok(clauses)
}

/// Applies the `SET`/`REMOVE` subset of the update expression language.
fn apply_update(
    item: &mut AttributeMap,
    expression: &str,
    values: &AttributeMap,
    names: &HashMap<String, String>,
) -> Result<(), StoreError> {
    for (keyword, body) in split_clauses(expression)? {
        match keyword {
            Keyword::Set => {
                for assignment in body.split(',') {
                    let (target, placeholder) = assignment
                        .split_once('=')
                        .ok_or_else(|| unsupported_expression(assignment))?;
                    let target = resolve_name(target.trim(), names)?;
                    let value = lookup_value(values, placeholder.trim())?;
                    item.insert(target, value.clone());
                }
            }
            Keyword::Remove => {
                for target in body.split(',') {
                    let target = resolve_name(target.trim(), names)?;
                    item.remove(&target);
                }
            }
        }
    }
    Ok(())
}

/// Applies ` AND `-joined `attribute = :placeholder` equality clauses.
fn passes_filter(
    item: &AttributeMap,
    filter: Option<&str>,
    values: &AttributeMap,
    names: &HashMap<String, String>,
) -> Result<bool, StoreError> {
    let filter = match filter {
        Some(filter) => filter,
        None => return Ok(true),
    };
    for clause in filter.split(" AND ") {
        let (attribute, placeholder) = clause
            .split_once('=')
            .ok_or_else(|| unsupported_expression(clause))?;
        let attribute = resolve_name(attribute.trim(), names)?;
        let expected = lookup_value(values, placeholder.trim())?;
        if item.get(&attribute) != Some(expected) {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{KeyAttributeType, TableSchema};

    fn item(id: &str, extra: Option<(&str, AttributeValue)>) -> AttributeMap {
        let mut item = AttributeMap::new();
        item.insert("id".to_string(), AttributeValue::S(id.to_string()));
        if let Some((name, value)) = extra {
            item.insert(name.to_string(), value);
        }
        item
    }

    async fn store_with_table() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .create_table(CreateTableInput {
                table_name: "t".to_string(),
                schema: TableSchema::hash("id", KeyAttributeType::S),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn unknown_tables_are_resource_not_found() {
        let store = MemoryStore::new();
        let err = store
            .get_item(GetItemInput {
                table_name: "nope".to_string(),
                key: item("x", None),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ResourceNotFound { .. }));
    }

    #[tokio::test]
    async fn creating_a_table_twice_is_resource_in_use() {
        let store = store_with_table().await;
        let err = store
            .create_table(CreateTableInput {
                table_name: "t".to_string(),
                schema: TableSchema::hash("id", KeyAttributeType::S),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ResourceInUse { .. }));
    }

    #[tokio::test]
    async fn conditional_put_guards_existing_items() {
        let store = store_with_table().await;
        let put = |item: AttributeMap| PutItemInput {
            table_name: "t".to_string(),
            item,
            condition_expression: Some("attribute_not_exists(id)".to_string()),
            return_values: ReturnValues::None,
        };

        store.put_item(put(item("a", None))).await.unwrap();
        let err = store.put_item(put(item("a", None))).await.unwrap_err();
        assert!(matches!(err, StoreError::ConditionalCheckFailed { .. }));
    }

    #[tokio::test]
    async fn update_applies_set_and_remove() {
        let store = store_with_table().await;
        store
            .put_item(PutItemInput {
                table_name: "t".to_string(),
                item: item("a", Some(("old", AttributeValue::Bool(true)))),
                condition_expression: None,
                return_values: ReturnValues::None,
            })
            .await
            .unwrap();

        let mut values = AttributeMap::new();
        values.insert(":plays".to_string(), AttributeValue::N("3".to_string()));
        let mut names = HashMap::new();
        names.insert("#p".to_string(), "plays".to_string());
        let output = store
            .update_item(UpdateItemInput {
                table_name: "t".to_string(),
                key: item("a", None),
                update_expression: "SET #p = :plays REMOVE old".to_string(),
                expression_values: values,
                expression_names: names,
                condition_expression: Some("attribute_exists(id)".to_string()),
                return_values: ReturnValues::AllNew,
            })
            .await
            .unwrap();

        let image = output.attributes.unwrap();
        assert_eq!(image.get("plays"), Some(&AttributeValue::N("3".to_string())));
        assert!(!image.contains_key("old"));
    }

    #[tokio::test]
    async fn unsupported_expressions_are_service_errors() {
        let store = store_with_table().await;
        let err = store
            .update_item(UpdateItemInput {
                table_name: "t".to_string(),
                key: item("a", None),
                update_expression: "ADD plays :one".to_string(),
                expression_values: AttributeMap::new(),
                expression_names: HashMap::new(),
                condition_expression: None,
                return_values: ReturnValues::None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Service { .. }));
        assert!(err.to_string().contains("unsupported expression"));
    }

    #[tokio::test]
    async fn scan_limit_counts_evaluated_items_before_filtering() {
        let store = store_with_table().await;
        for id in ["a", "b", "c", "d"] {
            let flagged = AttributeValue::Bool(id == "c");
            store
                .put_item(PutItemInput {
                    table_name: "t".to_string(),
                    item: item(id, Some(("flagged", flagged))),
                    condition_expression: None,
                    return_values: ReturnValues::None,
                })
                .await
                .unwrap();
        }

        let mut values = AttributeMap::new();
        values.insert(":yes".to_string(), AttributeValue::Bool(true));
        let output = store
            .scan(ScanInput {
                table_name: "t".to_string(),
                filter_expression: Some("flagged = :yes".to_string()),
                expression_values: values,
                expression_names: HashMap::new(),
                limit: Some(2),
                exclusive_start_key: None,
            })
            .await
            .unwrap();

        // Two items were evaluated ("a" and "b"), neither passed the filter.
        assert!(output.items.is_empty());
        let resume = output.last_evaluated_key.unwrap();
        assert_eq!(resume.get("id"), Some(&AttributeValue::S("b".to_string())));
    }

    #[tokio::test]
    async fn scan_reports_no_cursor_at_the_end() {
        let store = store_with_table().await;
        for id in ["a", "b"] {
            store
                .put_item(PutItemInput {
                    table_name: "t".to_string(),
                    item: item(id, None),
                    condition_expression: None,
                    return_values: ReturnValues::None,
                })
                .await
                .unwrap();
        }

        let output = store
            .scan(ScanInput {
                table_name: "t".to_string(),
                limit: Some(2),
                ..ScanInput::default()
            })
            .await
            .unwrap();
        assert_eq!(output.items.len(), 2);
        assert!(output.last_evaluated_key.is_none());
    }

    #[tokio::test]
    async fn non_key_safe_attributes_are_rejected() {
        let store = store_with_table().await;
        let err = store
            .put_item(PutItemInput {
                table_name: "t".to_string(),
                item: {
                    let mut item = AttributeMap::new();
                    item.insert("id".to_string(), AttributeValue::Bool(true));
                    item
                },
                condition_expression: None,
                return_values: ReturnValues::None,
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("must be S or N"));
    }
}
