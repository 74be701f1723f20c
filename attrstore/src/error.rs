/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Errors surfaced by store clients and data access objects.

use std::error::Error;
use std::fmt;

/// A boxed error that is `Send` and `Sync`.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Failure reported by a [`StoreClient`](crate::StoreClient) implementation.
///
/// Implementations translate their backend's failures into these variants;
/// the [`Dao`](crate::Dao) turns them into [`DaoError`]s with operation
/// context attached.
#[derive(Debug)]
#[non_exhaustive]
pub enum StoreError {
    /// The addressed table does not exist.
    ResourceNotFound {
        /// Backend-provided detail.
        message: String,
    },
    /// The addressed table already exists or is busy changing state.
    ResourceInUse {
        /// Backend-provided detail.
        message: String,
    },
    /// A condition expression evaluated to false.
    ConditionalCheckFailed {
        /// Backend-provided detail.
        message: String,
    },
    /// The backend rejected the request for any other reason.
    Service {
        /// Backend-provided detail.
        message: String,
    },
    /// The request never produced a backend response.
    Dispatch {
        /// The underlying transport failure.
        source: BoxError,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::ResourceNotFound { message } => {
                write!(f, "resource not found: {}", message)
            }
            StoreError::ResourceInUse { message } => write!(f, "resource in use: {}", message),
            StoreError::ConditionalCheckFailed { message } => {
                write!(f, "conditional check failed: {}", message)
            }
            StoreError::Service { message } => write!(f, "service error: {}", message),
            StoreError::Dispatch { source } => {
                write!(f, "failed to dispatch the request: {}", source)
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::Dispatch { source } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Failure of a [`Dao`](crate::Dao) operation.
#[derive(Debug)]
pub struct DaoError {
    kind: DaoErrorKind,
    table: String,
}

/// The kind of data access failure that occurred.
#[derive(Debug)]
#[non_exhaustive]
pub enum DaoErrorKind {
    /// The table does not exist.
    TableDoesNotExist,
    /// The table already exists.
    TableExists,
    /// An insert found an item already stored under the key.
    CouldNotInsert,
    /// An update addressed an item that is not stored.
    CouldNotUpdate,
    /// A delete addressed an item that is not stored.
    CouldNotDelete,
    /// A read found no item under the key.
    ItemDoesNotExist,
    /// The store failed in a way the operation could not absorb.
    DataAccess {
        /// The store operation that failed.
        operation: &'static str,
        /// The underlying failure.
        source: BoxError,
    },
}

impl DaoError {
    pub(crate) fn table_does_not_exist(table: impl Into<String>) -> Self {
        Self {
            kind: DaoErrorKind::TableDoesNotExist,
            table: table.into(),
        }
    }

    pub(crate) fn table_exists(table: impl Into<String>) -> Self {
        Self {
            kind: DaoErrorKind::TableExists,
            table: table.into(),
        }
    }

    pub(crate) fn could_not_insert(table: impl Into<String>) -> Self {
        Self {
            kind: DaoErrorKind::CouldNotInsert,
            table: table.into(),
        }
    }

    pub(crate) fn could_not_update(table: impl Into<String>) -> Self {
        Self {
            kind: DaoErrorKind::CouldNotUpdate,
            table: table.into(),
        }
    }

    pub(crate) fn could_not_delete(table: impl Into<String>) -> Self {
        Self {
            kind: DaoErrorKind::CouldNotDelete,
            table: table.into(),
        }
    }

    pub(crate) fn item_does_not_exist(table: impl Into<String>) -> Self {
        Self {
            kind: DaoErrorKind::ItemDoesNotExist,
            table: table.into(),
        }
    }

    pub(crate) fn data_access(
        table: impl Into<String>,
        operation: &'static str,
        source: BoxError,
    ) -> Self {
        Self {
            kind: DaoErrorKind::DataAccess { operation, source },
            table: table.into(),
        }
    }

    /// Returns the kind of failure.
    pub fn kind(&self) -> &DaoErrorKind {
        &self.kind
    }

    /// Returns the table the operation addressed.
    pub fn table(&self) -> &str {
        &self.table
    }
}

impl fmt::Display for DaoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DaoErrorKind::TableDoesNotExist => {
                write!(f, "table '{}' does not exist", self.table)
            }
            DaoErrorKind::TableExists => write!(f, "table '{}' already exists", self.table),
            DaoErrorKind::CouldNotInsert => {
                write!(
                    f,
                    "could not insert into table '{}': the conditional check failed",
                    self.table
                )
            }
            DaoErrorKind::CouldNotUpdate => {
                write!(
                    f,
                    "could not update table '{}': the conditional check failed",
                    self.table
                )
            }
            DaoErrorKind::CouldNotDelete => {
                write!(
                    f,
                    "could not delete from table '{}': the conditional check failed",
                    self.table
                )
            }
            DaoErrorKind::ItemDoesNotExist => {
                write!(
                    f,
                    "no item found in table '{}' for the given key",
                    self.table
                )
            }
            DaoErrorKind::DataAccess { operation, source } => {
                write!(
                    f,
                    "operation '{}' failed on table '{}': {}",
                    operation, self.table, source
                )
            }
        }
    }
}

impl Error for DaoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            DaoErrorKind::DataAccess { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
