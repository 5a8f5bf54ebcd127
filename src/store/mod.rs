//! Document Store
//! Mission: Hold the six listing collections behind one async interface

pub mod sqlite;

#[cfg(feature = "mongo")]
pub mod mongo;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

pub use sqlite::SqliteDocumentStore;

#[cfg(feature = "mongo")]
pub use mongo::MongoDocumentStore;

/// A stored document. The identifier lives under `_id` as a string.
pub type Document = Map<String, Value>;

/// Field holding a document's identifier
pub const ID_FIELD: &str = "_id";

/// The collections the backend knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Properties,
    Reviews,
    Advertise,
    WishList,
    AgentAddedItems,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Users,
        Collection::Properties,
        Collection::Reviews,
        Collection::Advertise,
        Collection::WishList,
        Collection::AgentAddedItems,
    ];

    /// Name of the collection (also the SQLite table name)
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Properties => "properties",
            Collection::Reviews => "reviews",
            Collection::Advertise => "advertise",
            Collection::WishList => "wishList",
            Collection::AgentAddedItems => "agentAddedItems",
        }
    }
}

/// Which documents an operation applies to.
///
/// Field names are always compile-time constants chosen by the handlers,
/// never request input.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    ById(String),
    /// Equality on a top-level string field; `None` matches documents where
    /// the field is missing or null.
    FieldEq {
        field: &'static str,
        value: Option<String>,
    },
    /// Case-insensitive substring match on a top-level field
    Contains { field: &'static str, needle: String },
}

impl Filter {
    pub fn by_id(id: impl Into<String>) -> Self {
        Filter::ById(id.into())
    }

    pub fn eq(field: &'static str, value: impl Into<String>) -> Self {
        Filter::FieldEq {
            field,
            value: Some(value.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: &'static str,
    pub order: SortOrder,
}

/// Parameters of a `find`
#[derive(Debug, Clone, PartialEq)]
pub struct FindQuery {
    pub filter: Filter,
    pub sort: Option<Sort>,
    pub skip: u64,
    /// `None` means no limit
    pub limit: Option<u64>,
}

impl FindQuery {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            sort: None,
            skip: 0,
            limit: None,
        }
    }

    pub fn all() -> Self {
        Self::new(Filter::All)
    }
}

/// Outcome of `insert_one`, serialized the way the document database reports it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    pub acknowledged: bool,
    pub inserted_id: String,
}

/// Outcome of `update_one`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<String>,
    pub upserted_count: u64,
}

impl UpdateResult {
    pub fn new(matched_count: u64, modified_count: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_id: None,
            upserted_count: 0,
        }
    }
}

/// Outcome of `delete_one`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteResult {
    pub fn new(deleted_count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count,
        }
    }
}

/// Operations every store backend provides.
///
/// Each call is one round-trip; nothing is cached between calls.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Check the backend is reachable
    async fn ping(&self) -> Result<()>;

    async fn find(&self, collection: Collection, query: &FindQuery) -> Result<Vec<Document>>;

    /// First document matching `filter` in natural order
    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>>;

    /// Insert a document. An `_id` already present in `document` is replaced
    /// by a freshly generated one.
    async fn insert_one(&self, collection: Collection, document: Document)
        -> Result<InsertOneResult>;

    /// Set the given fields on the first document matching `filter`
    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        set: Document,
    ) -> Result<UpdateResult>;

    /// Delete the first document matching `filter`
    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<DeleteResult>;

    async fn estimated_count(&self, collection: Collection) -> Result<u64>;
}
