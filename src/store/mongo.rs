//! MongoDB Document Store
//! Mission: Serve the collections from a MongoDB deployment (feature `mongo`)

use super::{
    Collection, DeleteResult, Document, DocumentStore, Filter, FindQuery, InsertOneResult,
    SortOrder, UpdateResult, ID_FIELD,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{self, doc, oid::ObjectId, Bson},
    options::{ClientOptions, FindOneOptions, FindOptions, ServerApi, ServerApiVersion},
    Client, Database,
};
use serde_json::Value;
use tracing::info;

/// Document store backed by the official MongoDB driver
pub struct MongoDocumentStore {
    database: Database,
}

impl MongoDocumentStore {
    /// Connect to `uri` and use database `database_name`.
    ///
    /// Uses the Stable API v1 in strict mode.
    pub async fn connect(uri: &str, database_name: &str) -> Result<Self> {
        let mut options = ClientOptions::parse(uri)
            .await
            .context("Invalid MongoDB connection string")?;
        options.server_api = Some(
            ServerApi::builder()
                .version(ServerApiVersion::V1)
                .strict(true)
                .deprecation_errors(true)
                .build(),
        );

        let client = Client::with_options(options).context("Failed to build MongoDB client")?;
        info!("🍃 MongoDB client ready for database {}", database_name);

        Ok(Self {
            database: client.database(database_name),
        })
    }

    fn collection(&self, collection: Collection) -> mongodb::Collection<bson::Document> {
        self.database.collection(collection.name())
    }
}

/// Escape regex metacharacters so the needle matches literally
fn escape_regex(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len());
    for c in needle.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Translate a filter; `None` when it can never match (an id that is not an ObjectId)
fn to_bson_filter(filter: &Filter) -> Option<bson::Document> {
    match filter {
        Filter::All => Some(doc! {}),
        Filter::ById(id) => ObjectId::parse_str(id)
            .ok()
            .map(|oid| doc! { ID_FIELD: oid }),
        Filter::FieldEq {
            field,
            value: Some(value),
        } => Some(doc! { *field: value.as_str() }),
        Filter::FieldEq { field, value: None } => Some(doc! { *field: Bson::Null }),
        Filter::Contains { field, needle } => Some(doc! {
            *field: { "$regex": escape_regex(needle), "$options": "i" }
        }),
    }
}

/// Convert a stored document to JSON, rendering an ObjectId `_id` as hex
fn to_json(mut document: bson::Document) -> Result<Document> {
    if let Ok(oid) = document.get_object_id(ID_FIELD) {
        document.insert(ID_FIELD, oid.to_hex());
    }
    match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!("Unexpected document shape: {}", other),
    }
}

fn to_bson(mut document: Document) -> Result<bson::Document> {
    document.remove(ID_FIELD);
    bson::to_document(&document).context("Document cannot be represented as BSON")
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn ping(&self) -> Result<()> {
        self.database
            .run_command(doc! { "ping": 1 }, None)
            .await
            .context("MongoDB ping failed")?;
        Ok(())
    }

    async fn find(&self, collection: Collection, query: &FindQuery) -> Result<Vec<Document>> {
        let Some(filter) = to_bson_filter(&query.filter) else {
            return Ok(Vec::new());
        };

        let sort = query.sort.as_ref().map(|sort| {
            let direction = match sort.order {
                SortOrder::Ascending => 1,
                SortOrder::Descending => -1,
            };
            doc! { sort.field: direction }
        });
        let options = FindOptions::builder()
            .sort(sort)
            .skip((query.skip > 0).then_some(query.skip))
            .limit(query.limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX)))
            .build();

        let cursor = self
            .collection(collection)
            .find(filter, options)
            .await
            .with_context(|| format!("find on {} failed", collection.name()))?;
        let documents: Vec<bson::Document> = cursor.try_collect().await?;

        documents.into_iter().map(to_json).collect()
    }

    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>> {
        let Some(filter) = to_bson_filter(filter) else {
            return Ok(None);
        };

        let found = self
            .collection(collection)
            .find_one(filter, FindOneOptions::default())
            .await
            .with_context(|| format!("findOne on {} failed", collection.name()))?;

        found.map(to_json).transpose()
    }

    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<InsertOneResult> {
        let result = self
            .collection(collection)
            .insert_one(to_bson(document)?, None)
            .await
            .with_context(|| format!("insertOne on {} failed", collection.name()))?;

        let inserted_id = match result.inserted_id {
            Bson::ObjectId(oid) => oid.to_hex(),
            other => other.to_string(),
        };

        Ok(InsertOneResult {
            acknowledged: true,
            inserted_id,
        })
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        set: Document,
    ) -> Result<UpdateResult> {
        let Some(filter) = to_bson_filter(filter) else {
            return Ok(UpdateResult::new(0, 0));
        };

        let result = self
            .collection(collection)
            .update_one(filter, doc! { "$set": to_bson(set)? }, None)
            .await
            .with_context(|| format!("updateOne on {} failed", collection.name()))?;

        Ok(UpdateResult::new(
            result.matched_count,
            result.modified_count,
        ))
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<DeleteResult> {
        let Some(filter) = to_bson_filter(filter) else {
            return Ok(DeleteResult::new(0));
        };

        let result = self
            .collection(collection)
            .delete_one(filter, None)
            .await
            .with_context(|| format!("deleteOne on {} failed", collection.name()))?;

        Ok(DeleteResult::new(result.deleted_count))
    }

    async fn estimated_count(&self, collection: Collection) -> Result<u64> {
        self.collection(collection)
            .estimated_document_count(None)
            .await
            .with_context(|| format!("count on {} failed", collection.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_regex() {
        assert_eq!(escape_regex("a.b*c"), r"a\.b\*c");
        assert_eq!(escape_regex("plain"), "plain");
    }

    #[test]
    fn test_invalid_object_id_matches_nothing() {
        assert!(to_bson_filter(&Filter::by_id("not-an-object-id")).is_none());
        assert!(to_bson_filter(&Filter::by_id("65a1f0c2b3d4e5f6a7b8c9d0")).is_some());
    }

    #[test]
    fn test_object_id_rendered_as_hex() {
        let oid = ObjectId::new();
        let json = to_json(doc! { "_id": oid, "title": "Villa" }).unwrap();
        assert_eq!(json["_id"], oid.to_hex());
        assert_eq!(json["title"], "Villa");
    }
}
