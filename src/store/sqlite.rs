//! SQLite Document Store
//! Mission: Keep JSON documents in one table per collection, queried with json_extract

use super::{
    Collection, DeleteResult, Document, DocumentStore, Filter, FindQuery, InsertOneResult,
    SortOrder, UpdateResult, ID_FIELD,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{
    functions::FunctionFlags, params, params_from_iter, types::Value as SqlValue, Connection,
    OptionalExtension,
};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Document store backed by a single SQLite connection.
///
/// Each table keeps an autoincrement `seq` column so that unsorted reads come
/// back in insertion order.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDocumentStore {
    /// Open (or create) a store at `db_path`
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open document db at {}", db_path))?;
        let store = Self::init(conn)?;
        info!("📂 Document store opened at {}", db_path);
        Ok(store)
    }

    /// Private store that disappears with the process
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory db")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        // SQLite's lower() folds ASCII only
        conn.create_scalar_function(
            FOLD_CASE,
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let text: Option<String> = ctx.get(0)?;
                Ok(text.map(|t| t.to_lowercase()))
            },
        )
        .context("Failed to register fold_case")?;

        for collection in Collection::ALL {
            conn.execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS \"{}\" (
                        seq INTEGER PRIMARY KEY AUTOINCREMENT,
                        id TEXT NOT NULL UNIQUE,
                        doc TEXT NOT NULL
                    )",
                    collection.name()
                ),
                [],
            )
            .with_context(|| format!("Failed to create table {}", collection.name()))?;
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

/// Unicode-aware lowercase, registered on every connection
const FOLD_CASE: &str = "fold_case";

fn json_path(field: &str) -> String {
    format!("$.{}", field)
}

/// Render `filter` as a WHERE condition, pushing its bound values onto `params`
fn where_clause(filter: &Filter, params: &mut Vec<SqlValue>) -> String {
    match filter {
        Filter::All => "1 = 1".to_string(),
        Filter::ById(id) => {
            params.push(SqlValue::Text(id.clone()));
            format!("id = ?{}", params.len())
        }
        Filter::FieldEq {
            field,
            value: Some(value),
        } => {
            params.push(SqlValue::Text(value.clone()));
            format!(
                "json_extract(doc, '{}') = ?{}",
                json_path(field),
                params.len()
            )
        }
        Filter::FieldEq { field, value: None } => {
            format!("json_extract(doc, '{}') IS NULL", json_path(field))
        }
        Filter::Contains { field, needle } => {
            params.push(SqlValue::Text(needle.to_lowercase()));
            format!(
                "instr({}(CAST(coalesce(json_extract(doc, '{}'), '') AS TEXT)), ?{}) > 0",
                FOLD_CASE,
                json_path(field),
                params.len()
            )
        }
    }
}

fn to_sql_int(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn decode(raw: &str) -> Result<Document> {
    serde_json::from_str(raw).context("Stored document is not a JSON object")
}

fn first_match(
    conn: &Connection,
    collection: Collection,
    filter: &Filter,
) -> Result<Option<(i64, Document)>> {
    let mut params = Vec::new();
    let sql = format!(
        "SELECT seq, doc FROM \"{}\" WHERE {} ORDER BY seq LIMIT 1",
        collection.name(),
        where_clause(filter, &mut params)
    );

    let row = conn
        .query_row(&sql, params_from_iter(params.iter()), |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })
        .optional()?;

    match row {
        Some((seq, raw)) => Ok(Some((seq, decode(&raw)?))),
        None => Ok(None),
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .context("SQLite ping failed")?;
        Ok(())
    }

    async fn find(&self, collection: Collection, query: &FindQuery) -> Result<Vec<Document>> {
        let mut params = Vec::new();
        let mut sql = format!(
            "SELECT doc FROM \"{}\" WHERE {}",
            collection.name(),
            where_clause(&query.filter, &mut params)
        );

        match &query.sort {
            Some(sort) => {
                let direction = match sort.order {
                    SortOrder::Ascending => "ASC",
                    SortOrder::Descending => "DESC",
                };
                sql.push_str(&format!(
                    " ORDER BY json_extract(doc, '{}') {}, seq",
                    json_path(sort.field),
                    direction
                ));
            }
            None => sql.push_str(" ORDER BY seq"),
        }

        // SQLite needs a LIMIT before OFFSET; -1 is unbounded
        let limit = query.limit.map(to_sql_int).unwrap_or(-1);
        sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, to_sql_int(query.skip)));

        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!(
            collection = collection.name(),
            matched = rows.len(),
            "find"
        );

        rows.iter().map(|raw| decode(raw)).collect()
    }

    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>> {
        let conn = self.conn.lock().await;
        Ok(first_match(&conn, collection, filter)?.map(|(_, doc)| doc))
    }

    async fn insert_one(
        &self,
        collection: Collection,
        mut document: Document,
    ) -> Result<InsertOneResult> {
        let id = Uuid::new_v4().simple().to_string();
        document.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        let raw = serde_json::to_string(&document)?;

        let conn = self.conn.lock().await;
        conn.execute(
            &format!("INSERT INTO \"{}\" (id, doc) VALUES (?1, ?2)", collection.name()),
            params![id, raw],
        )
        .with_context(|| format!("Failed to insert into {}", collection.name()))?;

        Ok(InsertOneResult {
            acknowledged: true,
            inserted_id: id,
        })
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        set: Document,
    ) -> Result<UpdateResult> {
        let conn = self.conn.lock().await;
        let Some((seq, mut doc)) = first_match(&conn, collection, filter)? else {
            return Ok(UpdateResult::new(0, 0));
        };

        let mut modified = false;
        for (field, value) in set {
            if field == ID_FIELD {
                continue;
            }
            if doc.get(&field) != Some(&value) {
                doc.insert(field, value);
                modified = true;
            }
        }

        if modified {
            conn.execute(
                &format!("UPDATE \"{}\" SET doc = ?1 WHERE seq = ?2", collection.name()),
                params![serde_json::to_string(&doc)?, seq],
            )
            .with_context(|| format!("Failed to update {}", collection.name()))?;
        }

        Ok(UpdateResult::new(1, u64::from(modified)))
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<DeleteResult> {
        let mut params = Vec::new();
        let table = collection.name();
        let sql = format!(
            "DELETE FROM \"{table}\" WHERE seq = (SELECT seq FROM \"{table}\" WHERE {} ORDER BY seq LIMIT 1)",
            where_clause(filter, &mut params)
        );

        let conn = self.conn.lock().await;
        let deleted = conn
            .execute(&sql, params_from_iter(params.iter()))
            .with_context(|| format!("Failed to delete from {}", table))?;

        Ok(DeleteResult::new(deleted as u64))
    }

    async fn estimated_count(&self, collection: Collection) -> Result<u64> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\"", collection.name()),
            [],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Sort;
    use serde_json::json;
    use tempfile::NamedTempFile;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    async fn seed_properties(store: &SqliteDocumentStore) {
        for (title, price) in [
            ("Lake House", 250_000),
            ("City Loft", 410_000),
            ("lakeside cabin", 120_000),
            ("Farm", 90_000),
        ] {
            store
                .insert_one(
                    Collection::Properties,
                    doc(json!({ "title": title, "price": price })),
                )
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_by_id() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        let result = store
            .insert_one(Collection::Reviews, doc(json!({ "rating": 5 })))
            .await
            .unwrap();
        assert!(result.acknowledged);

        let found = store
            .find_one(Collection::Reviews, &Filter::by_id(&result.inserted_id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found["rating"], 5);
        assert_eq!(found[ID_FIELD], result.inserted_id.as_str());
    }

    #[tokio::test]
    async fn test_insert_replaces_client_id() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        let result = store
            .insert_one(Collection::Reviews, doc(json!({ "_id": "chosen" })))
            .await
            .unwrap();
        assert_ne!(result.inserted_id, "chosen");
    }

    #[tokio::test]
    async fn test_field_equality_filter() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        for email in ["a@x.com", "b@x.com", "a@x.com"] {
            store
                .insert_one(Collection::WishList, doc(json!({ "email": email })))
                .await
                .unwrap();
        }
        store
            .insert_one(Collection::WishList, doc(json!({ "note": "anonymous" })))
            .await
            .unwrap();

        let mine = store
            .find(
                Collection::WishList,
                &FindQuery::new(Filter::eq("email", "a@x.com")),
            )
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);

        let no_email = store
            .find(
                Collection::WishList,
                &FindQuery::new(Filter::FieldEq {
                    field: "email",
                    value: None,
                }),
            )
            .await
            .unwrap();
        assert_eq!(no_email.len(), 1);
        assert_eq!(no_email[0]["note"], "anonymous");
    }

    #[tokio::test]
    async fn test_search_sort_and_paginate() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        seed_properties(&store).await;

        let query = FindQuery {
            filter: Filter::Contains {
                field: "title",
                needle: "LAKE".to_string(),
            },
            sort: Some(Sort {
                field: "price",
                order: SortOrder::Ascending,
            }),
            skip: 0,
            limit: None,
        };
        let lakes = store.find(Collection::Properties, &query).await.unwrap();
        let titles: Vec<&str> = lakes.iter().map(|d| d["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["lakeside cabin", "Lake House"]);

        let page = FindQuery {
            filter: Filter::All,
            sort: Some(Sort {
                field: "price",
                order: SortOrder::Descending,
            }),
            skip: 1,
            limit: Some(2),
        };
        let second_page = store.find(Collection::Properties, &page).await.unwrap();
        let prices: Vec<i64> = second_page
            .iter()
            .map(|d| d["price"].as_i64().unwrap())
            .collect();
        assert_eq!(prices, vec![250_000, 120_000]);
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_case() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        for title in ["ÉLAN Residence", "Straße Nord", "Plain Flat"] {
            store
                .insert_one(Collection::Properties, doc(json!({ "title": title })))
                .await
                .unwrap();
        }

        let search = |needle: &str| FindQuery {
            filter: Filter::Contains {
                field: "title",
                needle: needle.to_string(),
            },
            sort: None,
            skip: 0,
            limit: None,
        };

        let accented = store
            .find(Collection::Properties, &search("élan"))
            .await
            .unwrap();
        assert_eq!(accented.len(), 1);
        assert_eq!(accented[0]["title"], "ÉLAN Residence");

        let upper = store
            .find(Collection::Properties, &search("STRASSE"))
            .await
            .unwrap();
        assert!(upper.is_empty());

        let umlaut = store
            .find(Collection::Properties, &search("STRAßE"))
            .await
            .unwrap();
        assert_eq!(umlaut.len(), 1);
    }

    #[tokio::test]
    async fn test_update_counts() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        let inserted = store
            .insert_one(Collection::Users, doc(json!({ "email": "u@x.com" })))
            .await
            .unwrap();
        let filter = Filter::by_id(&inserted.inserted_id);

        let first = store
            .update_one(Collection::Users, &filter, doc(json!({ "role": "agent" })))
            .await
            .unwrap();
        assert_eq!((first.matched_count, first.modified_count), (1, 1));

        let again = store
            .update_one(Collection::Users, &filter, doc(json!({ "role": "agent" })))
            .await
            .unwrap();
        assert_eq!((again.matched_count, again.modified_count), (1, 0));

        let missing = store
            .update_one(
                Collection::Users,
                &Filter::by_id("nope"),
                doc(json!({ "role": "admin" })),
            )
            .await
            .unwrap();
        assert_eq!((missing.matched_count, missing.modified_count), (0, 0));

        let user = store.find_one(Collection::Users, &filter).await.unwrap().unwrap();
        assert_eq!(user["role"], "agent");
    }

    #[tokio::test]
    async fn test_delete_missing_is_zero() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        let inserted = store
            .insert_one(Collection::Reviews, doc(json!({ "text": "nice" })))
            .await
            .unwrap();

        let missing = store
            .delete_one(Collection::Reviews, &Filter::by_id("does-not-exist"))
            .await
            .unwrap();
        assert_eq!(missing.deleted_count, 0);

        let deleted = store
            .delete_one(Collection::Reviews, &Filter::by_id(&inserted.inserted_id))
            .await
            .unwrap();
        assert_eq!(deleted.deleted_count, 1);
        assert_eq!(store.estimated_count(Collection::Reviews).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_file_backed_store_persists() {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();

        {
            let store = SqliteDocumentStore::new(db_path).unwrap();
            seed_properties(&store).await;
            store.ping().await.unwrap();
        }

        let reopened = SqliteDocumentStore::new(db_path).unwrap();
        assert_eq!(
            reopened
                .estimated_count(Collection::Properties)
                .await
                .unwrap(),
            4
        );
    }
}
