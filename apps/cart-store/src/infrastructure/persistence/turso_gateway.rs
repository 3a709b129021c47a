//! Turso document gateway.
//!
//! Stores documents as JSON text in a single `documents` table on an
//! embedded Turso (SQLite-compatible) database.
//!
//! Writes run in a transaction that first looks up the row matching the
//! filter. An upsert overwrites that row wherever it lives, and only inserts
//! under the filter's canonical key when nothing matches; a delete removes
//! that one row by primary key. Writes run on a spawned task, so a caller
//! dropping the future never leaves a transaction open.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use turso::params::Params;
use turso::{Builder, Connection, Database, Value};

use crate::application::ports::{
    Collection, Document, DocumentCursor, DocumentGatewayPort, Filter, GatewayError, VecCursor,
};
use crate::config::PersistenceConfig;

const IN_MEMORY_PATH: &str = ":memory:";

const CREATE_DOCUMENTS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS documents (
        collection TEXT NOT NULL,
        doc_key TEXT NOT NULL,
        body TEXT NOT NULL,
        PRIMARY KEY (collection, doc_key)
    )
";

const UPSERT_DOCUMENT: &str = r"
    INSERT INTO documents (collection, doc_key, body) VALUES (?, ?, ?)
    ON CONFLICT (collection, doc_key) DO UPDATE SET body = excluded.body
";

const DELETE_BY_KEY: &str = "DELETE FROM documents WHERE collection = ? AND doc_key = ?";

impl From<turso::Error> for GatewayError {
    fn from(err: turso::Error) -> Self {
        Self::Query(err.to_string())
    }
}

/// Document gateway over an embedded Turso database.
///
/// The connection is not assumed to tolerate concurrent use, so statements
/// are serialized through a mutex. Each statement is atomic on its own.
pub struct TursoDocumentGateway {
    _database: Database,
    connection: Arc<Mutex<Connection>>,
    connected: AtomicBool,
    db_path: String,
}

impl std::fmt::Debug for TursoDocumentGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TursoDocumentGateway")
            .field("db_path", &self.db_path)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl TursoDocumentGateway {
    /// Connect using the persistence configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened, migrated or pinged.
    pub async fn from_config(config: &PersistenceConfig) -> Result<Self, GatewayError> {
        Self::connect(&config.db_path).await
    }

    /// Open (or create) the database at `db_path`, create the schema and
    /// ping it. The gateway reports connected only after all three succeed.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Connection` if any step fails.
    pub async fn connect(db_path: &str) -> Result<Self, GatewayError> {
        if db_path != IN_MEMORY_PATH
            && let Some(parent) = Path::new(db_path).parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                GatewayError::Connection(format!(
                    "cannot create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let database = Builder::new_local(db_path)
            .build()
            .await
            .map_err(|e| GatewayError::Connection(e.to_string()))?;
        let connection = database
            .connect()
            .map_err(|e| GatewayError::Connection(e.to_string()))?;

        connection
            .execute(CREATE_DOCUMENTS_TABLE, ())
            .await
            .map_err(|e| GatewayError::Connection(format!("schema setup failed: {e}")))?;

        let gateway = Self {
            _database: database,
            connection: Arc::new(Mutex::new(connection)),
            connected: AtomicBool::new(false),
            db_path: db_path.to_string(),
        };

        gateway
            .ping_connection()
            .await
            .map_err(|e| GatewayError::Connection(format!("ping failed: {e}")))?;
        gateway.connected.store(true, Ordering::SeqCst);

        info!(db_path = %gateway.db_path, "Connected to Turso document store");
        Ok(gateway)
    }

    /// Drop readiness. Later cart operations fail with `NotConnected`.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        info!(db_path = %self.db_path, "Turso document store marked disconnected");
    }

    async fn ping_connection(&self) -> Result<(), GatewayError> {
        let connection = self.connection.lock().await;
        let mut rows = connection.query("SELECT 1", ()).await?;
        while rows.next().await?.is_some() {}
        Ok(())
    }

    /// Run a write transaction on its own task, holding the connection for
    /// the whole transaction.
    async fn write<T, F, Fut>(&self, work: F) -> Result<T, GatewayError>
    where
        T: Send + 'static,
        F: FnOnce(Arc<Mutex<Connection>>) -> Fut + Send,
        Fut: Future<Output = Result<T, GatewayError>> + Send + 'static,
    {
        tokio::spawn(work(Arc::clone(&self.connection)))
            .await
            .map_err(|e| GatewayError::Query(format!("write task failed: {e}")))?
    }

    fn ensure_connected(&self) -> Result<(), GatewayError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(GatewayError::NotConnected)
        }
    }
}

/// `WHERE` clause selecting `collection` documents that satisfy `filter`.
///
/// Field names come from `CartField::as_str`, never from caller input.
fn where_clause(collection: Collection, filter: &Filter) -> (String, Vec<Value>) {
    let mut sql = String::from("collection = ?");
    let mut params = vec![Value::Text(collection.name().to_string())];
    for condition in filter.conditions() {
        sql.push_str(" AND json_extract(body, '$.");
        sql.push_str(condition.field.as_str());
        sql.push_str("') = ?");
        params.push(Value::Text(condition.value.clone()));
    }
    (sql, params)
}

/// Primary key of the first `collection` document matching `filter`.
async fn matching_key(
    connection: &Connection,
    collection: Collection,
    filter: &Filter,
) -> Result<Option<String>, GatewayError> {
    let (clause, params) = where_clause(collection, filter);
    let sql = format!("SELECT doc_key FROM documents WHERE {clause} LIMIT 1");

    let mut rows = connection.query(&sql, Params::Positional(params)).await?;
    let Some(row) = rows.next().await? else {
        return Ok(None);
    };
    match row.get_value(0)? {
        Value::Text(key) => Ok(Some(key)),
        other => Err(GatewayError::Decode(format!(
            "document key is not text: {other:?}"
        ))),
    }
}

/// Commit on success, roll back on failure.
async fn finish<T>(
    connection: &Connection,
    outcome: Result<T, GatewayError>,
) -> Result<T, GatewayError> {
    let outcome = match outcome {
        Ok(value) => match connection.execute("COMMIT", ()).await {
            Ok(_) => return Ok(value),
            Err(e) => Err(GatewayError::from(e)),
        },
        Err(err) => Err(err),
    };
    if let Err(e) = connection.execute("ROLLBACK", ()).await {
        warn!(error = %e, "Rollback failed");
    }
    outcome
}

async fn replace_document(
    connection: Arc<Mutex<Connection>>,
    collection: Collection,
    filter: Filter,
    body: String,
) -> Result<(), GatewayError> {
    let connection = connection.lock().await;
    connection.execute("BEGIN", ()).await?;
    let outcome = replace_in_transaction(&connection, collection, &filter, body).await;
    finish(&connection, outcome).await
}

async fn replace_in_transaction(
    connection: &Connection,
    collection: Collection,
    filter: &Filter,
    body: String,
) -> Result<(), GatewayError> {
    let doc_key = matching_key(connection, collection, filter)
        .await?
        .unwrap_or_else(|| filter.canonical_key());
    let params = Params::Positional(vec![
        Value::Text(collection.name().to_string()),
        Value::Text(doc_key),
        Value::Text(body),
    ]);
    connection.execute(UPSERT_DOCUMENT, params).await?;
    Ok(())
}

async fn delete_document(
    connection: Arc<Mutex<Connection>>,
    collection: Collection,
    filter: Filter,
) -> Result<u64, GatewayError> {
    let connection = connection.lock().await;
    connection.execute("BEGIN", ()).await?;
    let outcome = delete_in_transaction(&connection, collection, &filter).await;
    finish(&connection, outcome).await
}

async fn delete_in_transaction(
    connection: &Connection,
    collection: Collection,
    filter: &Filter,
) -> Result<u64, GatewayError> {
    let Some(doc_key) = matching_key(connection, collection, filter).await? else {
        return Ok(0);
    };
    let params = Params::Positional(vec![
        Value::Text(collection.name().to_string()),
        Value::Text(doc_key),
    ]);
    connection.execute(DELETE_BY_KEY, params).await?;
    Ok(1)
}

fn decode_body(value: Value) -> Result<Document, GatewayError> {
    let body = match value {
        Value::Text(body) => body,
        other => {
            return Err(GatewayError::Decode(format!(
                "document body is not text: {other:?}"
            )));
        }
    };
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(serde_json::Value::Object(document)) => Ok(document),
        Ok(other) => Err(GatewayError::Decode(format!(
            "document body is not an object: {other}"
        ))),
        Err(e) => Err(GatewayError::Decode(e.to_string())),
    }
}

#[async_trait]
impl DocumentGatewayPort for TursoDocumentGateway {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        self.ensure_connected()?;
        self.ping_connection().await
    }

    async fn upsert(
        &self,
        collection: Collection,
        filter: &Filter,
        document: Document,
    ) -> Result<(), GatewayError> {
        self.ensure_connected()?;
        let body = serde_json::Value::Object(document).to_string();
        let filter = filter.clone();

        self.write(|connection| replace_document(connection, collection, filter, body))
            .await?;

        debug!(collection = %collection, "Document upserted");
        Ok(())
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<u64, GatewayError> {
        self.ensure_connected()?;
        let filter = filter.clone();

        let removed = self
            .write(|connection| delete_document(connection, collection, filter))
            .await?;

        debug!(collection = %collection, removed, "Document deleted");
        Ok(removed)
    }

    /// Rows are read and decoded up front while the connection is held; the
    /// returned cursor only walks that buffer, so closing it frees memory and
    /// nothing else.
    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Box<dyn DocumentCursor>, GatewayError> {
        self.ensure_connected()?;
        let (clause, params) = where_clause(collection, filter);
        let sql = format!("SELECT body FROM documents WHERE {clause}");

        let mut entries = Vec::new();
        {
            let connection = self.connection.lock().await;
            let mut rows = connection.query(&sql, Params::Positional(params)).await?;
            while let Some(row) = rows.next().await? {
                entries.push(row.get_value(0).map_err(GatewayError::from).and_then(decode_body));
            }
        }

        debug!(collection = %collection, documents = entries.len(), "Documents scanned");
        Ok(Box::new(VecCursor::new(entries)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::{CartFilter, CartItem, CartKey, Quantity, UserId};

    fn key_filter(user: &str, product: &str) -> Filter {
        Filter::from(CartFilter::ByKey(CartKey::new(user, product).unwrap()))
    }

    #[test]
    fn where_clause_lists_every_condition() {
        let (sql, params) = where_clause(Collection::Carts, &key_filter("u1", "p1"));
        assert_eq!(
            sql,
            "collection = ? AND json_extract(body, '$.user_id') = ? \
             AND json_extract(body, '$.product_id') = ?"
        );
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn decode_body_accepts_objects_only() {
        let item = CartItem::new(CartKey::new("u1", "p1").unwrap(), Quantity::new(2));
        let text = serde_json::Value::Object(item.to_document().unwrap()).to_string();
        assert!(decode_body(Value::Text(text)).is_ok());
        assert!(matches!(
            decode_body(Value::Text("[1,2]".to_string())),
            Err(GatewayError::Decode(_))
        ));
        assert!(matches!(
            decode_body(Value::Integer(1)),
            Err(GatewayError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn in_memory_database_round_trip() {
        let gateway = TursoDocumentGateway::connect(IN_MEMORY_PATH).await.unwrap();
        assert!(gateway.is_connected());

        let item = CartItem::new(CartKey::new("u1", "p1").unwrap(), Quantity::new(3));
        gateway
            .upsert(
                Collection::Carts,
                &key_filter("u1", "p1"),
                item.to_document().unwrap(),
            )
            .await
            .unwrap();

        let filter = Filter::from(CartFilter::ByUser(UserId::new("u1")));
        let mut cursor = gateway.find_many(Collection::Carts, &filter).await.unwrap();
        let found = cursor.next().await.unwrap().unwrap();
        assert_eq!(CartItem::from_document(found).unwrap(), item);
        assert!(cursor.next().await.unwrap().is_none());
        cursor.close().await;
    }

    async fn seed_row(gateway: &TursoDocumentGateway, doc_key: &str, quantity: i64) {
        let item = CartItem::new(CartKey::new("u", "p").unwrap(), Quantity::new(quantity));
        let body = serde_json::Value::Object(item.to_document().unwrap()).to_string();
        let params = Params::Positional(vec![
            Value::Text(Collection::Carts.name().to_string()),
            Value::Text(doc_key.to_string()),
            Value::Text(body),
        ]);
        gateway
            .connection
            .lock()
            .await
            .execute(
                "INSERT INTO documents (collection, doc_key, body) VALUES (?, ?, ?)",
                params,
            )
            .await
            .unwrap();
    }

    async fn user_items(gateway: &TursoDocumentGateway, user: &str) -> Vec<CartItem> {
        let filter = Filter::from(CartFilter::ByUser(UserId::new(user)));
        let mut cursor = gateway.find_many(Collection::Carts, &filter).await.unwrap();
        let mut items = Vec::new();
        while let Some(doc) = cursor.next().await.unwrap() {
            items.push(CartItem::from_document(doc).unwrap());
        }
        cursor.close().await;
        items
    }

    #[tokio::test]
    async fn upsert_replaces_match_stored_under_other_key() {
        let gateway = TursoDocumentGateway::connect(IN_MEMORY_PATH).await.unwrap();
        seed_row(&gateway, "external-1", 1).await;

        let item = CartItem::new(CartKey::new("u", "p").unwrap(), Quantity::new(5));
        gateway
            .upsert(
                Collection::Carts,
                &key_filter("u", "p"),
                item.to_document().unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(user_items(&gateway, "u").await, vec![item]);
    }

    #[tokio::test]
    async fn delete_removes_match_stored_under_other_key() {
        let gateway = TursoDocumentGateway::connect(IN_MEMORY_PATH).await.unwrap();
        seed_row(&gateway, "external-1", 1).await;

        let removed = gateway
            .delete_one(Collection::Carts, &key_filter("u", "p"))
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert!(user_items(&gateway, "u").await.is_empty());
    }

    #[tokio::test]
    async fn delete_counts_one_row_among_several() {
        let gateway = TursoDocumentGateway::connect(IN_MEMORY_PATH).await.unwrap();
        for product in ["p1", "p2", "p3"] {
            let item = CartItem::new(CartKey::new("u1", product).unwrap(), Quantity::new(1));
            gateway
                .upsert(
                    Collection::Carts,
                    &key_filter("u1", product),
                    item.to_document().unwrap(),
                )
                .await
                .unwrap();
        }

        let removed = gateway
            .delete_one(Collection::Carts, &key_filter("u1", "p1"))
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert_eq!(user_items(&gateway, "u1").await.len(), 2);
    }

    #[tokio::test]
    async fn disconnect_blocks_io() {
        let gateway = TursoDocumentGateway::connect(IN_MEMORY_PATH).await.unwrap();
        gateway.disconnect();
        assert_eq!(gateway.ping().await, Err(GatewayError::NotConnected));
    }
}
