use crate::adapter::clickhouse::row::DocumentRow;
use crate::config::StorageSettings;
use crate::domain::CanonicalDocument;
use crate::error::BridgeError;
use crate::port::DocumentStore;
use crate::port::document_store::StoreFuture;
use clickhouse::Client;
use clickhouse::inserter::Inserter;
use clickhouse::sql::Identifier;
use std::time::Duration;
use tracing::{debug, info};

// ClickHouse inserter configuration constants
const INSERTER_SEND_TIMEOUT: Duration = Duration::from_secs(5);
const INSERTER_END_TIMEOUT: Duration = Duration::from_secs(5);

/// Creates the database holding collections, if missing.
pub const CREATE_DATABASE_DDL: &str = "CREATE DATABASE IF NOT EXISTS ?";

/// Creates a collection table laid out as [`DocumentRow`], if missing.
///
/// Bound with the database and table identifiers, in that order.
pub const CREATE_COLLECTION_DDL: &str = "\
CREATE TABLE IF NOT EXISTS ?.?
(
    timestamp DateTime64(9, 'UTC'),
    type      LowCardinality(String),
    level     Int8,
    service   LowCardinality(String),
    namespace LowCardinality(String),
    document  String
)
ENGINE = MergeTree
PARTITION BY toDate(timestamp)
ORDER BY (service, namespace, timestamp)";

/// Backtick-quote a name for use in generated SQL, escaping the characters
/// ClickHouse treats specially inside quoted identifiers.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('`');
    for c in name.chars() {
        match c {
            '\\' | '`' | '\'' => {
                quoted.push('\\');
                quoted.push(c);
            }
            '\t' => quoted.push_str("\\t"),
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(c),
        }
    }
    quoted.push('`');
    quoted
}

/// [`DocumentStore`] backed by ClickHouse.
///
/// A database maps to a ClickHouse database and a collection to a table laid
/// out as [`DocumentRow`]. Every call finishes its inserter, so one request is
/// one INSERT.
pub struct ClickHouseStore {
    client: Client,
}

impl ClickHouseStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn from_settings(settings: &StorageSettings) -> Self {
        let mut client = Client::default().with_url(&settings.url);
        if let Some(user) = &settings.user {
            client = client.with_user(user);
        }
        if let Some(password) = &settings.password {
            client = client.with_password(password);
        }
        Self::new(client)
    }

    /// Create `database` and its `collection` table when they do not exist.
    pub async fn ensure_collection(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<(), BridgeError> {
        self.client
            .query(CREATE_DATABASE_DDL)
            .bind(Identifier(database))
            .execute()
            .await?;
        self.client
            .query(CREATE_COLLECTION_DDL)
            .bind(Identifier(database))
            .bind(Identifier(collection))
            .execute()
            .await?;

        info!(database, collection, "Ensured collection table exists");
        Ok(())
    }

    /// Create an inserter for `database.collection`.
    ///
    /// The database travels as a request parameter; the table name is quoted
    /// into the generated INSERT statement.
    fn create_inserter(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<Inserter<DocumentRow>, clickhouse::error::Error> {
        Ok(self
            .client
            .clone()
            .with_database(database)
            .inserter::<DocumentRow>(&quote_identifier(collection))?
            .with_timeouts(Some(INSERTER_SEND_TIMEOUT), Some(INSERTER_END_TIMEOUT)))
    }

    async fn write_documents(
        &self,
        database: &str,
        collection: &str,
        documents: &[CanonicalDocument],
    ) -> Result<(), BridgeError> {
        let rows = documents
            .iter()
            .map(DocumentRow::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let mut inserter = self.create_inserter(database, collection)?;
        for row in &rows {
            inserter.write(row)?;
        }
        let stats = inserter.end().await?;

        debug!(
            database,
            collection,
            rows = stats.rows,
            "Wrote documents to ClickHouse"
        );
        Ok(())
    }
}

impl DocumentStore for ClickHouseStore {
    fn ping(&self, timeout: Duration) -> StoreFuture<'_> {
        Box::pin(async move {
            tokio::time::timeout(timeout, self.client.query("SELECT 1").execute())
                .await
                .map_err(|_| BridgeError::StorageTimeout(timeout))??;
            Ok(())
        })
    }

    fn insert_one<'a>(
        &'a self,
        database: &'a str,
        collection: &'a str,
        document: CanonicalDocument,
    ) -> StoreFuture<'a> {
        Box::pin(async move {
            self.write_documents(database, collection, std::slice::from_ref(&document))
                .await
        })
    }

    fn insert_many<'a>(
        &'a self,
        database: &'a str,
        collection: &'a str,
        documents: Vec<CanonicalDocument>,
    ) -> StoreFuture<'a> {
        Box::pin(async move {
            self.write_documents(database, collection, &documents)
                .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::normalize_at;
    use chrono::{TimeZone, Utc};
    use clickhouse::Compression;
    use clickhouse::test::{Mock, handlers, status};
    use serde_json::{Value, json};

    fn mock_store(mock: &Mock) -> ClickHouseStore {
        ClickHouseStore::new(
            Client::default()
                .with_url(mock.url())
                .with_compression(Compression::None),
        )
    }

    fn doc(value: Value) -> CanonicalDocument {
        let Value::Object(raw) = value else {
            panic!("expected object");
        };
        normalize_at(raw, Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn test_insert_one_writes_single_row() {
        let mock = Mock::new();
        let store = mock_store(&mock);
        let recording = mock.add(handlers::record::<DocumentRow>());

        let document = doc(json!({
            "@timestamp": "2024-05-06T07:08:09.123456789Z",
            "kubernetes": {"container_name": "api", "namespace_name": "prod"},
            "level": "ERROR",
            "msg": "boom"
        }));
        store
            .insert_one("logging", "app-logs", document.clone())
            .await
            .unwrap();

        let rows: Vec<DocumentRow> = recording.collect().await;
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.timestamp, document.timestamp());
        assert_eq!(row.doc_type, "log");
        assert_eq!(row.level, 3);
        assert_eq!(row.service, "api");
        assert_eq!(row.namespace, "prod");
        let stored: Value = serde_json::from_str(&row.document).unwrap();
        assert_eq!(stored, document.into_value());
    }

    #[tokio::test]
    async fn test_insert_many_writes_all_rows_in_one_insert() {
        let mock = Mock::new();
        let store = mock_store(&mock);
        // A single handler: a second INSERT would find none and fail.
        let recording = mock.add(handlers::record::<DocumentRow>());

        let documents: Vec<CanonicalDocument> =
            (0..5).map(|n| doc(json!({ "n": n, "type": "audit" }))).collect();
        store
            .insert_many("logging", "logs", documents)
            .await
            .unwrap();

        let rows: Vec<DocumentRow> = recording.collect().await;
        assert_eq!(rows.len(), 5);
        for (n, row) in rows.iter().enumerate() {
            assert_eq!(row.doc_type, "audit");
            assert_eq!(row.level, -1);
            let stored: Value = serde_json::from_str(&row.document).unwrap();
            assert_eq!(stored["n"], json!(n));
        }
    }

    #[tokio::test]
    async fn test_insert_failure_is_storage_error() {
        let mock = Mock::new();
        let store = mock_store(&mock);
        mock.add(handlers::failure(status::INTERNAL_SERVER_ERROR));

        let result = store
            .insert_one("logging", "logs", doc(json!({"a": 1})))
            .await;
        assert!(matches!(result, Err(BridgeError::Storage(_))));
    }

    #[tokio::test]
    async fn test_ensure_collection_creates_database_and_table() {
        let mock = Mock::new();
        let store = mock_store(&mock);
        let create_database = mock.add(handlers::record_ddl());
        let create_table = mock.add(handlers::record_ddl());

        store.ensure_collection("k8s-prod", "app-logs").await.unwrap();

        let database_sql = create_database.query().await;
        assert!(database_sql.contains("CREATE DATABASE IF NOT EXISTS `k8s-prod`"));

        let table_sql = create_table.query().await;
        assert!(table_sql.contains("CREATE TABLE IF NOT EXISTS `k8s-prod`.`app-logs`"));
        for column in ["timestamp DateTime64(9, 'UTC')", "level     Int8", "document  String"] {
            assert!(table_sql.contains(column), "missing column {column}");
        }
    }

    #[tokio::test]
    async fn test_ping_succeeds_against_server() {
        let mock = Mock::new();
        let store = mock_store(&mock);
        mock.add(handlers::record_ddl());

        store.ping(Duration::from_secs(2)).await.unwrap();
    }

    #[tokio::test]
    async fn test_ping_unreachable_server_fails() {
        // Port 9 (discard) is not a ClickHouse endpoint.
        let store = ClickHouseStore::new(Client::default().with_url("http://127.0.0.1:9"));
        let result = store.ping(Duration::from_secs(2)).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_quote_identifier_escapes_special_characters() {
        assert_eq!(quote_identifier("logs"), "`logs`");
        assert_eq!(quote_identifier("app-logs"), "`app-logs`");
        assert_eq!(
            quote_identifier("logs`; DROP TABLE logs"),
            "`logs\\`; DROP TABLE logs`"
        );
        assert_eq!(quote_identifier("a\\b'c"), "`a\\\\b\\'c`");
    }
}
