//! Live catalog loading from PostgreSQL.
//!
//! Runs a handful of `pg_catalog` queries over a single connection and feeds
//! the rows to [`CatalogBuilder`]. The connection is driven on a private
//! current-thread runtime so callers stay synchronous.

mod queries;
mod types;

pub use types::{precision_from_typmod, resolve_type};

use crate::catalog::{
    Catalog, CatalogBuilder, ColumnRow, ForeignKeyRow, IndexEntry, IndexEntryRow,
};
use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlx::{ConnectOptions, Connection, Row};
use std::fmt;

/// Connection parameters for the catalog database
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"********")
            .finish()
    }
}

impl ConnectionConfig {
    fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
    }
}

/// Load the given schemas from a live database
pub fn load_catalog(config: &ConnectionConfig, schemas: &[String]) -> Result<Catalog> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(load_catalog_async(config, schemas))
}

async fn load_catalog_async(config: &ConnectionConfig, schemas: &[String]) -> Result<Catalog> {
    tracing::info!(
        host = %config.host,
        port = config.port,
        database = %config.database,
        "connecting to database"
    );

    let mut conn = config.connect_options().connect().await.with_context(|| {
        format!(
            "failed to connect to {}:{}/{}",
            config.host, config.port, config.database
        )
    })?;

    let catalog = read_catalog(&mut conn, schemas).await;
    if let Err(e) = conn.close().await {
        tracing::debug!(error = %e, "error closing catalog connection");
    }
    catalog
}

async fn fetch(conn: &mut PgConnection, sql: &str, schemas: &[String]) -> Result<Vec<PgRow>> {
    sqlx::query(sql)
        .bind(schemas.to_vec())
        .fetch_all(conn)
        .await
        .context("catalog query failed")
}

async fn read_catalog(conn: &mut PgConnection, schemas: &[String]) -> Result<Catalog> {
    let mut builder = CatalogBuilder::new();

    for row in fetch(conn, queries::SCHEMAS, schemas).await? {
        builder.add_schema(&row.try_get::<String, _>("schema_name")?);
    }

    let rows = fetch(conn, queries::TABLES, schemas).await?;
    tracing::info!(tables = rows.len(), "loaded tables");
    for row in rows {
        builder.add_table(
            &row.try_get::<String, _>("schema_name")?,
            &row.try_get::<String, _>("table_name")?,
        );
    }

    for row in fetch(conn, queries::COLUMNS, schemas).await? {
        let typname: String = row.try_get("typname")?;
        let type_name: String = row.try_get("type_name")?;
        let typmod: i32 = row.try_get("typmod")?;
        builder.add_column(ColumnRow {
            schema: row.try_get("schema_name")?,
            table: row.try_get("table_name")?,
            name: row.try_get("column_name")?,
            ordinal: row.try_get("ordinal")?,
            sql_type: resolve_type(&typname, &type_name),
            not_null: row.try_get("not_null")?,
            precision: precision_from_typmod(&typname, typmod),
        });
    }

    for row in fetch(conn, queries::PRIMARY_KEYS, schemas).await? {
        builder.add_primary_key_column(
            &row.try_get::<String, _>("schema_name")?,
            &row.try_get::<String, _>("table_name")?,
            &row.try_get::<String, _>("column_name")?,
        );
    }

    let rows = fetch(conn, queries::FOREIGN_KEYS, schemas).await?;
    tracing::info!(columns = rows.len(), "loaded foreign key columns");
    for row in rows {
        builder.add_foreign_key_column(ForeignKeyRow {
            schema: row.try_get("schema_name")?,
            table: row.try_get("table_name")?,
            name: row.try_get("foreign_key")?,
            target_schema: row.try_get("target_schema")?,
            target_table: row.try_get("target_table")?,
            column: row.try_get("column_name")?,
            position: row.try_get("position")?,
        });
    }

    for row in fetch(conn, queries::INDEX_ENTRIES, schemas).await? {
        let column: Option<String> = row.try_get("column_name")?;
        let entry = match column {
            Some(name) => IndexEntry::Column(name),
            None => IndexEntry::Expression(
                row.try_get::<Option<String>, _>("expression")?
                    .unwrap_or_default(),
            ),
        };
        builder.add_index_entry(IndexEntryRow {
            schema: row.try_get("schema_name")?,
            table: row.try_get("table_name")?,
            foreign_key: row.try_get("foreign_key")?,
            position: row.try_get("position")?,
            entry,
        });
    }

    Ok(builder.build())
}
