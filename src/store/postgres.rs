//! Postgres backend on a sqlx connection pool.
//!
//! Expects the table:
//! ```sql
//! CREATE TABLE todos (
//!     id        SERIAL PRIMARY KEY,
//!     task      TEXT NOT NULL,
//!     completed BOOLEAN NOT NULL DEFAULT FALSE
//! );
//! ```

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use std::sync::Arc;

use crate::store::{Connector, Endpoint, SharedStore, StoreError, TodoStore};
use crate::todos::model::Todo;

/// A pooled Postgres connection.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TodoStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_todos(&self) -> Result<Vec<Todo>, StoreError> {
        let rows: Vec<(i64, String, bool)> =
            sqlx::query_as("SELECT id::BIGINT, task, completed FROM todos ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, task, completed)| Todo { id, task, completed })
            .collect())
    }

    async fn insert_todo(&self, task: &str) -> Result<Todo, StoreError> {
        let (id, completed): (i64, bool) =
            sqlx::query_as("INSERT INTO todos (task) VALUES ($1) RETURNING id::BIGINT, completed")
                .bind(task)
                .fetch_one(&self.pool)
                .await?;

        Ok(Todo {
            id,
            task: task.to_string(),
            completed,
        })
    }

    async fn set_completed(&self, id: i64, completed: bool) -> Result<(), StoreError> {
        sqlx::query("UPDATE todos SET completed = $1 WHERE id = $2")
            .bind(completed)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_todo(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Opens Postgres pools.
#[derive(Debug, Default, Clone, Copy)]
pub struct PgConnector;

impl PgConnector {
    fn options(endpoint: &Endpoint) -> Result<PgConnectOptions, StoreError> {
        let ssl_mode: PgSslMode = endpoint.ssl_mode.parse()?;
        let mut options = PgConnectOptions::new()
            .host(&endpoint.host)
            .port(endpoint.port)
            .username(&endpoint.user)
            .database(&endpoint.database)
            .ssl_mode(ssl_mode);

        if let Some(password) = &endpoint.password {
            options = options.password(password);
        }
        Ok(options)
    }
}

#[async_trait]
impl Connector for PgConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<SharedStore, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(endpoint.max_connections)
            .acquire_timeout(endpoint.acquire_timeout)
            .connect_with(Self::options(endpoint)?)
            .await?;

        let store = PgStore::new(pool);
        store.ping().await?;
        Ok(Arc::new(store))
    }
}
