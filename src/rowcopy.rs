//! Paginated copy of a text column between two databases.
//!
//! Independent of the subtitle pipeline. Rows are read from the source in id
//! order with a keyset cursor and written to the target with one transaction
//! per page.

use serde::{Deserialize, Serialize};
use sqlx::any::{AnyPoolOptions, install_default_drivers};
use sqlx::{AnyPool, Row};
use tracing::{debug, info};

use crate::error::{Result, SubflowError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowCopyConfig {
    pub source_url: String,
    pub target_url: String,
    pub table: String,
    pub id_column: String,
    pub text_column: String,
    /// First id copied (inclusive)
    pub start_id: i64,
    pub page_size: i64,
}

impl RowCopyConfig {
    pub fn validate(&self) -> Result<()> {
        for identifier in [&self.table, &self.id_column, &self.text_column] {
            if !is_valid_identifier(identifier) {
                return Err(SubflowError::Config(format!(
                    "Invalid SQL identifier: {:?}",
                    identifier
                )));
            }
        }
        if self.page_size <= 0 {
            return Err(SubflowError::Config("page_size must be positive".to_string()));
        }
        Ok(())
    }
}

fn is_valid_identifier(identifier: &str) -> bool {
    let mut chars = identifier.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopyReport {
    pub pages: usize,
    pub rows: usize,
}

pub struct RowCopyJob {
    source: AnyPool,
    target: AnyPool,
    config: RowCopyConfig,
}

impl RowCopyJob {
    pub async fn connect(config: RowCopyConfig) -> Result<Self> {
        config.validate()?;
        install_default_drivers();

        let source = AnyPoolOptions::new()
            .max_connections(1)
            .connect(&config.source_url)
            .await?;
        let target = AnyPoolOptions::new()
            .max_connections(1)
            .connect(&config.target_url)
            .await?;

        Ok(Self { source, target, config })
    }

    pub fn from_pools(source: AnyPool, target: AnyPool, config: RowCopyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { source, target, config })
    }

    fn select_sql(&self) -> String {
        format!(
            "SELECT {id}, {text} FROM {table} WHERE {id} >= ? ORDER BY {id} LIMIT ?",
            id = self.config.id_column,
            text = self.config.text_column,
            table = self.config.table,
        )
    }

    fn update_sql(&self) -> String {
        format!(
            "UPDATE {table} SET {text} = ? WHERE {id} = ?",
            id = self.config.id_column,
            text = self.config.text_column,
            table = self.config.table,
        )
    }

    async fn fetch_page(&self, cursor: i64) -> Result<Vec<(i64, Option<String>)>> {
        let rows = sqlx::query(&self.select_sql())
            .bind(cursor)
            .bind(self.config.page_size)
            .fetch_all(&self.source)
            .await?;

        rows.iter()
            .map(|row| Ok((row.try_get::<i64, _>(0)?, row.try_get::<Option<String>, _>(1)?)))
            .collect()
    }

    async fn apply_page(&self, rows: &[(i64, Option<String>)]) -> Result<()> {
        let update = self.update_sql();
        let mut tx = self.target.begin().await?;

        for (id, text) in rows {
            sqlx::query(&update)
                .bind(text.clone())
                .bind(*id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Copy every row with id >= `start_id`; stops at the first error
    pub async fn run(&self) -> Result<CopyReport> {
        let mut report = CopyReport::default();
        let mut cursor = self.config.start_id;

        loop {
            let rows = self.fetch_page(cursor).await?;
            let Some(&(last_id, _)) = rows.last() else {
                break;
            };

            debug!("Page {} starting at id {}: {} rows", report.pages, cursor, rows.len());
            self.apply_page(&rows).await?;

            report.pages += 1;
            report.rows += rows.len();
            info!("Copied page {} ({} rows, up to id {})", report.pages, rows.len(), last_id);

            cursor = last_id + 1;
        }

        info!("Row copy finished: {} rows in {} pages", report.rows, report.pages);
        Ok(report)
    }
}
