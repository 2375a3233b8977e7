use chrono::{DateTime, Utc};

use super::schema::{SelectionStore, RECORD_KEY};
use super::types::{SelectionSnapshot, StoreError};

impl SelectionStore {
    // ========================================================================
    // Snapshot Operations
    // ========================================================================

    /// Write the snapshot under the fixed key, replacing any previous record.
    ///
    /// A single UPSERT statement, so readers see either the old record or the
    /// new one, never a partial write.
    pub async fn save(&self, snapshot: &SelectionSnapshot) -> Result<(), StoreError> {
        let value = snapshot.encode()?;
        let pool = self.initialize().await?;
        let now = Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO selected_items_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(RECORD_KEY)
        .bind(&value)
        .bind(now)
        .execute(pool)
        .await?;

        tracing::debug!(selected = snapshot.len(), "Saved selection snapshot");
        Ok(())
    }

    /// Read the stored snapshot.
    ///
    /// # Returns
    ///
    /// `None` when there is no record, and also when the record holds zero
    /// selected pairs; in that case the empty record is deleted so "nothing
    /// selected" never lingers as stored state.
    ///
    /// # Errors
    ///
    /// `StoreError::MalformedSnapshot` if the record fails validation. The bad
    /// record is deleted before returning so the next load starts clean.
    pub async fn load(&self) -> Result<Option<SelectionSnapshot>, StoreError> {
        let pool = self.initialize().await?;

        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM selected_items_store WHERE key = ?")
                .bind(RECORD_KEY)
                .fetch_optional(pool)
                .await?;

        let Some((raw,)) = row else {
            return Ok(None);
        };

        match SelectionSnapshot::decode(&raw) {
            Ok(snapshot) if snapshot.is_empty() => {
                tracing::debug!("Stored selection is empty, clearing record");
                self.clear().await?;
                Ok(None)
            }
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding malformed selection record");
                self.clear().await?;
                Err(e)
            }
        }
    }

    /// Remove every stored record. No-op if the store was never initialized.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let Some(pool) = self.pool.get() else {
            return Ok(());
        };

        sqlx::query("DELETE FROM selected_items_store")
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Whether a selection record is currently stored.
    pub async fn has_record(&self) -> Result<bool, StoreError> {
        Ok(self.last_saved().await?.is_some())
    }

    /// When the stored selection was last written, if there is one.
    pub async fn last_saved(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let pool = self.initialize().await?;

        let row: Option<(i64,)> =
            sqlx::query_as("SELECT updated_at FROM selected_items_store WHERE key = ?")
                .bind(RECORD_KEY)
                .fetch_optional(pool)
                .await?;

        Ok(row.and_then(|(ts,)| DateTime::from_timestamp(ts, 0)))
    }
}
