// Entity upserts. Names are matched on their normalized form so that
// "Maybelline", "maybelline" and "  MAYBELLINE " resolve to one row, while
// the first-seen display casing is preserved in `name`.

use brandlens_common::normalize_name;
use tracing::debug;

use crate::error::Result;
use crate::store::Store;

impl Store {
    /// Find or create a brand by name. Returns the row id.
    ///
    /// `category` is stored at creation only; an existing brand keeps the
    /// category it was first seen with.
    pub async fn upsert_brand(&self, name: &str, category: Option<&str>) -> Result<i64> {
        let normalized = normalize_name(name);

        if let Some(id) = self.brand_id_by_normalized(&normalized).await? {
            return Ok(id);
        }

        let inserted = sqlx::query_scalar::<_, i64>(
            "INSERT INTO brands (name, normalized_name, category) VALUES (?1, ?2, ?3)
             ON CONFLICT (normalized_name) DO NOTHING
             RETURNING id",
        )
        .bind(name.trim())
        .bind(&normalized)
        .bind(category)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(id) => {
                debug!(name = name.trim(), id, "Created brand");
                Ok(id)
            }
            // Lost the race to a concurrent insert; the row now exists.
            None => self
                .brand_id_by_normalized(&normalized)
                .await?
                .ok_or_else(|| crate::error::StoreError::NotFound(format!("brand {normalized}"))),
        }
    }

    /// Find or create a sponsor by name. Returns the row id.
    ///
    /// Like brands, `category` is stored at creation only.
    pub async fn upsert_sponsor(&self, name: &str, category: Option<&str>) -> Result<i64> {
        let normalized = normalize_name(name);

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM sponsors WHERE normalized_name = ?1",
        )
        .bind(&normalized)
        .fetch_optional(&self.pool)
        .await?;
        if let Some(id) = existing {
            return Ok(id);
        }

        let inserted = sqlx::query_scalar::<_, i64>(
            "INSERT INTO sponsors (name, normalized_name, category) VALUES (?1, ?2, ?3)
             ON CONFLICT (normalized_name) DO NOTHING
             RETURNING id",
        )
        .bind(name.trim())
        .bind(&normalized)
        .bind(category)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(id) => Ok(id),
            None => sqlx::query_scalar::<_, i64>(
                "SELECT id FROM sponsors WHERE normalized_name = ?1",
            )
            .bind(&normalized)
            .fetch_one(&self.pool)
            .await
            .map_err(Into::into),
        }
    }

    /// Find or create a product by name. Returns the row id.
    ///
    /// An existing product keeps its brand link: `brand_id` is backfilled
    /// only when the stored value is NULL, never overwritten.
    pub async fn upsert_product(
        &self,
        name: &str,
        brand_id: Option<i64>,
        category: Option<&str>,
    ) -> Result<i64> {
        let normalized = normalize_name(name);

        let existing = sqlx::query_as::<_, (i64, Option<i64>)>(
            "SELECT id, brand_id FROM products WHERE normalized_name = ?1",
        )
        .bind(&normalized)
        .fetch_optional(&self.pool)
        .await?;

        if let Some((id, stored_brand)) = existing {
            if stored_brand.is_none() {
                if let Some(bid) = brand_id {
                    sqlx::query("UPDATE products SET brand_id = ?1 WHERE id = ?2")
                        .bind(bid)
                        .bind(id)
                        .execute(&self.pool)
                        .await?;
                }
            }
            return Ok(id);
        }

        let inserted = sqlx::query_scalar::<_, i64>(
            "INSERT INTO products (name, normalized_name, brand_id, category)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (normalized_name) DO NOTHING
             RETURNING id",
        )
        .bind(name.trim())
        .bind(&normalized)
        .bind(brand_id)
        .bind(category)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(id) => {
                debug!(name = name.trim(), id, "Created product");
                Ok(id)
            }
            None => sqlx::query_scalar::<_, i64>(
                "SELECT id FROM products WHERE normalized_name = ?1",
            )
            .bind(&normalized)
            .fetch_one(&self.pool)
            .await
            .map_err(Into::into),
        }
    }

    async fn brand_id_by_normalized(&self, normalized: &str) -> Result<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM brands WHERE normalized_name = ?1",
        )
        .bind(normalized)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }
}
