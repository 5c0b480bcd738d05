//! # Product Repository
//!
//! Database operations for the product catalogue.
//!
//! ## Key Operations
//! - Create products with a selling price
//! - Lookup by ID or barcode (scanner input)
//! - List the catalogue by name
//!
//! Quantities on hand are not stored here: they are the sum of the
//! product's lots, see [`StockRepository::available_for_product`].
//!
//! [`StockRepository::available_for_product`]: crate::repository::stock::StockRepository::available_for_product

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;
use stockroom_core::validation::validate_new_product;
use stockroom_core::{Money, NewProduct, Product};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let product = repo.create_product(NewProduct { name: "Widget".into(), ..Default::default() }).await?;
/// let scanned = repo.get_by_barcode("5901234123457").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    write_gate: Arc<Mutex<()>>,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool, write_gate: Arc<Mutex<()>>) -> Self {
        ProductRepository { pool, write_gate }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with its assigned id
    /// * `Err(DbError::Rule)` - Empty name or negative price
    pub async fn create_product(&self, new: NewProduct) -> DbResult<Product> {
        validate_new_product(&new)?;

        let now = Utc::now();
        let name = new.name.trim().to_string();
        let barcode = new
            .barcode
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());

        debug!(name = %name, "Inserting product");

        let _gate = self.write_gate.lock().await;
        let result = sqlx::query(
            r#"
            INSERT INTO products (name, description, price, barcode, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&name)
        .bind(&new.description)
        .bind(new.price)
        .bind(&barcode)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Product {
            id: result.last_insert_rowid(),
            name,
            description: new.description,
            price: new.price,
            barcode,
            created_at: now,
            updated_at: now,
        })
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product_on(&mut conn, id).await
    }

    /// Gets a product by barcode. Barcodes aren't unique; the oldest match
    /// wins.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, barcode, created_at, updated_at
            FROM products
            WHERE barcode = ?1
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(barcode.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists products sorted by name.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, barcode, created_at, updated_at
            FROM products
            ORDER BY name, id
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Changes the selling price. Committed transactions keep the price
    /// they were sold at.
    pub async fn update_price(&self, id: i64, price: Money) -> DbResult<()> {
        stockroom_core::validation::validate_non_negative_money("price", price)?;

        debug!(id, price = %price, "Updating product price");

        let _gate = self.write_gate.lock().await;
        let result = sqlx::query("UPDATE products SET price = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(price)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Loads a product on an already-acquired connection or open transaction.
pub(crate) async fn fetch_product_on(
    conn: &mut SqliteConnection,
    id: i64,
) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, name, description, price, barcode, created_at, updated_at
        FROM products
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use stockroom_core::{CoreError, ValidationError};

    #[tokio::test]
    async fn test_create_and_read_back() {
        let db = fixtures::db().await;
        let created = fixtures::widget(&db, 1_099).await;

        let loaded = db.products().get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.price, Money::from_cents(1_099));
        assert_eq!(loaded.description.as_deref(), Some("Standard widget"));

        assert!(db.products().get_by_id(created.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_by_barcode() {
        let db = fixtures::db().await;
        let created = fixtures::widget(&db, 500).await;

        let scanned = db
            .products()
            .get_by_barcode(" 5901234123457 ")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(scanned.id, created.id);
        assert!(db.products().get_by_barcode("0000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected() {
        let db = fixtures::db().await;
        let err = db
            .products()
            .create_product(NewProduct {
                name: "   ".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Rule(CoreError::Validation(ValidationError::Required { .. }))
        ));
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_negative_price_is_rejected() {
        let db = fixtures::db().await;
        let err = db
            .products()
            .create_product(NewProduct {
                name: "Refund".to_string(),
                price: Money::from_cents(-1),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Rule(CoreError::Validation(ValidationError::MustNotBeNegative { .. }))
        ));
    }

    #[tokio::test]
    async fn test_list_is_sorted_by_name() {
        let db = fixtures::db().await;
        for name in ["Washer", "Bolt", "Nut"] {
            db.products()
                .create_product(NewProduct {
                    name: name.to_string(),
                    price: Money::from_cents(10),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let names: Vec<String> = db
            .products()
            .list(10)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["Bolt", "Nut", "Washer"]);
        assert_eq!(db.products().list(2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_price() {
        let db = fixtures::db().await;
        let widget = fixtures::widget(&db, 500).await;

        db.products()
            .update_price(widget.id, Money::from_cents(650))
            .await
            .unwrap();
        let loaded = db.products().get_by_id(widget.id).await.unwrap().unwrap();
        assert_eq!(loaded.price, Money::from_cents(650));
        assert!(loaded.updated_at >= widget.updated_at);

        assert!(matches!(
            db.products().update_price(999, Money::from_cents(1)).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
