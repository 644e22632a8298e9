//! # Supplier and Customer Repositories
//!
//! Reference records that batches and orders point at. Operations check
//! these exist in the same business before using their ids.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use crate::scope::{require, Owned};
use tally_core::{Customer, Supplier};

// =============================================================================
// Suppliers
// =============================================================================

/// Supplier records of one business.
pub struct SupplierRepository<'t> {
    conn: &'t mut SqliteConnection,
    business_id: &'t str,
}

impl<'t> SupplierRepository<'t> {
    pub(crate) fn new(conn: &'t mut SqliteConnection, business_id: &'t str) -> Self {
        SupplierRepository { conn, business_id }
    }

    pub async fn insert(&mut self, supplier: &Supplier) -> DbResult<()> {
        debug!(id = %supplier.id, name = %supplier.name, "Inserting supplier");

        sqlx::query(
            r#"
            INSERT INTO suppliers (id, business_id, name, contact, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&supplier.id)
        .bind(self.business_id)
        .bind(&supplier.name)
        .bind(&supplier.contact)
        .bind(supplier.created_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn get(&mut self, id: &str) -> DbResult<Supplier> {
        let found = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, business_id, name, contact, created_at
            FROM suppliers
            WHERE id = ?1 AND business_id = ?2
            "#,
        )
        .bind(id)
        .bind(self.business_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        require(found, &mut *self.conn, Owned::Supplier, id, self.business_id).await
    }
}

// =============================================================================
// Customers
// =============================================================================

/// Customer records of one business.
pub struct CustomerRepository<'t> {
    conn: &'t mut SqliteConnection,
    business_id: &'t str,
}

impl<'t> CustomerRepository<'t> {
    pub(crate) fn new(conn: &'t mut SqliteConnection, business_id: &'t str) -> Self {
        CustomerRepository { conn, business_id }
    }

    pub async fn insert(&mut self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, name = %customer.name, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (id, business_id, name, email, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&customer.id)
        .bind(self.business_id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(customer.created_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn get(&mut self, id: &str) -> DbResult<Customer> {
        let found = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, business_id, name, email, created_at
            FROM customers
            WHERE id = ?1 AND business_id = ?2
            "#,
        )
        .bind(id)
        .bind(self.business_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        require(found, &mut *self.conn, Owned::Customer, id, self.business_id).await
    }
}
