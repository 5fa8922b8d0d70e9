//! # Customer Repository
//!
//! Database operations for customers, addresses and cart items.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use vela_core::{Address, CartItem, Customer};

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, full_name, phone, email, loyalty_points FROM customers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Creates a customer. Profile fields may be None or placeholders until
    /// the customer fills them in.
    pub async fn create(
        &self,
        full_name: Option<&str>,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> DbResult<Customer> {
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            full_name: full_name.map(str::to_string),
            phone: phone.map(str::to_string),
            email: email.map(str::to_string),
            loyalty_points: 0,
        };

        debug!(id = %customer.id, "Creating customer");

        sqlx::query(
            r#"
            INSERT INTO customers (id, full_name, phone, email, loyalty_points)
            VALUES (?1, ?2, ?3, ?4, 0)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.full_name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Gets the customer's delivery address: the first address by id.
    pub async fn delivery_address(&self, customer_id: &str) -> DbResult<Option<Address>> {
        let address = sqlx::query_as::<_, Address>(
            r#"
            SELECT id, customer_id, street, ward, district, city
            FROM addresses
            WHERE customer_id = ?1
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(address)
    }

    /// Adds an address for a customer.
    pub async fn add_address(
        &self,
        customer_id: &str,
        street: Option<&str>,
        ward: Option<&str>,
        district: Option<&str>,
        city: Option<&str>,
    ) -> DbResult<Address> {
        let address = Address {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.to_string(),
            street: street.map(str::to_string),
            ward: ward.map(str::to_string),
            district: district.map(str::to_string),
            city: city.map(str::to_string),
        };

        sqlx::query(
            r#"
            INSERT INTO addresses (id, customer_id, street, ward, district, city)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&address.id)
        .bind(&address.customer_id)
        .bind(&address.street)
        .bind(&address.ward)
        .bind(&address.district)
        .bind(&address.city)
        .execute(&self.pool)
        .await?;

        Ok(address)
    }

    /// Lists a customer's cart items.
    pub async fn cart_items(&self, customer_id: &str) -> DbResult<Vec<CartItem>> {
        let items = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT id, customer_id, product_id, variant_id, quantity
            FROM cart_items
            WHERE customer_id = ?1
            ORDER BY id
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Adds a line to a customer's cart.
    pub async fn add_cart_item(
        &self,
        customer_id: &str,
        product_id: &str,
        variant_id: Option<&str>,
        quantity: i64,
    ) -> DbResult<CartItem> {
        let item = CartItem {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.to_string(),
            product_id: product_id.to_string(),
            variant_id: variant_id.map(str::to_string),
            quantity,
        };

        sqlx::query(
            r#"
            INSERT INTO cart_items (id, customer_id, product_id, variant_id, quantity)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&item.id)
        .bind(&item.customer_id)
        .bind(&item.product_id)
        .bind(&item.variant_id)
        .bind(item.quantity)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }
}
