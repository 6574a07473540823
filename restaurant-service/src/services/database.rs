//! Postgres implementation of the persistence boundary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{bad_row, ServiceError};
use crate::models::menu::{CreateMenuItem, MenuItem, UpdateMenuItem};
use crate::models::order::{Order, OrderLine, OrderStatus};
use crate::models::restaurant::{CreateRestaurant, Restaurant, RoleAssignment, TenantRole};
use crate::services::store::{NewOrderLine, Store};

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

/// Row shape for `restaurant_users`; role is stored as text.
#[derive(Debug, FromRow)]
struct AssignmentRow {
    assignment_id: Uuid,
    restaurant_id: Uuid,
    subject_id: String,
    role: String,
    granted_utc: DateTime<Utc>,
}

impl AssignmentRow {
    fn into_assignment(self) -> Result<RoleAssignment, ServiceError> {
        let role = TenantRole::parse(&self.role)
            .ok_or_else(|| bad_row(&format!("unknown tenant role {:?}", self.role)))?;
        Ok(RoleAssignment {
            assignment_id: self.assignment_id,
            restaurant_id: self.restaurant_id,
            subject_id: self.subject_id,
            role,
            granted_utc: self.granted_utc,
        })
    }
}

/// Row shape for `orders`; status is stored as text, lines fetched apart.
#[derive(Debug, FromRow)]
struct OrderRow {
    order_id: Uuid,
    restaurant_id: Uuid,
    status: String,
    created_utc: DateTime<Utc>,
    updated_utc: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, lines: Vec<OrderLine>) -> Result<Order, ServiceError> {
        let status = OrderStatus::parse(&self.status)
            .ok_or_else(|| bad_row(&format!("unknown order status {:?}", self.status)))?;
        Ok(Order {
            order_id: self.order_id,
            restaurant_id: self.restaurant_id,
            status,
            lines,
            created_utc: self.created_utc,
            updated_utc: self.updated_utc,
        })
    }
}

impl PgStore {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "restaurant-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, ServiceError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| ServiceError::Unavailable(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), ServiceError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), ServiceError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ServiceError::Database(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    async fn order_lines(&self, order_id: Uuid) -> Result<Vec<OrderLine>, ServiceError> {
        let lines = sqlx::query_as::<_, OrderLine>(
            r#"
            SELECT line_id, order_id, menu_item_id, quantity, unit_price, options
            FROM order_lines
            WHERE order_id = $1
            ORDER BY position
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }
}

#[async_trait]
impl Store for PgStore {
    #[instrument(skip(self, input), fields(slug = %input.slug))]
    async fn insert_restaurant(
        &self,
        input: &CreateRestaurant,
    ) -> Result<Restaurant, ServiceError> {
        let restaurant_id = Uuid::new_v4();
        let restaurant = sqlx::query_as::<_, Restaurant>(
            r#"
            INSERT INTO restaurants (restaurant_id, name, slug, description, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING restaurant_id, name, slug, description, is_active, created_utc, updated_utc
            "#,
        )
        .bind(restaurant_id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(input.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => ServiceError::Conflict(
                format!("restaurant with slug {:?} already exists", input.slug),
            ),
            _ => ServiceError::from(e),
        })?;

        info!(restaurant_id = %restaurant.restaurant_id, name = %restaurant.name, "Restaurant created");
        Ok(restaurant)
    }

    #[instrument(skip(self))]
    async fn restaurant(&self, restaurant_id: Uuid) -> Result<Option<Restaurant>, ServiceError> {
        let restaurant = sqlx::query_as::<_, Restaurant>(
            r#"
            SELECT restaurant_id, name, slug, description, is_active, created_utc, updated_utc
            FROM restaurants
            WHERE restaurant_id = $1
            "#,
        )
        .bind(restaurant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(restaurant)
    }

    #[instrument(skip(self))]
    async fn delete_restaurant(&self, restaurant_id: Uuid) -> Result<bool, ServiceError> {
        // Lines reference menu items with ON DELETE RESTRICT, so the
        // cascade is spelled out oldest-dependency-first in one transaction.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM order_lines
            WHERE order_id IN (SELECT order_id FROM orders WHERE restaurant_id = $1)
            "#,
        )
        .bind(restaurant_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM orders WHERE restaurant_id = $1")
            .bind(restaurant_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM menu_items WHERE restaurant_id = $1")
            .bind(restaurant_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM restaurant_users WHERE restaurant_id = $1")
            .bind(restaurant_id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM restaurants WHERE restaurant_id = $1")
            .bind(restaurant_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        if deleted > 0 {
            info!(restaurant_id = %restaurant_id, "Restaurant deleted");
        }
        Ok(deleted > 0)
    }

    #[instrument(skip(self, input), fields(restaurant_id = %restaurant_id))]
    async fn insert_menu_item(
        &self,
        restaurant_id: Uuid,
        input: &CreateMenuItem,
    ) -> Result<MenuItem, ServiceError> {
        let menu_item_id = Uuid::new_v4();
        let item = sqlx::query_as::<_, MenuItem>(
            r#"
            INSERT INTO menu_items (menu_item_id, restaurant_id, label, description, price, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING menu_item_id, restaurant_id, label, description, price, is_active, created_utc, updated_utc
            "#,
        )
        .bind(menu_item_id)
        .bind(restaurant_id)
        .bind(&input.label)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.is_active)
        .fetch_one(&self.pool)
        .await?;

        info!(menu_item_id = %item.menu_item_id, label = %item.label, "Menu item created");
        Ok(item)
    }

    #[instrument(skip(self), fields(restaurant_id = %restaurant_id, menu_item_id = %menu_item_id))]
    async fn menu_item(
        &self,
        restaurant_id: Uuid,
        menu_item_id: Uuid,
    ) -> Result<Option<MenuItem>, ServiceError> {
        let item = sqlx::query_as::<_, MenuItem>(
            r#"
            SELECT menu_item_id, restaurant_id, label, description, price, is_active, created_utc, updated_utc
            FROM menu_items
            WHERE restaurant_id = $1 AND menu_item_id = $2
            "#,
        )
        .bind(restaurant_id)
        .bind(menu_item_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    #[instrument(skip(self, input), fields(restaurant_id = %restaurant_id, menu_item_id = %menu_item_id))]
    async fn update_menu_item(
        &self,
        restaurant_id: Uuid,
        menu_item_id: Uuid,
        input: &UpdateMenuItem,
    ) -> Result<Option<MenuItem>, ServiceError> {
        let item = sqlx::query_as::<_, MenuItem>(
            r#"
            UPDATE menu_items
            SET label = COALESCE($3, label),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                is_active = COALESCE($6, is_active),
                updated_utc = NOW()
            WHERE restaurant_id = $1 AND menu_item_id = $2
            RETURNING menu_item_id, restaurant_id, label, description, price, is_active, created_utc, updated_utc
            "#,
        )
        .bind(restaurant_id)
        .bind(menu_item_id)
        .bind(&input.label)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    #[instrument(skip(self), fields(restaurant_id = %restaurant_id))]
    async fn list_menu_items(&self, restaurant_id: Uuid) -> Result<Vec<MenuItem>, ServiceError> {
        let items = sqlx::query_as::<_, MenuItem>(
            r#"
            SELECT menu_item_id, restaurant_id, label, description, price, is_active, created_utc, updated_utc
            FROM menu_items
            WHERE restaurant_id = $1
            ORDER BY label
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    #[instrument(skip(self), fields(restaurant_id = %restaurant_id))]
    async fn role_assignment(
        &self,
        restaurant_id: Uuid,
        subject_id: &str,
    ) -> Result<Option<RoleAssignment>, ServiceError> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT assignment_id, restaurant_id, subject_id, role, granted_utc
            FROM restaurant_users
            WHERE restaurant_id = $1 AND subject_id = $2
            "#,
        )
        .bind(restaurant_id)
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(AssignmentRow::into_assignment).transpose()
    }

    #[instrument(skip(self, subject_ids), fields(restaurant_id = %restaurant_id, role = %role, count = subject_ids.len()))]
    async fn replace_role_assignments(
        &self,
        restaurant_id: Uuid,
        role: TenantRole,
        subject_ids: &[String],
    ) -> Result<Vec<RoleAssignment>, ServiceError> {
        let mut tx = self.pool.begin().await?;

        // Drop every row currently holding this role, and any row for an
        // incoming subject regardless of role, so the unique
        // (restaurant_id, subject_id) constraint always holds.
        sqlx::query(
            r#"
            DELETE FROM restaurant_users
            WHERE restaurant_id = $1 AND (role = $2 OR subject_id = ANY($3))
            "#,
        )
        .bind(restaurant_id)
        .bind(role.as_str())
        .bind(subject_ids)
        .execute(&mut *tx)
        .await?;

        let mut assignments = Vec::with_capacity(subject_ids.len());
        for subject_id in subject_ids {
            let row = sqlx::query_as::<_, AssignmentRow>(
                r#"
                INSERT INTO restaurant_users (assignment_id, restaurant_id, subject_id, role)
                VALUES ($1, $2, $3, $4)
                RETURNING assignment_id, restaurant_id, subject_id, role, granted_utc
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(restaurant_id)
            .bind(subject_id)
            .bind(role.as_str())
            .fetch_one(&mut *tx)
            .await?;
            assignments.push(row.into_assignment()?);
        }

        tx.commit().await?;

        info!(
            restaurant_id = %restaurant_id,
            role = %role,
            count = assignments.len(),
            "Role assignments replaced"
        );
        Ok(assignments)
    }

    #[instrument(skip(self), fields(restaurant_id = %restaurant_id))]
    async fn list_role_assignments(
        &self,
        restaurant_id: Uuid,
    ) -> Result<Vec<RoleAssignment>, ServiceError> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT assignment_id, restaurant_id, subject_id, role, granted_utc
            FROM restaurant_users
            WHERE restaurant_id = $1
            ORDER BY role, subject_id
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(AssignmentRow::into_assignment)
            .collect()
    }

    #[instrument(skip(self, lines), fields(restaurant_id = %restaurant_id, lines = lines.len()))]
    async fn insert_order(
        &self,
        restaurant_id: Uuid,
        lines: Vec<NewOrderLine>,
    ) -> Result<Order, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let order_id = Uuid::new_v4();
        let order_row = sqlx::query_as::<_, OrderRow>(
            r#"
            INSERT INTO orders (order_id, restaurant_id, status)
            VALUES ($1, $2, $3)
            RETURNING order_id, restaurant_id, status, created_utc, updated_utc
            "#,
        )
        .bind(order_id)
        .bind(restaurant_id)
        .bind(OrderStatus::Draft.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let mut persisted = Vec::with_capacity(lines.len());
        for (position, line) in lines.into_iter().enumerate() {
            let persisted_line = sqlx::query_as::<_, OrderLine>(
                r#"
                INSERT INTO order_lines (line_id, order_id, menu_item_id, position, quantity, unit_price, options)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING line_id, order_id, menu_item_id, quantity, unit_price, options
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(order_id)
            .bind(line.menu_item_id)
            .bind(position as i32)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(&line.options)
            .fetch_one(&mut *tx)
            .await?;
            persisted.push(persisted_line);
        }

        tx.commit().await?;

        info!(order_id = %order_id, lines = persisted.len(), "Order created");
        order_row.into_order(persisted)
    }

    #[instrument(skip(self), fields(restaurant_id = %restaurant_id, order_id = %order_id))]
    async fn order(
        &self,
        restaurant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<Order>, ServiceError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT order_id, restaurant_id, status, created_utc, updated_utc
            FROM orders
            WHERE restaurant_id = $1 AND order_id = $2
            "#,
        )
        .bind(restaurant_id)
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let lines = self.order_lines(row.order_id).await?;
                Ok(Some(row.into_order(lines)?))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(restaurant_id = %restaurant_id))]
    async fn list_orders(&self, restaurant_id: Uuid) -> Result<Vec<Order>, ServiceError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT order_id, restaurant_id, status, created_utc, updated_utc
            FROM orders
            WHERE restaurant_id = $1
            ORDER BY created_utc
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let lines = self.order_lines(row.order_id).await?;
            orders.push(row.into_order(lines)?);
        }
        Ok(orders)
    }

    #[instrument(skip(self), fields(restaurant_id = %restaurant_id, order_id = %order_id, expected = %expected, target = %target))]
    async fn compare_and_set_order_status(
        &self,
        restaurant_id: Uuid,
        order_id: Uuid,
        expected: OrderStatus,
        target: OrderStatus,
    ) -> Result<Option<Order>, ServiceError> {
        // Single UPDATE guarded by the expected status: two concurrent
        // transitions against the same order serialize on the row and at
        // most one matches.
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            UPDATE orders
            SET status = $4, updated_utc = NOW()
            WHERE restaurant_id = $1 AND order_id = $2 AND status = $3
            RETURNING order_id, restaurant_id, status, created_utc, updated_utc
            "#,
        )
        .bind(restaurant_id)
        .bind(order_id)
        .bind(expected.as_str())
        .bind(target.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                info!(order_id = %order_id, from = %expected, to = %target, "Order status updated");
                let lines = self.order_lines(row.order_id).await?;
                Ok(Some(row.into_order(lines)?))
            }
            None => Ok(None),
        }
    }
}
