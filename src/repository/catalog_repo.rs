// ==========================================
// 库存管理系统 - 目录参照 Repository
// ==========================================
// 职责: 导入运行开始时一次性加载参照数据快照
// 红线: Repository 不含业务规则, 只做数据读取
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::catalog::{Category, Location, Product, ReferenceSnapshot, Warehouse};
use crate::domain::types::ProductStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::Connection;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

// ==========================================
// ReferenceRepository Trait
// ==========================================
// 用途: 参照数据访问接口
// 实现者: SqliteCatalogRepository
#[async_trait]
pub trait ReferenceRepository: Send + Sync {
    /// 加载当前目录实体的只读快照
    async fn load_snapshot(&self) -> RepositoryResult<ReferenceSnapshot>;
}

// ==========================================
// SqliteCatalogRepository
// ==========================================
pub struct SqliteCatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalogRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 复用已有连接（测试与 API 层共享连接时使用）
    pub fn with_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl ReferenceRepository for SqliteCatalogRepository {
    async fn load_snapshot(&self) -> RepositoryResult<ReferenceSnapshot> {
        let conn = self.conn.lock().map_err(|_| RepositoryError::LockError)?;

        let mut stmt = conn.prepare(
            "SELECT id, sku, name, purchase_price, sale_price, status FROM products",
        )?;
        let products = stmt
            .query_map([], |row| {
                let status: String = row.get(5)?;
                Ok(Product {
                    id: row.get(0)?,
                    sku: row.get(1)?,
                    name: row.get(2)?,
                    purchase_price: row.get(3)?,
                    sale_price: row.get(4)?,
                    status: if status == "inactive" {
                        ProductStatus::Inactive
                    } else {
                        ProductStatus::Active
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare("SELECT id, name FROM warehouses")?;
        let warehouses = stmt
            .query_map([], |row| {
                Ok(Warehouse {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare("SELECT id, name, warehouse_id FROM locations")?;
        let locations = stmt
            .query_map([], |row| {
                Ok(Location {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    warehouse_id: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare("SELECT id, name FROM categories")?;
        let categories = stmt
            .query_map([], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare("SELECT serial_code FROM product_serials")?;
        let existing_serials = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;

        Ok(ReferenceSnapshot {
            products,
            warehouses,
            locations,
            categories,
            existing_serials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::schema::init_schema;

    #[tokio::test]
    async fn test_load_snapshot_from_seeded_db() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO products (id, sku, name, status) VALUES ('p1', 'ABC', 'Tornillo', 'active');
            INSERT INTO warehouses (id, name) VALUES ('w1', 'Central');
            INSERT INTO categories (id, name) VALUES ('c1', 'Ferretería');
            INSERT INTO product_serials (id, product_id, warehouse_id, serial_code, status)
                VALUES ('s1', 'p1', 'w1', 'SN-1', 'in_stock');
            "#,
        )
        .unwrap();

        let repo = SqliteCatalogRepository::with_connection(Arc::new(Mutex::new(conn)));
        let snapshot = repo.load_snapshot().await.unwrap();

        assert_eq!(snapshot.products.len(), 1);
        assert_eq!(snapshot.warehouses.len(), 1);
        assert_eq!(snapshot.categories.len(), 1);
        assert!(snapshot.existing_serials.contains("SN-1"));
    }
}
