// ==========================================
// 库存管理系统 - 本地数据库 Schema
// ==========================================
// 职责: 本地 SQLite 库的建表语句 (应用启动与测试共用)
// 唯一键: products.sku / locations.name / product_serials.serial_code /
//         purchase_order_items(purchase_order_id, product_id)
// ==========================================

use rusqlite::Connection;

/// 当前 schema 版本
pub const SCHEMA_VERSION: i64 = 1;

/// 初始化数据库 schema（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS warehouses (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS locations (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            warehouse_id TEXT REFERENCES warehouses(id),
            description TEXT
        );

        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            sku TEXT UNIQUE,
            name TEXT NOT NULL,
            category_id TEXT REFERENCES categories(id),
            location_id TEXT REFERENCES locations(id),
            min_stock REAL,
            max_stock REAL,
            purchase_price REAL,
            sale_price REAL,
            tax_rate REAL,
            status TEXT NOT NULL DEFAULT 'active'
        );

        CREATE TABLE IF NOT EXISTS inventory_movements (
            id TEXT PRIMARY KEY,
            product_id TEXT NOT NULL REFERENCES products(id),
            warehouse_id TEXT NOT NULL REFERENCES warehouses(id),
            movement_type TEXT NOT NULL,
            quantity REAL NOT NULL,
            reference TEXT,
            movement_date TEXT
        );

        CREATE TABLE IF NOT EXISTS product_serials (
            id TEXT PRIMARY KEY,
            product_id TEXT NOT NULL REFERENCES products(id),
            warehouse_id TEXT NOT NULL REFERENCES warehouses(id),
            serial_code TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL,
            reference TEXT,
            movement_date TEXT
        );

        CREATE TABLE IF NOT EXISTS purchase_order_items (
            id TEXT PRIMARY KEY,
            purchase_order_id TEXT NOT NULL,
            product_id TEXT NOT NULL REFERENCES products(id),
            quantity REAL NOT NULL,
            unit_price REAL NOT NULL,
            expected_date TEXT,
            UNIQUE (purchase_order_id, product_id)
        );

        CREATE TABLE IF NOT EXISTS import_runs (
            run_id TEXT PRIMARY KEY,
            mode TEXT NOT NULL,
            file_name TEXT,
            total_rows INTEGER NOT NULL,
            success_rows INTEGER NOT NULL,
            error_rows INTEGER NOT NULL,
            started_at TEXT NOT NULL,
            elapsed_ms INTEGER NOT NULL
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [SCHEMA_VERSION],
    )?;

    Ok(())
}
