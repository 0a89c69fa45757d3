// ==========================================
// 库存管理系统 - 写入端边界
// ==========================================
// 职责: insert(table, rows) 契约 + SQLite 实现
// 约束: 单次调用内的行为一个事务 (整批成败一致);
//       唯一约束冲突必须与其他后端错误可区分,
//       供分块执行器决定是否降级逐行重试。
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::import::ImportRunRecord;
use crate::repository::error::RepositoryError;
use async_trait::async_trait;
use rusqlite::{types::Value as SqlValue, Connection, ToSql};
use std::sync::{Arc, Mutex};
use thiserror::Error;

// ==========================================
// SinkError - 写入端错误
// ==========================================
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Registro duplicado: {0}")]
    UniqueViolation(String),

    #[error("{0}")]
    Backend(String),
}

impl SinkError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, SinkError::UniqueViolation(_))
    }
}

impl From<rusqlite::Error> for SinkError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("UNIQUE") => {
                SinkError::UniqueViolation(msg.clone())
            }
            _ => SinkError::Backend(err.to_string()),
        }
    }
}

// ==========================================
// ImportSink Trait
// ==========================================
// 用途: 导入写入边界 (行粒度幂等安全: 逐行降级时,
//       某行的唯一键冲突不影响同调用中的其他行)
#[async_trait]
pub trait ImportSink: Send + Sync {
    /// 插入一批行到目标表
    ///
    /// # 参数
    /// - table: 目标表名
    /// - rows: 列名 → 值 的 JSON 对象列表（同一模式下键集一致）
    ///
    /// # 返回
    /// - Ok(usize): 插入行数（整批成功）
    /// - Err(SinkError): 整批失败（事务回滚）
    async fn insert_rows(&self, table: &str, rows: &[serde_json::Value])
        -> Result<usize, SinkError>;

    /// 记录导入批次审计行（失败不应阻断导入结果返回, 由调用方忽略）
    async fn record_run(&self, record: &ImportRunRecord) -> Result<(), SinkError>;
}

// ==========================================
// SqliteSink - SQLite 写入端实现
// ==========================================
pub struct SqliteSink {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSink {
    /// 打开数据库文件并构建写入端
    pub fn new(db_path: &str) -> Result<Self, RepositoryError> {
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

/// JSON 值 → SQLite 值
fn to_sql_value(value: &serde_json::Value) -> Result<SqlValue, SinkError> {
    match value {
        serde_json::Value::Null => Ok(SqlValue::Null),
        serde_json::Value::Bool(b) => Ok(SqlValue::Integer(*b as i64)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(SqlValue::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(SqlValue::Real(f))
            } else {
                Err(SinkError::Backend(format!("Valor numérico no representable: {}", n)))
            }
        }
        serde_json::Value::String(s) => Ok(SqlValue::Text(s.clone())),
        other => Err(SinkError::Backend(format!(
            "Tipo de valor no soportado para escritura: {}",
            other
        ))),
    }
}

#[async_trait]
impl ImportSink for SqliteSink {
    async fn insert_rows(
        &self,
        table: &str,
        rows: &[serde_json::Value],
    ) -> Result<usize, SinkError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let first = rows[0]
            .as_object()
            .ok_or_else(|| SinkError::Backend("La fila no es un objeto".to_string()))?;
        let columns: Vec<String> = first.keys().cloned().collect();

        let column_list = columns
            .iter()
            .map(|c| format!("\"{}\"", c))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=columns.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            table, column_list, placeholders
        );

        let mut conn = self.conn.lock().map_err(|_| {
            SinkError::Backend("No se pudo obtener el bloqueo de la base de datos".to_string())
        })?;
        let tx = conn
            .transaction()
            .map_err(|e| SinkError::Backend(e.to_string()))?;

        let mut count = 0;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in rows {
                let object = row
                    .as_object()
                    .ok_or_else(|| SinkError::Backend("La fila no es un objeto".to_string()))?;
                let values: Vec<SqlValue> = columns
                    .iter()
                    .map(|c| to_sql_value(object.get(c).unwrap_or(&serde_json::Value::Null)))
                    .collect::<Result<_, _>>()?;
                let params: Vec<&dyn ToSql> =
                    values.iter().map(|v| v as &dyn ToSql).collect();
                stmt.execute(params.as_slice())?;
                count += 1;
            }
        }

        tx.commit().map_err(|e| SinkError::Backend(e.to_string()))?;
        Ok(count)
    }

    async fn record_run(&self, record: &ImportRunRecord) -> Result<(), SinkError> {
        let conn = self.conn.lock().map_err(|_| {
            SinkError::Backend("No se pudo obtener el bloqueo de la base de datos".to_string())
        })?;
        conn.execute(
            r#"
            INSERT INTO import_runs (
                run_id, mode, file_name, total_rows, success_rows,
                error_rows, started_at, elapsed_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            rusqlite::params![
                record.run_id,
                record.mode,
                record.file_name,
                record.total_rows,
                record.success_rows,
                record.error_rows,
                record.started_at.to_rfc3339(),
                record.elapsed_ms,
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn memory_sink() -> SqliteSink {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE articulos (
                id TEXT PRIMARY KEY,
                sku TEXT UNIQUE,
                nombre TEXT
            );
            "#,
        )
        .unwrap();
        SqliteSink::with_connection(Arc::new(Mutex::new(conn)))
    }

    #[tokio::test]
    async fn test_insert_rows_commits_whole_batch() {
        let sink = memory_sink();
        let rows = vec![
            json!({"id": "1", "sku": "A", "nombre": "Uno"}),
            json!({"id": "2", "sku": "B", "nombre": "Dos"}),
        ];

        let count = sink.insert_rows("articulos", &rows).await.unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_unique_violation_rolls_back_and_classifies() {
        let sink = memory_sink();
        sink.insert_rows("articulos", &[json!({"id": "1", "sku": "A", "nombre": "Uno"})])
            .await
            .unwrap();

        let rows = vec![
            json!({"id": "2", "sku": "B", "nombre": "Dos"}),
            json!({"id": "3", "sku": "A", "nombre": "Repetido"}),
        ];
        let err = sink.insert_rows("articulos", &rows).await.unwrap_err();
        assert!(err.is_unique_violation());

        // 整批回滚: 冲突前的行也不落库
        let conn = sink.conn.lock().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM articulos", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_null_values_written_as_null() {
        let sink = memory_sink();
        sink.insert_rows("articulos", &[json!({"id": "1", "sku": null, "nombre": "Uno"})])
            .await
            .unwrap();

        let conn = sink.conn.lock().unwrap();
        let sku: Option<String> = conn
            .query_row("SELECT sku FROM articulos WHERE id='1'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(sku, None);
    }
}
