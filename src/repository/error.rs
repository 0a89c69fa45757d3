// ==========================================
// 库存管理系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 注意: 错误文案可能经由运行边界进入 errorMessages,
//       与导入层一致使用西语。
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("No se pudo abrir la base de datos: {0}")]
    DatabaseConnectionError(String),

    #[error("Error de base de datos: {0}")]
    DatabaseQueryError(String),

    #[error("No se pudo obtener el bloqueo de la base de datos")]
    LockError,

    #[error("Registro no encontrado: {entity} id={id}")]
    NotFound { entity: String, id: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        RepositoryError::DatabaseQueryError(err.to_string())
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
