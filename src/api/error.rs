// ==========================================
// 库存管理系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型, 转换 Repository 错误为面向
//       调用方的错误消息 (西语, 与客户端展示一致)
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    #[error("Recurso no encontrado: {0}")]
    NotFound(String),

    #[error("Error de importación: {0}")]
    ImportError(String),

    #[error("Error de base de datos: {0}")]
    DatabaseError(String),

    #[error("Error interno: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} (id={})", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::LockError => {
                ApiError::DatabaseError("No se pudo obtener el bloqueo de la base de datos".to_string())
            }
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
