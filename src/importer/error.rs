// ==========================================
// 库存管理系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 注意: 文件级错误文案会直接进入 errorMessages 展示给
//       终端用户, 因此与行级消息一样使用西语。
// ==========================================

use thiserror::Error;

/// 导入模块错误类型（文件级 / 基础设施级）
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("Archivo no encontrado: {0}")]
    FileNotFound(String),

    #[error("Formato de archivo no soportado: {0}")]
    UnsupportedFormat(String),

    #[error("No se pudo leer el archivo: {0}")]
    FileReadError(String),

    #[error("Error al leer el archivo Excel: {0}")]
    ExcelParseError(String),

    #[error("Error al leer el archivo CSV: {0}")]
    CsvParseError(String),

    #[error("El archivo no contiene datos")]
    EmptyFile,

    // ===== 模式/列集错误 =====
    #[error("Columna requerida ausente: {0}")]
    MissingRequiredColumn(String),

    #[error("Debe incluir alguna de las columnas: {0}")]
    MissingAnyOfColumn(String),

    #[error("Columna no reconocida: {0}")]
    UnknownColumn(String),

    // ===== 运行控制 =====
    #[error("Importación cancelada")]
    Cancelled,

    // ===== 写入边界错误 =====
    #[error("Error al escribir en {table}: {message}")]
    SinkError { table: String, message: String },

    // ===== 通用错误 =====
    #[error("Error interno: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
