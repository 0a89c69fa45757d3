// ==========================================
// 库存管理系统 - 导入维护工具
// ==========================================
// 用法: importar <modo> <archivo> [ruta-db] [purchase_order_id]
// 模式: products | locations | initial_stock |
//       initial_stock_serialized | purchase_order_lines
// ==========================================

use inventario_importer::api::ImportApi;
use inventario_importer::db::{default_db_path, open_sqlite_connection};
use inventario_importer::logging;
use inventario_importer::repository::init_schema;
use std::env;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Uso: importar <modo> <archivo> [ruta-db] [purchase_order_id]");
        eprintln!(
            "Modos: products | locations | initial_stock | initial_stock_serialized | purchase_order_lines"
        );
        return ExitCode::from(2);
    }

    let mode = args[1].as_str();
    let file_path = args[2].as_str();
    let db_path = args.get(3).cloned().unwrap_or_else(default_db_path);
    let purchase_order_id = args.get(4).map(|s| s.as_str());

    // 本地库首次使用时建表 (幂等)
    let conn = match open_sqlite_connection(&db_path) {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("No se pudo abrir la base de datos {}: {}", db_path, e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_schema(&conn) {
        eprintln!("No se pudo inicializar el esquema: {}", e);
        return ExitCode::FAILURE;
    }
    drop(conn);

    let api = ImportApi::new(db_path);
    match api.import_file(mode, file_path, purchase_order_id).await {
        Ok(response) => {
            println!(
                "Importación completada: {} filas, {} errores",
                response.success, response.errors
            );
            for message in &response.error_messages {
                println!("  - {}", message);
            }
            if response.errors > 0 {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
