// ==========================================
// 库存管理系统 - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 约束: 本阶段不做类型强转; Excel 原始数字/日期/布尔按原样保留
// ==========================================

use crate::domain::import::{CellValue, ParsedFile, RawRow, RowError};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_pipeline_trait::FileParser;
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedFile> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(
                file_path.display().to_string(),
            ));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        // 读取表头
        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| ImportError::CsvParseError(e.to_string()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut parsed = ParsedFile::default();
        for (row_idx, result) in reader.records().enumerate() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    // 损坏的记录不中断整个文件: 记近似行号后继续
                    let approx_row = e
                        .position()
                        .map(|p| p.line() as usize)
                        .unwrap_or(row_idx + 2);
                    parsed.row_errors.push(RowError::new(
                        approx_row,
                        format!("Fila inválida en el archivo CSV: {}", e),
                    ));
                    continue;
                }
            };

            let cells: Vec<(String, CellValue)> = record
                .iter()
                .enumerate()
                .filter_map(|(col_idx, value)| {
                    headers.get(col_idx).map(|header| {
                        (header.clone(), CellValue::Text(value.to_string()))
                    })
                })
                .collect();

            parsed.rows.push(RawRow {
                source_row_index: row_idx,
                cells,
            });
        }

        Ok(parsed)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
// 仅读取第一个工作表; 缺失单元格视为空
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedFile> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(
                file_path.display().to_string(),
            ));
        }

        // open_workbook_auto 同时覆盖 .xlsx / .xls
        let mut workbook = open_workbook_auto(file_path)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ImportError::EmptyFile)?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        // 表头（第一行）
        let mut rows = range.rows();
        let header_row = rows.next().ok_or(ImportError::EmptyFile)?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let mut parsed = ParsedFile::default();
        for (row_idx, data_row) in rows.enumerate() {
            let cells: Vec<(String, CellValue)> = data_row
                .iter()
                .enumerate()
                .filter_map(|(col_idx, cell)| {
                    headers
                        .get(col_idx)
                        .map(|header| (header.clone(), convert_cell(cell)))
                })
                .collect();

            parsed.rows.push(RawRow {
                source_row_index: row_idx,
                cells,
            });
        }

        Ok(parsed)
    }
}

/// calamine 单元格 → CellValue（保留原始类型）
///
/// Excel 日期单元格以序列号形式保留, 由行校验阶段按
/// 1899-12-30 历元解码; ISO 字符串日期走文本路径。
fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) => CellValue::Empty,
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ParsedFile> {
        let path = file_path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse(path),
            "xlsx" | "xls" => ExcelParser.parse(path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut temp_file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        write!(temp_file, "{}", content).unwrap();
        temp_file
    }

    #[test]
    fn test_csv_parser_basic() {
        let temp_file = write_csv("sku,quantity\nABC123,5\nDEF456,3\n");

        let parsed = CsvParser.parse(temp_file.path()).unwrap();

        assert_eq!(parsed.rows.len(), 2);
        assert!(parsed.row_errors.is_empty());
        assert_eq!(parsed.rows[0].source_row_index, 0);
        assert_eq!(
            parsed.rows[0].cells[0],
            ("sku".to_string(), CellValue::Text("ABC123".to_string()))
        );
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse(Path::new("no_existe.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_parser_keeps_empty_rows_for_normalizer() {
        // 空白行的排除属于规范化阶段, 解析阶段原样保留
        let temp_file = write_csv("sku,quantity\nABC,5\n,\nDEF,3\n");

        let parsed = CsvParser.parse(temp_file.path()).unwrap();

        assert_eq!(parsed.rows.len(), 3);
    }

    #[test]
    fn test_csv_parser_trims_headers() {
        let temp_file = write_csv(" sku , quantity \nABC,5\n");

        let parsed = CsvParser.parse(temp_file.path()).unwrap();

        assert_eq!(parsed.rows[0].cells[0].0, "sku");
        assert_eq!(parsed.rows[0].cells[1].0, "quantity");
    }

    #[test]
    fn test_universal_parser_unsupported_extension() {
        let result = UniversalFileParser.parse(Path::new("inventario.pdf"));
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }
}
