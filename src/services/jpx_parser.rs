//! Parser for the JPX listed-issues workbook.
//!
//! JPX does not promise a stable layout for `data_j.xls`, so the header row
//! and the code/name columns are located heuristically. Detection runs a
//! ranked list of strategies and reports which one won, so a drift in the
//! exchange's format shows up as `HeaderStrategy::Positional` in the logs and
//! API responses instead of passing silently.

use std::collections::HashSet;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use crate::error::AppError;
use crate::models::{HeaderLayout, HeaderStrategy, ParsedWorkbook, TickerList, TickerRecord};

/// How many rows from the top may hold the header
pub const HEADER_SCAN_ROWS: usize = 10;

/// Layout assumed when no header row can be found
pub const FALLBACK_LAYOUT: HeaderLayout = HeaderLayout {
    strategy: HeaderStrategy::Positional,
    header_row: 0,
    code_column: 1,
    name_column: 2,
};

const CODE_LABELS: &[&str] = &["コード", "code"];
const NAME_LABELS: &[&str] = &["銘柄名", "会社名", "名称", "name", "issuer"];

type Strategy = fn(&[Vec<String>]) -> Option<HeaderLayout>;

/// Tried in order; the first layout returned wins
const STRATEGIES: &[Strategy] = &[detect_by_labels, positional_default];

/// Open raw workbook bytes (.xls or .xlsx) and extract the ticker list
pub fn parse_workbook(bytes: &[u8]) -> Result<ParsedWorkbook, AppError> {
    let rows = read_first_sheet(bytes)?;
    Ok(parse_rows(&rows))
}

/// Extract the ticker list from an already-decoded grid of cell text
pub fn parse_rows(rows: &[Vec<String>]) -> ParsedWorkbook {
    let layout = detect_header(rows);

    let mut seen = HashSet::new();
    let mut stocks: TickerList = Vec::new();

    for row in rows.iter().skip(layout.header_row + 1) {
        let code = cell(row, layout.code_column);
        let name = cell(row, layout.name_column);

        if !is_ticker_code(code) || name.is_empty() {
            continue;
        }

        let record = TickerRecord::from_code(code, name);
        // First occurrence wins
        if seen.insert(record.symbol.clone()) {
            stocks.push(record);
        }
    }

    stocks.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    ParsedWorkbook { stocks, layout }
}

/// Run the strategies in rank order
pub fn detect_header(rows: &[Vec<String>]) -> HeaderLayout {
    STRATEGIES
        .iter()
        .find_map(|strategy| strategy(rows))
        .unwrap_or(FALLBACK_LAYOUT)
}

/// First row within the scan window carrying both a code and a name label
fn detect_by_labels(rows: &[Vec<String>]) -> Option<HeaderLayout> {
    rows.iter()
        .take(HEADER_SCAN_ROWS)
        .enumerate()
        .find_map(|(row_index, row)| {
            let code_column = find_label_column(row, CODE_LABELS, None)?;
            let name_column = find_label_column(row, NAME_LABELS, Some(code_column))?;

            Some(HeaderLayout {
                strategy: HeaderStrategy::Labels,
                header_row: row_index,
                code_column,
                name_column,
            })
        })
}

fn positional_default(_rows: &[Vec<String>]) -> Option<HeaderLayout> {
    Some(FALLBACK_LAYOUT)
}

/// Exact label first, so `コード` beats an earlier `33業種コード`; substring otherwise
fn find_label_column(row: &[String], labels: &[&str], skip: Option<usize>) -> Option<usize> {
    let cells: Vec<(usize, String)> = row
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != skip)
        .map(|(i, c)| (i, c.trim().to_lowercase()))
        .filter(|(_, c)| !c.is_empty())
        .collect();

    cells
        .iter()
        .find(|(_, c)| labels.iter().any(|label| c == label))
        .or_else(|| cells.iter().find(|(_, c)| labels.iter().any(|label| c.contains(label))))
        .map(|(i, _)| *i)
}

/// Exactly four ASCII digits
pub fn is_ticker_code(code: &str) -> bool {
    code.len() == 4 && code.bytes().all(|b| b.is_ascii_digit())
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(|s| s.trim()).unwrap_or("")
}

fn read_first_sheet(bytes: &[u8]) -> Result<Vec<Vec<String>>, AppError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| AppError::Parse(format!("Failed to open JPX workbook: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::Parse("JPX workbook has no worksheets".to_string()))?
        .map_err(|e| AppError::Parse(format!("Failed to read first worksheet: {}", e)))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => format_number(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(value) => format_number(value.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        _ => String::new(),
    }
}

/// Numeric codes come through as floats; `7203.0` must read as `7203`
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn symbols(parsed: &ParsedWorkbook) -> Vec<&str> {
        parsed.stocks.iter().map(|s| s.symbol.as_str()).collect()
    }

    #[test]
    fn test_extracts_rows_below_header() {
        let rows = grid(&[
            &["日付", "コード", "銘柄名", "市場・商品区分"],
            &["20260101", "7203", "トヨタ自動車", "プライム（内国株式）"],
            &["20260101", "6758", "ソニーグループ", "プライム（内国株式）"],
        ]);

        let parsed = parse_rows(&rows);
        assert_eq!(parsed.layout.strategy, HeaderStrategy::Labels);
        assert_eq!(parsed.stocks.len(), 2);
        assert_eq!(parsed.stocks[0], TickerRecord::from_code("6758", "ソニーグループ"));
        assert_eq!(parsed.stocks[1], TickerRecord::from_code("7203", "トヨタ自動車"));
    }

    #[test]
    fn test_header_found_below_title_rows_and_reordered_columns() {
        let rows = grid(&[
            &["東証上場銘柄一覧"],
            &[],
            &["銘柄名", "区分", "コード"],
            &["極洋", "プライム", "1301"],
            &["トヨタ自動車", "プライム", "7203"],
        ]);

        let parsed = parse_rows(&rows);
        assert_eq!(
            parsed.layout,
            HeaderLayout {
                strategy: HeaderStrategy::Labels,
                header_row: 2,
                code_column: 2,
                name_column: 0,
            }
        );
        assert_eq!(symbols(&parsed), vec!["1301.T", "7203.T"]);
    }

    #[test]
    fn test_exact_code_label_preferred_over_sector_code() {
        let rows = grid(&[
            &["日付", "33業種コード", "コード", "銘柄名"],
            &["20260101", "50", "1301", "極洋"],
        ]);

        let parsed = parse_rows(&rows);
        assert_eq!(parsed.layout.code_column, 2);
        assert_eq!(parsed.layout.name_column, 3);
        assert_eq!(symbols(&parsed), vec!["1301.T"]);
    }

    #[test]
    fn test_english_labels() {
        let rows = grid(&[
            &["Date", "Local Code", "Name (English)"],
            &["20260101", "7203", "TOYOTA MOTOR CORPORATION"],
        ]);

        let parsed = parse_rows(&rows);
        assert_eq!(parsed.layout.strategy, HeaderStrategy::Labels);
        assert_eq!(parsed.stocks[0].name, "TOYOTA MOTOR CORPORATION");
    }

    #[test]
    fn test_skips_codes_that_are_not_four_digits() {
        let rows = grid(&[
            &["日付", "コード", "銘柄名"],
            &["2026-01-01", "12345", "無効なコード", ""],
            &["2026-01-01", "ABC1", "英字コード", ""],
            &["2026-01-01", "130A", "英数字コード", ""],
            &["2026-01-01", "7203", "トヨタ自動車", ""],
        ]);

        let parsed = parse_rows(&rows);
        assert_eq!(symbols(&parsed), vec!["7203.T"]);
    }

    #[test]
    fn test_skips_empty_names() {
        let rows = grid(&[
            &["日付", "コード", "銘柄名"],
            &["2026-01-01", "7203", "", ""],
            &["2026-01-01", "9984", "   ", ""],
            &["2026-01-01", "6758", "ソニーグループ", ""],
        ]);

        let parsed = parse_rows(&rows);
        assert_eq!(symbols(&parsed), vec!["6758.T"]);
    }

    #[test]
    fn test_short_rows_are_skipped() {
        let rows = grid(&[&["日付", "コード", "銘柄名"], &["2026-01-01", "7203"], &[]]);
        assert!(parse_rows(&rows).stocks.is_empty());
    }

    #[test]
    fn test_trims_code_and_name() {
        let rows = grid(&[&["日付", "コード", "銘柄名"], &["2026-01-01", " 7203 ", "  トヨタ自動車 "]]);

        let parsed = parse_rows(&rows);
        assert_eq!(parsed.stocks, vec![TickerRecord::from_code("7203", "トヨタ自動車")]);
    }

    #[test]
    fn test_first_duplicate_wins() {
        let rows = grid(&[
            &["日付", "コード", "銘柄名"],
            &["2026-01-01", "7203", "トヨタ自動車", ""],
            &["2026-01-01", "7203", "トヨタ自動車（重複）", ""],
        ]);

        let parsed = parse_rows(&rows);
        assert_eq!(parsed.stocks.len(), 1);
        assert_eq!(parsed.stocks[0].name, "トヨタ自動車");
    }

    #[test]
    fn test_output_sorted_regardless_of_source_order() {
        let rows = grid(&[
            &["日付", "コード", "銘柄名"],
            &["2026-01-01", "9984", "ソフトバンクG", ""],
            &["2026-01-01", "1301", "極洋", ""],
            &["2026-01-01", "7203", "トヨタ自動車", ""],
        ]);

        let parsed = parse_rows(&rows);
        assert_eq!(symbols(&parsed), vec!["1301.T", "7203.T", "9984.T"]);
    }

    #[test]
    fn test_falls_back_to_fixed_columns() {
        let rows = grid(&[
            &["2026-01-01", "ヘッダ", "ヘッダ名", "区分"],
            &["2026-01-01", "7203", "トヨタ自動車", "プライム"],
            &["2026-01-01", "6758", "ソニーグループ", "プライム"],
        ]);

        let parsed = parse_rows(&rows);
        assert_eq!(parsed.layout, FALLBACK_LAYOUT);
        assert!(parsed.layout.strategy.is_fallback());
        assert_eq!(symbols(&parsed), vec!["6758.T", "7203.T"]);
    }

    #[test]
    fn test_header_beyond_scan_window_uses_fallback() {
        let mut rows = vec![vec!["x".to_string()]; HEADER_SCAN_ROWS];
        rows.push(grid(&[&["日付", "コード", "銘柄名"]]).remove(0));

        assert_eq!(detect_header(&rows), FALLBACK_LAYOUT);
    }

    #[test]
    fn test_code_label_alone_is_not_a_header() {
        let rows = grid(&[&["日付", "コード", "市場"], &["2026-01-01", "7203", "トヨタ自動車"]]);
        assert_eq!(detect_header(&rows), FALLBACK_LAYOUT);
    }

    #[test]
    fn test_empty_grid() {
        let parsed = parse_rows(&[]);
        assert!(parsed.stocks.is_empty());
        assert_eq!(parsed.layout, FALLBACK_LAYOUT);
    }

    #[test]
    fn test_is_ticker_code() {
        assert!(is_ticker_code("0001"));
        assert!(is_ticker_code("7203"));
        assert!(!is_ticker_code("720"));
        assert!(!is_ticker_code("12345"));
        assert!(!is_ticker_code("ABC1"));
        assert!(!is_ticker_code("７２０３"));
        assert!(!is_ticker_code(""));
    }

    #[test]
    fn test_numeric_cells_render_without_decimal_point() {
        assert_eq!(cell_to_string(&Data::Float(7203.0)), "7203");
        assert_eq!(cell_to_string(&Data::Int(1301)), "1301");
        assert_eq!(cell_to_string(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_to_string(&Data::String("  極洋 ".to_string())), "極洋");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    fn xlsx(build: impl FnOnce(&mut rust_xlsxwriter::Workbook)) -> Vec<u8> {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        build(&mut workbook);
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_parse_workbook_reads_first_sheet() {
        let bytes = xlsx(|workbook| {
            let sheet = workbook.add_worksheet();
            sheet.write_string(0, 0, "日付").unwrap();
            sheet.write_string(0, 1, "コード").unwrap();
            sheet.write_string(0, 2, "銘柄名").unwrap();
            sheet.write_number(1, 0, 20260101.0).unwrap();
            sheet.write_number(1, 1, 7203.0).unwrap();
            sheet.write_string(1, 2, "トヨタ自動車").unwrap();
            sheet.write_number(2, 0, 20260101.0).unwrap();
            sheet.write_string(2, 1, "1301").unwrap();
            sheet.write_string(2, 2, "極洋").unwrap();
            sheet.write_number(3, 0, 20260101.0).unwrap();
            sheet.write_number(3, 1, 12345.0).unwrap();
            sheet.write_string(3, 2, "無効なコード").unwrap();

            let other = workbook.add_worksheet();
            other.write_string(0, 1, "コード").unwrap();
            other.write_string(0, 2, "銘柄名").unwrap();
            other.write_number(1, 1, 9999.0).unwrap();
            other.write_string(1, 2, "別シート").unwrap();
        });

        let parsed = parse_workbook(&bytes).unwrap();
        assert_eq!(
            parsed.layout,
            HeaderLayout {
                strategy: HeaderStrategy::Labels,
                header_row: 0,
                code_column: 1,
                name_column: 2,
            }
        );
        assert_eq!(
            parsed.stocks,
            vec![
                TickerRecord::from_code("1301", "極洋"),
                TickerRecord::from_code("7203", "トヨタ自動車"),
            ]
        );
    }

    #[test]
    fn test_parse_workbook_without_header_uses_fallback() {
        let bytes = xlsx(|workbook| {
            let sheet = workbook.add_worksheet();
            sheet.write_number(0, 0, 20260101.0).unwrap();
            sheet.write_string(0, 1, "header").unwrap();
            sheet.write_string(0, 2, "header").unwrap();
            sheet.write_number(1, 0, 20260101.0).unwrap();
            sheet.write_number(1, 1, 6758.0).unwrap();
            sheet.write_string(1, 2, "ソニーグループ").unwrap();
        });

        let parsed = parse_workbook(&bytes).unwrap();
        assert_eq!(parsed.layout, FALLBACK_LAYOUT);
        assert_eq!(parsed.stocks, vec![TickerRecord::from_code("6758", "ソニーグループ")]);
    }

    #[test]
    fn test_unreadable_bytes_are_a_parse_error() {
        let err = parse_workbook(b"this is not a spreadsheet").unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[test]
    fn test_empty_bytes_are_a_parse_error() {
        assert!(matches!(parse_workbook(&[]), Err(AppError::Parse(_))));
    }
}
