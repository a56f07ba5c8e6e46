#![forbid(unsafe_code)]

use sd_core::{ExecutionResult, SqlValue};

/// Text form of one execution outcome: an aligned table with a row-count
/// footer for row sets, a summary line for everything else.
pub(crate) fn render_result(result: &ExecutionResult) -> String {
    if !result.is_row_set() {
        let affected = result.affected_rows.unwrap_or(0);
        return format!("Query executed successfully. {affected} rows affected.\n");
    }

    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(SqlValue::to_string).collect())
        .collect();

    let mut widths: Vec<usize> = result
        .columns
        .iter()
        .map(|column| column.chars().count())
        .collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    push_row(&mut out, &result.columns, &widths);
    push_separator(&mut out, &widths);
    for row in &cells {
        push_row(&mut out, row, &widths);
    }
    let count = result.rows.len();
    let plural = if count == 1 { "" } else { "s" };
    out.push_str(&format!("{count} row{plural}\n"));
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        line.push_str(cell);
        let width = widths.get(i).copied().unwrap_or(0);
        for _ in cell.chars().count()..width {
            line.push(' ');
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

fn push_separator(out: &mut String, widths: &[usize]) {
    let mut line = String::new();
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        for _ in 0..*width {
            line.push('-');
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_set(columns: &[&str], rows: Vec<Vec<SqlValue>>) -> ExecutionResult {
        ExecutionResult {
            columns: columns.iter().map(|column| column.to_string()).collect(),
            rows,
            affected_rows: None,
        }
    }

    #[test]
    fn renders_an_aligned_table_with_a_footer() {
        let result = row_set(
            &["id", "name"],
            vec![
                vec![SqlValue::Integer(1), SqlValue::Text("Alice".to_string())],
                vec![SqlValue::Integer(2), SqlValue::Null],
            ],
        );
        let rendered = render_result(&result);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "id  name");
        assert_eq!(lines[1], "--  -----");
        assert_eq!(lines[2], "1   Alice");
        assert_eq!(lines[3], "2   NULL");
        assert_eq!(lines[4], "2 rows");
    }

    #[test]
    fn single_row_footer_is_singular() {
        let result = row_set(&["n"], vec![vec![SqlValue::Integer(7)]]);
        assert!(render_result(&result).ends_with("1 row\n"));
    }

    #[test]
    fn wide_cells_stretch_their_column() {
        let result = row_set(
            &["name"],
            vec![vec![SqlValue::Text("a much longer value".to_string())]],
        );
        let rendered = render_result(&result);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[1], "-------------------");
        assert_eq!(lines[2], "a much longer value");
    }

    #[test]
    fn statements_without_rows_report_the_affected_count() {
        let result = ExecutionResult {
            columns: vec![],
            rows: vec![],
            affected_rows: Some(3),
        };
        assert_eq!(
            render_result(&result),
            "Query executed successfully. 3 rows affected.\n"
        );
    }

    #[test]
    fn empty_row_set_still_shows_the_header() {
        let result = row_set(&["id"], vec![]);
        let rendered = render_result(&result);
        assert!(rendered.starts_with("id\n--\n"));
        assert!(rendered.ends_with("0 rows\n"));
    }
}
