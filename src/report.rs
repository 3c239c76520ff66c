use std::iter;

use unicode_width::UnicodeWidthStr;

use crate::db::QueryResult;

const INDEX_HEADER: &str = "(index)";

pub fn render_name_list(label: &str, names: &[String]) -> String {
    format!("{}: {}", label, names.join(", "))
}

/// Box-drawn table with a leading row-index column, cells centered.
pub fn render_table(result: &QueryResult) -> String {
    let header: Vec<&str> = iter::once(INDEX_HEADER)
        .chain(result.columns.iter().map(String::as_str))
        .collect();

    let indices: Vec<String> = (0..result.rows.len()).map(|i| i.to_string()).collect();
    let body: Vec<Vec<&str>> = result
        .rows
        .iter()
        .zip(&indices)
        .map(|(row, idx)| {
            iter::once(idx.as_str())
                .chain(row.iter().map(String::as_str))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|col| {
            iter::once(header[col])
                .chain(body.iter().filter_map(|row| row.get(col).copied()))
                .map(UnicodeWidthStr::width)
                .max()
                .unwrap_or(0)
                + 2
        })
        .collect();

    let mut out = String::new();
    out.push_str(&rule(&widths, '┌', '┬', '┐'));
    out.push_str(&line(&header, &widths));
    out.push_str(&rule(&widths, '├', '┼', '┤'));
    for row in &body {
        out.push_str(&line(row, &widths));
    }
    out.push_str(&rule(&widths, '└', '┴', '┘'));
    out
}

fn rule(widths: &[usize], left: char, mid: char, right: char) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    format!("{left}{}{right}\n", segments.join(&mid.to_string()))
}

fn line(cells: &[&str], widths: &[usize]) -> String {
    let padded: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(col, width)| center(cells.get(col).copied().unwrap_or(""), *width))
        .collect();
    format!("│{}│\n", padded.join("│"))
}

fn center(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(text.width());
    let left = pad / 2;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(pad - left))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn result(columns: &[&str], rows: &[&[&str]]) -> QueryResult {
        QueryResult {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn renders_rows_with_index_column() {
        let table = render_table(&result(&["id", "name"], &[&["2", "Asha"], &["1", "Ravi"]]));
        let expected = "\
┌─────────┬────┬──────┐
│ (index) │ id │ name │
├─────────┼────┼──────┤
│    0    │ 2  │ Asha │
│    1    │ 1  │ Ravi │
└─────────┴────┴──────┘
";
        assert_eq!(table, expected);
    }

    #[test]
    fn empty_result_only_has_index_header() {
        let expected = "\
┌─────────┐
│ (index) │
├─────────┤
└─────────┘
";
        assert_eq!(render_table(&QueryResult::empty()), expected);
    }

    #[test]
    fn wide_characters_use_display_width() {
        let table = render_table(&result(&["name"], &[&["李雷"]]));
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "┌─────────┬──────┐");
        assert_eq!(lines[3], "│    0    │ 李雷 │");
    }

    #[test]
    fn name_list_is_comma_separated() {
        let names = vec!["alumni".to_string(), "events".to_string()];
        assert_eq!(
            render_name_list("Tables in alumni_db", &names),
            "Tables in alumni_db: alumni, events"
        );
        assert_eq!(render_name_list("Databases", &[]), "Databases: ");
    }
}
