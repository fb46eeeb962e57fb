/// Minimal CSV writer for the export endpoints: every field is quoted,
/// embedded quotes are doubled, rows are joined with `\n`.

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

pub fn build_csv(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);

    lines.push(header.iter().map(|f| quote(f)).collect::<Vec<_>>().join(","));
    for row in rows {
        lines.push(row.iter().map(|f| quote(f)).collect::<Vec<_>>().join(","));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_quoted_and_escaped() {
        let rows = vec![vec!["a \"b\"".to_string(), "c,d".to_string()]];
        let csv = build_csv(&["H1", "H2"], &rows);

        assert_eq!(csv, "\"H1\",\"H2\"\n\"a \"\"b\"\"\",\"c,d\"");
    }

    #[test]
    fn header_only_when_no_rows() {
        assert_eq!(build_csv(&["Date"], &[]), "\"Date\"");
    }
}
