use std::fmt::Write as _;

/// Renders rows under a header line and a dashed separator. Numeric cells are
/// right aligned; everything else is left aligned.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|h| h.chars().count().max(3))
        .collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(sanitize(cell).chars().count());
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

/// Two-column `field  value` rendering for a single record.
pub fn render_pairs(pairs: &[(&str, String)]) -> String {
    let headers = vec!["field".to_string(), "value".to_string()];
    let rows = pairs
        .iter()
        .map(|(key, value)| vec![(*key).to_string(), value.clone()])
        .collect::<Vec<_>>();
    render_table(&headers, &rows)
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let line = values
        .iter()
        .zip(widths)
        .map(|(value, &width)| {
            let cell = sanitize(value);
            if looks_numeric(&cell) {
                format!("{cell:>width$}")
            } else {
                format!("{cell:<width$}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

fn sanitize(value: &str) -> String {
    value.replace(['\n', '\r', '\t'], " ")
}

fn looks_numeric(value: &str) -> bool {
    !value.is_empty() && value.parse::<f64>().is_ok()
}
