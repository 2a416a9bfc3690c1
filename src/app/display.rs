use crate::domain::model::{Entity, StoredEntity};

/// Renders stored rows as a fixed-width table with `id` first.
pub fn render_table<E: Entity>(rows: &[StoredEntity<E>]) -> String {
    let mut header = vec!["id".to_string()];
    header.extend(E::COLUMNS.iter().map(|c| c.name.to_string()));

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let mut line = vec![row.id.to_string()];
            line.extend(row.record.values().iter().map(|v| v.to_string()));
            line
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            cells
                .iter()
                .map(|line| line[i].chars().count())
                .chain(std::iter::once(header[i].len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_line = |line: &[String]| -> String {
        line.iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let rule_len = widths.iter().sum::<usize>() + 3 * widths.len().saturating_sub(1);
    let rule = "-".repeat(rule_len);

    let mut out = format!("--- {} in database ({} shown) ---\n", E::TABLE, rows.len());
    out.push_str(&format_line(&header));
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');
    for line in &cells {
        out.push_str(&format_line(line));
        out.push('\n');
    }
    out.push_str(&rule);
    out.push('\n');
    out
}
