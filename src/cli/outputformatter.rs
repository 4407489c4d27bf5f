use crate::identity::{NavItem, TestCredential};
use crate::security::{PermissionSet, PermissionTable, Role, Section};

/// Render rows as an ASCII table. Returns no lines when there are no rows.
pub fn render_table(cols: &[String], rows: &[Vec<String>]) -> Vec<String> {
    if rows.is_empty() { return Vec::new(); }
    let max_col_width: usize = 40; // cap to keep output readable
    let mut widths: Vec<usize> = cols.iter().map(|s| display_len(s).min(max_col_width)).collect();
    for r in rows {
        for (i, cell) in r.iter().enumerate().take(cols.len()) {
            let w = display_len(cell);
            if w > widths[i] { widths[i] = w.min(max_col_width); }
        }
    }
    let sep = build_separator(&widths);
    let mut out = Vec::with_capacity(rows.len() + 4);
    out.push(sep.clone());
    out.push(build_row(cols, &widths));
    out.push(sep.clone());
    for r in rows {
        out.push(build_row(r, &widths));
    }
    out.push(sep);
    out
}

fn flag(b: bool) -> String { if b { "yes".to_string() } else { "-".to_string() } }

/// One row per section for a single permission set.
pub fn render_permissions(set: &PermissionSet) -> Vec<String> {
    let cols = vec!["section".to_string(), "route".to_string(), "allowed".to_string()];
    let rows: Vec<Vec<String>> = Section::ALL
        .iter()
        .map(|s| vec![s.key().to_string(), s.route().to_string(), flag(set.get(*s))])
        .collect();
    render_table(&cols, &rows)
}

/// Role x section matrix for a whole table.
pub fn render_role_matrix(table: &PermissionTable) -> Vec<String> {
    let mut cols = vec!["role".to_string()];
    cols.extend(Section::ALL.iter().map(|s| s.key().to_string()));
    let rows: Vec<Vec<String>> = Role::ALL
        .iter()
        .map(|r| {
            let set = table.permissions_for(*r);
            let mut row = vec![r.as_str().to_string()];
            row.extend(Section::ALL.iter().map(|s| flag(set.get(*s))));
            row
        })
        .collect();
    render_table(&cols, &rows)
}

pub fn render_navigation(items: &[NavItem]) -> Vec<String> {
    let cols = vec!["label".to_string(), "path".to_string()];
    let rows: Vec<Vec<String>> = items.iter().map(|n| vec![n.label.to_string(), n.path.to_string()]).collect();
    render_table(&cols, &rows)
}

pub fn render_credentials(creds: &[TestCredential]) -> Vec<String> {
    let cols = vec!["username".to_string(), "password".to_string(), "role".to_string()];
    let rows: Vec<Vec<String>> = creds
        .iter()
        .map(|c| vec![c.username.to_string(), c.password.to_string(), c.role.as_str().to_string()])
        .collect();
    render_table(&cols, &rows)
}

fn display_len(s: &str) -> usize { s.chars().count() }

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('+');
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('|');
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).cloned().unwrap_or_default();
        let text = truncate(&cell, *w);
        s.push(' ');
        s.push_str(&text);
        let pad = w.saturating_sub(display_len(&text));
        s.push_str(&" ".repeat(pad));
        s.push(' ');
        s.push('|');
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    let len = s.chars().count();
    if len <= max { return s.to_string(); }
    if max <= 1 { return "…".to_string(); }
    let take = max - 1;
    s.chars().take(take).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_pads_to_widest_cell() {
        let cols = vec!["a".to_string(), "bb".to_string()];
        let rows = vec![vec!["xxx".to_string(), "y".to_string()]];
        let out = render_table(&cols, &rows);
        assert_eq!(out[0], "+-----+----+");
        assert_eq!(out[1], "| a   | bb |");
        assert_eq!(out[3], "| xxx | y  |");
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn empty_rows_render_nothing() {
        assert!(render_table(&["a".to_string()], &[]).is_empty());
    }

    #[test]
    fn truncates_long_cells() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
    }

    #[test]
    fn role_matrix_has_a_row_per_role() {
        let out = render_role_matrix(&PermissionTable::builtin());
        // separator, header, separator, 6 rows, separator
        assert_eq!(out.len(), 3 + Role::COUNT + 1);
        assert!(out.iter().any(|l| l.starts_with("| Assistant Director")));
    }
}
