//! List-literal cell expansion.
//!
//! The medication and diet datasets store lists as Python-style literals in a
//! single cell, e.g. `['Antifungal Cream', 'Fluconazole']`.

/// Expand a cell into its items.
///
/// A bracketed cell yields its quoted (or, failing that, comma-separated)
/// items; any other non-empty cell yields itself. Empty items are dropped.
pub fn expand_list_literal(cell: &str) -> Vec<String> {
    let cell = cell.trim();
    let Some(inner) = cell
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    else {
        return if cell.is_empty() {
            Vec::new()
        } else {
            vec![cell.to_string()]
        };
    };

    if inner.contains('\'') || inner.contains('"') {
        quoted_items(inner)
    } else {
        inner
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Collect every quoted string in `inner`, honoring backslash escapes.
fn quoted_items(inner: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\'' && c != '"' {
            continue;
        }
        let quote = c;
        let mut item = String::new();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        item.push(escaped);
                    }
                }
                c if c == quote => break,
                c => item.push(c),
            }
        }
        let item = item.trim();
        if !item.is_empty() {
            items.push(item.to_string());
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_cell_is_single_item() {
        assert_eq!(expand_list_literal("Stay hydrated"), vec!["Stay hydrated"]);
        assert!(expand_list_literal("  ").is_empty());
    }

    #[test]
    fn quoted_list_expands() {
        let items = expand_list_literal("['Antifungal Cream', 'Fluconazole', 'Terbinafine']");
        assert_eq!(items, vec!["Antifungal Cream", "Fluconazole", "Terbinafine"]);
    }

    #[test]
    fn commas_inside_quotes_are_kept() {
        let items = expand_list_literal(r#"["Rest, if tired", 'Fluids']"#);
        assert_eq!(items, vec!["Rest, if tired", "Fluids"]);
    }

    #[test]
    fn escaped_quote_is_kept() {
        let items = expand_list_literal(r"['Doctor\'s advice']");
        assert_eq!(items, vec!["Doctor's advice"]);
    }

    #[test]
    fn unquoted_list_splits_on_commas() {
        assert_eq!(expand_list_literal("[a, b, ,c]"), vec!["a", "b", "c"]);
        assert!(expand_list_literal("[]").is_empty());
    }
}
