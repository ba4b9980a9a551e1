//! SQL identifier quoting.
//!
//! Table and column names are always emitted as ANSI quoted identifiers:
//! the name is wrapped in `"` and any embedded `"` is doubled.
//!
//! ```ignore
//! assert_eq!(tabula::ident::quote_ident("users"), r#""users""#);
//! assert_eq!(tabula::ident::quote_ident(r#"we"ird"#), r#""we""ird""#);
//! ```

use crate::error::{OrmError, OrmResult};

/// Quote a single identifier.
pub fn quote_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    write_quoted(&mut out, name);
    out
}

/// Append a quoted identifier to `out`.
pub fn write_quoted(out: &mut String, name: &str) {
    out.push('"');
    for ch in name.chars() {
        if ch == '"' {
            out.push('"');
            out.push('"');
        } else {
            out.push(ch);
        }
    }
    out.push('"');
}

/// Append `"table"."column"` (or just `"column"` when no table is given).
pub fn write_qualified(out: &mut String, table: Option<&str>, column: &str) {
    if let Some(table) = table {
        write_quoted(out, table);
        out.push('.');
    }
    write_quoted(out, column);
}

/// Reject names that can never form a valid quoted identifier.
pub fn validate_ident(kind: &str, name: &str) -> OrmResult<()> {
    if name.is_empty() {
        return Err(OrmError::schema(format!("{kind} name cannot be empty")));
    }
    if name.contains('\0') {
        return Err(OrmError::schema(format!(
            "{kind} name cannot contain NUL character"
        )));
    }
    Ok(())
}
