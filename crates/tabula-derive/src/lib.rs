//! Derive macros for tabula
//!
//! Provides `#[derive(Record)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod record;

/// Derive the `Record` trait for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use tabula::Record;
///
/// #[derive(Record, Default)]
/// struct User {
///     #[orm(omit_empty)]
///     pub id: i64,
///     #[orm(column = "user_name")]
///     pub name: String,
///     #[orm(flatten)]
///     pub audit: Audit,
///     #[orm(skip)]
///     pub cached: bool,
/// }
/// ```
///
/// Only `pub` fields map to columns.
///
/// # Attributes
///
/// - `#[orm(column = "name")]` - Map field to a different column name
/// - `#[orm(omit_empty)]` - Leave the column out of INSERT when the value is empty
/// - `#[orm(skip)]` - Never map this field
/// - `#[orm(flatten)]` - Splice the fields of a nested `Record` into this one
/// - `#[orm(tag = "name,omitempty")]` - Raw tag, instead of `column`/`omit_empty`
/// - `#[orm(rename_all = "snake_case")]` - On the struct: naming rule for fields without `column`
#[proc_macro_derive(Record, attributes(orm))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
