//! Attribute parsing for the Record derive macro.
//!
//! Field level: `#[orm(column = "..", tag = "..", omit_empty, skip, flatten)]`.
//! Container level: `#[orm(rename_all = "snake_case")]`.

use heck::{ToKebabCase, ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use syn::{DeriveInput, LitStr, Result};

/// Parsed field-level `#[orm(...)]` options.
#[derive(Default)]
pub(crate) struct FieldAttr {
    pub column: Option<String>,
    pub tag: Option<String>,
    pub omit_empty: bool,
    pub skip: bool,
    pub flatten: bool,
}

impl syn::parse::Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut out = FieldAttr::default();

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            match ident.to_string().as_str() {
                "omit_empty" => out.omit_empty = true,
                "skip" => out.skip = true,
                "flatten" => out.flatten = true,
                "column" | "tag" => {
                    let _: syn::Token![=] = input.parse()?;
                    let value: LitStr = input.parse()?;
                    if ident == "column" {
                        out.column = Some(value.value());
                    } else {
                        out.tag = Some(value.value());
                    }
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown orm attribute `{other}`"),
                    ));
                }
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        Ok(out)
    }
}

impl FieldAttr {
    /// Merge every `#[orm(...)]` on a field.
    pub(crate) fn from_field(field: &syn::Field) -> Result<Self> {
        let mut out = FieldAttr::default();
        for attr in &field.attrs {
            if !attr.path().is_ident("orm") {
                continue;
            }
            let parsed: FieldAttr = attr.parse_args()?;
            out.column = parsed.column.or(out.column);
            out.tag = parsed.tag.or(out.tag);
            out.omit_empty |= parsed.omit_empty;
            out.skip |= parsed.skip;
            out.flatten |= parsed.flatten;
        }
        if out.tag.is_some() && (out.column.is_some() || out.omit_empty) {
            return Err(syn::Error::new_spanned(
                field,
                "`tag` cannot be combined with `column` or `omit_empty`",
            ));
        }
        Ok(out)
    }
}

/// Case convention applied to member names without an explicit column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RenameAll {
    Lower,
    Upper,
    Snake,
    ScreamingSnake,
    Kebab,
    Camel,
    Pascal,
}

impl RenameAll {
    fn parse(lit: &LitStr) -> Result<Self> {
        Ok(match lit.value().as_str() {
            "lowercase" => Self::Lower,
            "UPPERCASE" => Self::Upper,
            "snake_case" => Self::Snake,
            "SCREAMING_SNAKE_CASE" => Self::ScreamingSnake,
            "kebab-case" => Self::Kebab,
            "camelCase" => Self::Camel,
            "PascalCase" => Self::Pascal,
            other => {
                return Err(syn::Error::new_spanned(
                    lit,
                    format!("unsupported rename_all rule \"{other}\""),
                ));
            }
        })
    }

    pub(crate) fn apply(self, name: &str) -> String {
        match self {
            Self::Lower => name.to_lowercase(),
            Self::Upper => name.to_uppercase(),
            Self::Snake => name.to_snake_case(),
            Self::ScreamingSnake => name.to_shouty_snake_case(),
            Self::Kebab => name.to_kebab_case(),
            Self::Camel => name.to_lower_camel_case(),
            Self::Pascal => name.to_upper_camel_case(),
        }
    }
}

/// Extract `#[orm(rename_all = "...")]` from the struct.
pub(crate) fn get_rename_all(input: &DeriveInput) -> Result<Option<RenameAll>> {
    for attr in &input.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let nested = attr.parse_args::<syn::MetaNameValue>()?;
        if !nested.path.is_ident("rename_all") {
            return Err(syn::Error::new_spanned(
                &nested.path,
                "expected `rename_all = \"...\"`",
            ));
        }
        if let syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(lit),
            ..
        }) = &nested.value
        {
            return RenameAll::parse(lit).map(Some);
        }
        return Err(syn::Error::new_spanned(&nested.value, "expected a string literal"));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_field_attr_flags_and_values() {
        let field: syn::Field = parse_quote! {
            #[orm(column = "user_name", omit_empty)]
            pub name: String
        };
        let attr = FieldAttr::from_field(&field).unwrap();
        assert_eq!(attr.column.as_deref(), Some("user_name"));
        assert!(attr.omit_empty);
        assert!(!attr.skip);
    }

    #[test]
    fn test_field_attr_rejects_unknown() {
        let field: syn::Field = parse_quote! {
            #[orm(primary)]
            pub id: i64
        };
        assert!(FieldAttr::from_field(&field).is_err());
    }

    #[test]
    fn test_tag_excludes_column() {
        let field: syn::Field = parse_quote! {
            #[orm(tag = "id,omitempty", column = "id")]
            pub id: i64
        };
        assert!(FieldAttr::from_field(&field).is_err());
    }

    #[test]
    fn test_rename_all() {
        let input: DeriveInput = parse_quote! {
            #[orm(rename_all = "camelCase")]
            struct S { pub user_id: i64 }
        };
        let rule = get_rename_all(&input).unwrap().unwrap();
        assert_eq!(rule.apply("user_id"), "userId");
        assert_eq!(RenameAll::ScreamingSnake.apply("userId"), "USER_ID");
    }
}
