//! Record derive macro implementation

use crate::attrs::{FieldAttr, get_rename_all};
use proc_macro2::{Literal, TokenStream};
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let rename_all = get_rename_all(&input)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Record can only be derived for structs",
            ));
        }
    };

    let mut defs = Vec::with_capacity(fields.len());
    let mut get_arms = Vec::new();
    let mut set_arms = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let attr = FieldAttr::from_field(field)?;
        let member = ident.to_string();
        let public = matches!(field.vis, syn::Visibility::Public(_));
        let ty = &field.ty;
        let index = Literal::usize_unsuffixed(index);

        let tag = if attr.skip {
            Some("-".to_string())
        } else if let Some(tag) = attr.tag {
            Some(tag)
        } else {
            let column = attr
                .column
                .or_else(|| rename_all.map(|rule| rule.apply(&member)));
            match (column, attr.omit_empty) {
                (None, false) => None,
                (column, omit_empty) => {
                    let mut tag = column.unwrap_or_default();
                    if omit_empty {
                        tag.push_str(",omitempty");
                    }
                    Some(tag)
                }
            }
        };
        let tag = match tag {
            Some(tag) => quote!(::std::option::Option::Some(#tag)),
            None => quote!(::std::option::Option::None),
        };

        if attr.flatten {
            defs.push(quote! {
                ::tabula::FieldDef::flatten::<#ty>(#member, #tag, #public)
            });
        } else {
            defs.push(quote! {
                ::tabula::FieldDef::leaf(#member, #tag, #public)
            });
        }

        // Members that never map to a column get no accessor arms.
        if !public || attr.skip {
            continue;
        }
        if attr.flatten {
            get_arms.push(quote! {
                [#index, rest @ ..] => ::tabula::Record::get(&self.#ident, rest),
            });
            set_arms.push(quote! {
                [#index, rest @ ..] => ::tabula::Record::set(&mut self.#ident, rest, value),
            });
        } else {
            get_arms.push(quote! {
                [#index] => ::std::result::Result::Ok(::tabula::ToValue::to_value(&self.#ident)),
            });
            set_arms.push(quote! {
                [#index] => {
                    self.#ident = ::tabula::FromValue::from_value(value)?;
                    ::std::result::Result::Ok(())
                }
            });
        }
    }

    Ok(quote! {
        impl #impl_generics ::tabula::Record for #name #ty_generics #where_clause {
            fn field_defs() -> ::std::vec::Vec<::tabula::FieldDef> {
                ::std::vec![#(#defs),*]
            }

            fn get(&self, path: &[usize]) -> ::tabula::OrmResult<::tabula::Value> {
                match path {
                    #(#get_arms)*
                    _ => ::std::result::Result::Err(::tabula::OrmError::field_path(
                        ::std::any::type_name::<Self>(),
                        path,
                    )),
                }
            }

            #[allow(unused_variables)]
            fn set(&mut self, path: &[usize], value: ::tabula::Value) -> ::tabula::OrmResult<()> {
                match path {
                    #(#set_arms)*
                    _ => ::std::result::Result::Err(::tabula::OrmError::field_path(
                        ::std::any::type_name::<Self>(),
                        path,
                    )),
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expand_str(input: DeriveInput) -> String {
        expand(input).unwrap().to_string()
    }

    #[test]
    fn test_leaf_fields() {
        let out = expand_str(parse_quote! {
            struct User {
                pub id: i64,
                #[orm(column = "user_name")]
                pub name: String,
                secret: String,
            }
        });
        assert!(out.contains("\"user_name\""));
        assert!(out.contains("false"));
        assert!(!out.contains("self . secret"));
        assert!(out.contains("[0]"));
        assert!(!out.contains("[2]"));
    }

    #[test]
    fn test_flatten_and_skip() {
        let out = expand_str(parse_quote! {
            struct Post {
                #[orm(flatten)]
                pub meta: Meta,
                #[orm(skip)]
                pub cache: u32,
                #[orm(omit_empty)]
                pub id: i64,
            }
        });
        assert!(out.contains("flatten :: < Meta >"));
        assert!(out.contains("rest @ .."));
        assert!(out.contains("Some (\"-\")"));
        assert!(out.contains("Some (\",omitempty\")"));
        assert!(!out.contains("[1]"));
    }

    #[test]
    fn test_rename_all_applies_without_column() {
        let out = expand_str(parse_quote! {
            #[orm(rename_all = "UPPERCASE")]
            struct Row {
                pub id: i64,
                #[orm(column = "Kept")]
                pub name: String,
            }
        });
        assert!(out.contains("Some (\"ID\")"));
        assert!(out.contains("Some (\"Kept\")"));
    }

    #[test]
    fn test_tuple_struct_rejected() {
        let err = expand(parse_quote! { struct Pair(pub i64, pub i64); }).unwrap_err();
        assert!(err.to_string().contains("named fields"));
    }
}
