use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    Attribute, DataStruct, DeriveInput, Expr, ExprLit, Fields, Lit, LitStr, Meta, Result, Token,
    punctuated::Punctuated,
};

pub(crate) fn generate_entity_for_struct(ast: &DeriveInput, data: &DataStruct) -> Result<TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            name,
            "Entity can only be derived for structs with named fields",
        ));
    };

    let mut entity_name = name.to_string();

    for attr in &ast.attrs {
        if attr.path().is_ident("entity") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let s: LitStr = meta.value()?.parse()?;
                    entity_name = s.value();
                    Ok(())
                } else {
                    Err(meta.error("unknown entity attribute, expected `name`"))
                }
            })?;
        }
    }

    let mut mappings = Vec::with_capacity(fields.named.len());

    for field in &fields.named {
        let Some(ident) = &field.ident else {
            continue;
        };

        let field_name = ident.to_string();
        let field_name = field_name.strip_prefix("r#").unwrap_or(&field_name).to_string();
        let tag = match entity_key(&field.attrs)? {
            Some(key) => key,
            None => serde_rename(&field.attrs)?.unwrap_or_default(),
        };

        mappings.push(quote! {
            ::docrepo::entity::FieldMapping::new(#field_name, #tag)
        });
    }

    Ok(quote! {
        impl #impl_generics ::docrepo::entity::Entity for #name #ty_generics #where_clause {
            fn entity_name() -> &'static str {
                #entity_name
            }

            fn field_mappings() -> &'static [::docrepo::entity::FieldMapping] {
                const MAPPINGS: &[::docrepo::entity::FieldMapping] = &[#(#mappings),*];
                MAPPINGS
            }
        }
    })
}

/// Reads `#[entity(key = "...")]` from a field.
fn entity_key(attrs: &[Attribute]) -> Result<Option<String>> {
    let mut key = None;

    for attr in attrs {
        if attr.path().is_ident("entity") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("key") {
                    let s: LitStr = meta.value()?.parse()?;
                    key = Some(s.value());
                    Ok(())
                } else {
                    Err(meta.error("unknown entity field attribute, expected `key`"))
                }
            })?;
        }
    }

    Ok(key)
}

/// Reads `rename = "..."` from a field's serde attributes, ignoring everything else.
fn serde_rename(attrs: &[Attribute]) -> Result<Option<String>> {
    for attr in attrs {
        if !attr.path().is_ident("serde") {
            continue;
        }

        let nested = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;

        for meta in nested {
            let Meta::NameValue(pair) = meta else {
                continue;
            };

            if !pair.path.is_ident("rename") {
                continue;
            }

            if let Expr::Lit(ExprLit { lit: Lit::Str(value), .. }) = &pair.value {
                return Ok(Some(value.value()));
            }
        }
    }

    Ok(None)
}
