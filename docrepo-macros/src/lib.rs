//! Procedural macros for the docrepo project.
//!
//! ## `Entity`
//!
//! Derives the `Entity` trait for structs with named fields, producing the static field table
//! the repository helpers resolve logical field names against.
//!
//! - **Container attribute**: `#[entity(name = "...")]` overrides the entity name (defaults to
//!   the struct name)
//! - **Field attribute**: `#[entity(key = "...")]` declares the storage tag explicitly
//!
//! Without `#[entity(key)]`, a field's `#[serde(rename = "...")]` is used as its tag. A field
//! with neither has no storage key, and resolving it fails at runtime.
//!
//! ```rust,ignore
//! use docrepo::Entity;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
//! #[entity(name = "TestData")]
//! pub struct TestData {
//!     #[serde(rename = "name")]
//!     pub name: String,
//!     #[serde(rename = "seq", default, skip_serializing_if = "is_zero")]
//!     #[entity(key = "seq,omitempty")]
//!     pub seq: i64,
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docrepo_macros;

mod entity;

use proc_macro::TokenStream;
use syn::{Data, DeriveInput, parse_macro_input};

use crate::entity::generate_entity_for_struct;

/// Derives `docrepo::entity::Entity`.
///
/// # Errors
///
/// Returns a compile error if applied to an enum, a union, or a tuple or unit struct, or if an
/// `entity` attribute is malformed.
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    let result = match &ast.data {
        Data::Struct(data) => generate_entity_for_struct(&ast, data),
        Data::Enum(_) | Data::Union(_) => Err(syn::Error::new_spanned(
            &ast.ident,
            "Entity can only be derived for structs with named fields",
        )),
    };

    result
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
