//! Procedural macros for the docbucket project.
//!
//! Provides `#[derive(Document)]`, which implements `Keyed` and `Document` for a
//! struct with named fields. Exactly one field must be marked `#[document(key)]`;
//! its type must implement `docbucket::document::KeyField`.
//!
//! The generated `schema()` lists every serialized field with the name serde writes
//! it under, honouring `#[serde(rename = "...")]`. Fields marked `skip`,
//! `skip_serializing` or `flatten` are left out.

#[allow(unused_extern_crates)]
extern crate self as docbucket_macros;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Data, DeriveInput, Expr, ExprLit, Field, Fields, Ident, Lit, Meta, Token, ext::IdentExt, parse_macro_input,
    punctuated::Punctuated, spanned::Spanned,
};

#[proc_macro_derive(Document, attributes(document))]
pub fn derive_document(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input).unwrap_or_else(syn::Error::into_compile_error).into()
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => return Err(syn::Error::new(input.span(), "Document can only be derived for structs with named fields")),
        },
        _ => return Err(syn::Error::new(input.span(), "Document can only be derived for structs")),
    };

    let mut key_field: Option<&Ident> = None;
    let mut aliases = Vec::new();

    for field in fields {
        let Some(ident) = field.ident.as_ref() else { continue };

        if is_key(field)? {
            if key_field.is_some() {
                return Err(syn::Error::new(field.span(), "only one field may be marked #[document(key)]"));
            }
            key_field = Some(ident);
        }

        let serde = SerdeField::parse(field)?;
        if serde.omitted {
            continue;
        }
        let primary = ident.unraw().to_string();
        let serialized = serde.rename.unwrap_or_else(|| primary.clone());
        aliases.push(quote! { ::docbucket::schema::FieldAlias::new(#primary, #serialized) });
    }

    let key_field = key_field
        .ok_or_else(|| syn::Error::new(input.span(), "Document requires one field marked #[document(key)]"))?;

    Ok(quote! {
        impl #impl_generics ::docbucket::document::Keyed for #name #ty_generics #where_clause {
            fn key(&self) -> ::std::borrow::Cow<'_, [u8]> {
                ::std::borrow::Cow::Borrowed(::docbucket::document::KeyField::as_key(&self.#key_field))
            }
        }

        impl #impl_generics ::docbucket::document::Document for #name #ty_generics #where_clause {
            fn assign_key(&mut self, key: &[u8]) {
                ::docbucket::document::KeyField::set_key(&mut self.#key_field, key)
            }

            fn schema() -> ::docbucket::schema::Schema {
                ::docbucket::schema::Schema::new(::std::vec![#(#aliases),*])
            }
        }
    })
}

fn is_key(field: &Field) -> syn::Result<bool> {
    let mut key = false;
    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("document")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("key") {
                key = true;
                Ok(())
            } else {
                Err(meta.error("unsupported document attribute, expected `key`"))
            }
        })?;
    }
    Ok(key)
}

/// The parts of a field's `#[serde(...)]` attributes that affect its schema entry.
#[derive(Default)]
struct SerdeField {
    rename: Option<String>,
    omitted: bool,
}

impl SerdeField {
    fn parse(field: &Field) -> syn::Result<Self> {
        let mut parsed = SerdeField::default();
        for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
            let metas = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
            for meta in metas {
                match &meta {
                    Meta::NameValue(nv) if nv.path.is_ident("rename") => {
                        if let Expr::Lit(ExprLit { lit: Lit::Str(name), .. }) = &nv.value {
                            parsed.rename = Some(name.value());
                        }
                    }
                    Meta::List(list) if list.path.is_ident("rename") => {
                        // rename(serialize = "..", deserialize = "..")
                        let pairs = list.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
                        for pair in pairs {
                            if let Meta::NameValue(nv) = pair {
                                if nv.path.is_ident("serialize") {
                                    if let Expr::Lit(ExprLit { lit: Lit::Str(name), .. }) = &nv.value {
                                        parsed.rename = Some(name.value());
                                    }
                                }
                            }
                        }
                    }
                    Meta::Path(path)
                        if path.is_ident("skip") || path.is_ident("skip_serializing") || path.is_ident("flatten") =>
                    {
                        parsed.omitted = true;
                    }
                    _ => {}
                }
            }
        }
        Ok(parsed)
    }
}
