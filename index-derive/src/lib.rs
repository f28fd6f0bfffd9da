extern crate proc_macro;

use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

use proc_macro::TokenStream;

/// Derive `crate::strong::IndexBase` for a single-field tuple struct
///
/// The wrapped integer becomes the underlying index type.
#[proc_macro_derive(IndexBase)]
pub fn impl_index_base(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    let name = &ast.ident;

    let field_type = match &ast.data {
        Data::Struct(data) => match &data.fields {
            Fields::Unnamed(fields) if fields.unnamed.len() == 1 => &fields.unnamed[0].ty,
            _ => {
                return syn::Error::new_spanned(name, "IndexBase needs a tuple struct with exactly one field")
                    .to_compile_error()
                    .into();
            }
        },
        _ => {
            return syn::Error::new_spanned(name, "IndexBase can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let expanded = quote! {
        impl crate::strong::IndexBase for #name {
            type Type = #field_type;

            fn get(&self) -> #field_type {
                self.0
            }
        }

        impl From<#field_type> for #name {
            fn from(value: #field_type) -> Self {
                #name(value)
            }
        }

        impl From<#name> for #field_type {
            fn from(value: #name) -> Self {
                value.0
            }
        }
    };

    TokenStream::from(expanded)
}
