use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Fields, ItemEnum, Type};

pub fn ext_repr(input: TokenStream, source_item: TokenStream) -> TokenStream {
    let source_item_ts2 = TokenStream2::from(source_item.clone());
    let item = parse_macro_input!(source_item as ItemEnum);
    let enum_name = &item.ident;
    let target_type = parse_macro_input!(input as Type);

    if item
        .variants
        .iter()
        .any(|variant| !matches!(variant.fields, Fields::Unit))
    {
        panic!("ext_repr only supports fieldless enums");
    }

    let idents: Vec<_> = item.variants.iter().map(|variant| &variant.ident).collect();
    let paths: Vec<_> = idents
        .iter()
        .map(|ident| quote! { #enum_name::#ident })
        .collect();
    let name_arms = idents.iter().map(|ident| {
        quote! { #enum_name::#ident => stringify!(#ident), }
    });

    // Comparing against `Variant as T` keeps explicit and implicit discriminants working alike
    let try_from_arms = idents.iter().map(|ident| {
        quote! {
            if value == #enum_name::#ident as #target_type {
                return Ok(#enum_name::#ident);
            }
        }
    });

    quote! {
        #[repr(#target_type)]
        #source_item_ts2

        impl ::std::convert::TryFrom<#target_type> for #enum_name {
            type Error = ::lithdat_utils::EnumParseError;

            fn try_from(value: #target_type) -> Result<Self, ::lithdat_utils::EnumParseError> {
                #(#try_from_arms)*
                Err(::lithdat_utils::EnumParseError)
            }
        }

        impl ::std::convert::From<#enum_name> for #target_type {
            fn from(value: #enum_name) -> #target_type {
                value as #target_type
            }
        }

        impl #enum_name {
            /// Every variant, in order of declaration.
            pub const ALL: &'static [#enum_name] = &[#(#paths),*];

            /// Name of the variant, as written in code.
            pub const fn name(self) -> &'static str {
                match self {
                    #(#name_arms)*
                }
            }
        }
    }
    .into()
}
