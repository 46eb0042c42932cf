use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Index};

pub fn packed_data_derive(input: TokenStream) -> TokenStream {
    let parsed = parse_macro_input!(input as DeriveInput);
    let name = parsed.ident;
    let (impl_generics, ty_generics, where_clause) = parsed.generics.split_for_impl();

    let data = match parsed.data {
        Data::Struct(data) => data,
        _ => panic!("PackedData can only be derived for structs"),
    };

    let mut writers = TokenStream2::new();
    let reader = match data.fields {
        Fields::Named(fields) => {
            let mut initializers = TokenStream2::new();
            for field in fields.named {
                let field_name = field.ident.expect("expected valid field name");
                let field_ty = field.ty;

                initializers.extend(quote! {
                    #field_name: ::lithdat::error::DecodeResultExt::field(
                        <#field_ty as ::lithdat::packed::PackedData>::read_packed(c),
                        stringify!(#field_name),
                    )?,
                });
                writers.extend(quote! {
                    <#field_ty as ::lithdat::packed::PackedData>::write_packed(
                        &self.#field_name,
                        w,
                    )?;
                });
            }
            quote! { Self { #initializers } }
        }
        Fields::Unnamed(fields) => {
            let mut initializers = TokenStream2::new();
            for (i, field) in fields.unnamed.into_iter().enumerate() {
                let index = Index::from(i);
                let label = i.to_string();
                let field_ty = field.ty;

                initializers.extend(quote! {
                    ::lithdat::error::DecodeResultExt::field(
                        <#field_ty as ::lithdat::packed::PackedData>::read_packed(c),
                        #label,
                    )?,
                });
                writers.extend(quote! {
                    <#field_ty as ::lithdat::packed::PackedData>::write_packed(&self.#index, w)?;
                });
            }
            quote! { Self(#initializers) }
        }
        Fields::Unit => quote! { Self },
    };

    quote! {
        impl #impl_generics ::lithdat::packed::PackedData for #name #ty_generics #where_clause {
            fn read_packed<R: ::std::io::Read + ::std::io::Seek>(
                c: &mut ::lithdat::cursor::ByteCursor<R>,
            ) -> ::lithdat::error::DecodeResult<Self> {
                Ok(#reader)
            }

            fn write_packed<W: ::std::io::Write>(
                &self,
                w: &mut W,
            ) -> ::lithdat_utils::AnyResult {
                #writers
                Ok(())
            }
        }
    }
    .into()
}
