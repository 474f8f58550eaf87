mod decode_attribute;
mod decode_record;
mod encode_attribute;
mod enumeration;

use decode_record::decode_record;
use encode_attribute::encode_attribute;
use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemEnum, ItemStruct, parse_macro_input};

/// Implements `skiff::Record` for a struct with named fields.
///
/// Struct attribute: `#[skiff(table = "name")]`.
/// Field attributes: `column = ".."`, `key`, `sequence = ".."`, `ignore_dialects = "a, b"`,
/// `timestamp`, `ignore`, `enumeration`, `getter = ".."` together with `setter = ".."`.
#[proc_macro_derive(Record, attributes(skiff))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    let metadata = match decode_record(&item) {
        Ok(v) => v,
        Err(e) => return e.to_compile_error().into(),
    };
    let name = &item.ident;
    let (impl_generics, ty_generics, where_clause) = item.generics.split_for_impl();
    let relation = metadata
        .relation
        .as_ref()
        .map(|v| quote!(.relation(#v)));
    let attributes = metadata.attributes.iter().map(encode_attribute);
    quote! {
        impl #impl_generics ::skiff::Record for #name #ty_generics #where_clause {
            fn declare() -> ::skiff::RecordDeclaration<Self> {
                ::skiff::RecordDeclaration::new(::std::any::type_name::<Self>())
                    #relation
                    #(.attribute(#attributes))*
            }
        }
    }
    .into()
}

/// Implements `skiff::Enumeration` for an enum with unit variants.
///
/// A variant is persisted through its name, override it with `#[skiff(name = "..")]`.
#[proc_macro_derive(Enumeration, attributes(skiff))]
pub fn derive_enumeration(input: TokenStream) -> TokenStream {
    let item: ItemEnum = parse_macro_input!(input as ItemEnum);
    enumeration::enumeration(&item)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
