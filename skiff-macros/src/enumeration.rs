use proc_macro2::TokenStream;
use quote::quote;
use syn::{Fields, ItemEnum, LitStr, Result};

pub(crate) fn enumeration(item: &ItemEnum) -> Result<TokenStream> {
    let ident = &item.ident;
    let mut variants = Vec::new();
    let mut names = Vec::new();
    for variant in &item.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "Enumeration can be derived only on enums with unit variants",
            ));
        }
        let mut name = variant.ident.to_string();
        for attr in &variant.attrs {
            if !attr.path().is_ident("skiff") {
                continue;
            }
            attr.parse_nested_meta(|arg| {
                if arg.path.is_ident("name") {
                    let value: LitStr = arg.value()?.parse()?;
                    name = value.value();
                    Ok(())
                } else {
                    Err(arg.error("Unknown attribute, expected `#[skiff(name = \"..\")]`"))
                }
            })?;
        }
        if names.contains(&name) {
            return Err(syn::Error::new_spanned(
                variant,
                format!("Name `{name}` is used by more than one variant"),
            ));
        }
        variants.push(&variant.ident);
        names.push(name);
    }
    let (impl_generics, ty_generics, where_clause) = item.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::skiff::Enumeration for #ident #ty_generics #where_clause {
            fn name(&self) -> &'static str {
                match self {
                    #(Self::#variants => #names,)*
                }
            }
            fn from_name(name: &str) -> ::std::option::Option<Self> {
                match name {
                    #(#names => ::std::option::Option::Some(Self::#variants),)*
                    _ => ::std::option::Option::None,
                }
            }
        }
    })
}
