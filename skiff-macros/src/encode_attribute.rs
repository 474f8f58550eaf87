use crate::decode_attribute::AttributeMetadata;
use proc_macro2::TokenStream;
use quote::quote;
use skiff_core::DeclaredType;

/// Accessor pair of an enumeration valued attribute.
fn enumeration_accessors(metadata: &AttributeMetadata) -> (TokenStream, TokenStream) {
    let field = &metadata.ident;
    match metadata.option_inner() {
        Some(inner) => (
            quote!(|record: &Self| ::skiff::enumeration_value(record.#field.as_ref())),
            quote!(|record: &mut Self, value: ::skiff::Value| {
                record.#field = ::skiff::enumeration_from_value::<#inner>(value)?;
                Ok(())
            }),
        ),
        None => {
            let ty = &metadata.ty;
            (
                quote!(|record: &Self| ::skiff::enumeration_value(Some(&record.#field))),
                quote!(|record: &mut Self, value: ::skiff::Value| {
                    record.#field = ::skiff::enumeration_from_value::<#ty>(value)?.ok_or_else(
                        || ::skiff::Error::conversion("null", ::std::any::type_name::<#ty>()),
                    )?;
                    Ok(())
                }),
            )
        }
    }
}

/// Expression building the `AttributeDeclaration` of one field.
pub(crate) fn encode_attribute(metadata: &AttributeMetadata) -> TokenStream {
    let name = &metadata.name;
    let field = &metadata.ident;
    let ty = &metadata.ty;
    let mut result = if metadata.ignore {
        return quote!(::skiff::AttributeDeclaration::ignored(#name));
    } else if metadata.enumeration {
        let (get, set) = enumeration_accessors(metadata);
        quote!(::skiff::AttributeDeclaration::field(
            #name,
            ::skiff::ValueKind::Enumeration,
            #get,
            #set,
        ))
    } else {
        match &metadata.declared {
            Err(type_name) => {
                return quote!(::skiff::AttributeDeclaration::unsupported(#name, #type_name));
            }
            Ok(DeclaredType::Collection) => {
                return quote!(::skiff::AttributeDeclaration::collection(#name));
            }
            Ok(DeclaredType::Value(..)) => {
                if let (Some(getter), Some(setter)) = (&metadata.getter, &metadata.setter) {
                    quote!(::skiff::AttributeDeclaration::property(
                        #name,
                        <#ty as ::skiff::AsValue>::KIND,
                        |record: &Self| ::skiff::AsValue::as_value(record.#getter()),
                        |record: &mut Self, value: ::skiff::Value| {
                            record.#setter(<#ty as ::skiff::AsValue>::try_from_value(value)?);
                            Ok(())
                        },
                    ))
                } else {
                    quote!(::skiff::AttributeDeclaration::field(
                        #name,
                        <#ty as ::skiff::AsValue>::KIND,
                        |record: &Self| {
                            ::skiff::AsValue::as_value(::std::clone::Clone::clone(&record.#field))
                        },
                        |record: &mut Self, value: ::skiff::Value| {
                            record.#field = <#ty as ::skiff::AsValue>::try_from_value(value)?;
                            Ok(())
                        },
                    ))
                }
            }
        }
    };
    if let Some(column) = &metadata.column {
        result = quote!(#result.column(#column));
    }
    if metadata.key {
        result = quote!(#result.key());
    }
    if let Some(sequence) = &metadata.sequence {
        result = quote!(#result.sequence(#sequence));
    }
    if !metadata.ignore_dialects.is_empty() {
        let dialects = &metadata.ignore_dialects;
        result = quote!(#result.ignore_dialects([#(#dialects),*]));
    }
    if metadata.timestamp {
        result = quote!(#result.timestamp());
    }
    result
}
