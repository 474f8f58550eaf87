use crate::decode_attribute::{AttributeMetadata, decode_attribute};
use syn::{Fields, ItemStruct, LitStr, Result};

pub(crate) struct RecordMetadata {
    /// Relation name given by `#[skiff(table = "..")]`, derived from the type name otherwise.
    pub(crate) relation: Option<String>,
    pub(crate) attributes: Vec<AttributeMetadata>,
}

pub(crate) fn decode_record(item: &ItemStruct) -> Result<RecordMetadata> {
    let Fields::Named(fields) = &item.fields else {
        return Err(syn::Error::new_spanned(
            &item.ident,
            "Record can be derived only on structs with named fields",
        ));
    };
    let mut relation = None;
    for attr in &item.attrs {
        if !attr.path().is_ident("skiff") {
            continue;
        }
        attr.parse_nested_meta(|arg| {
            if arg.path.is_ident("table") {
                let value: LitStr = arg.value()?.parse().map_err(|_| {
                    arg.error("Error while parsing `table`, use it like: `#[skiff(table = \"my_table\")]`")
                })?;
                if relation.is_some() {
                    return Err(arg.error("Attribute `table` can appear just once on a record"));
                }
                relation = Some(value.value());
                Ok(())
            } else {
                Err(arg.error(format!(
                    "Unknown attribute `{}` on a record, expected `table`",
                    arg.path
                        .get_ident()
                        .map(ToString::to_string)
                        .unwrap_or_default()
                )))
            }
        })?;
    }
    let attributes = fields
        .named
        .iter()
        .map(decode_attribute)
        .collect::<Result<Vec<_>>>()?;
    Ok(RecordMetadata {
        relation,
        attributes,
    })
}
