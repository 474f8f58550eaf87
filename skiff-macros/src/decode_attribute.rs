use quote::ToTokens;
use skiff_core::{DeclaredType, decode_type_name};
use syn::{
    Field, GenericArgument, Ident, LitStr, PathArguments, Result, Type, meta::ParseNestedMeta,
};

/// What the derive learned about a single field.
pub(crate) struct AttributeMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) name: String,
    pub(crate) column: Option<String>,
    pub(crate) key: bool,
    pub(crate) sequence: Option<String>,
    pub(crate) ignore_dialects: Vec<String>,
    pub(crate) timestamp: bool,
    pub(crate) ignore: bool,
    pub(crate) enumeration: bool,
    pub(crate) getter: Option<Ident>,
    pub(crate) setter: Option<Ident>,
    /// Outcome of decoding the field type, the type text when unsupported.
    pub(crate) declared: std::result::Result<DeclaredType, String>,
}

impl AttributeMetadata {
    /// The `T` in `Option<T>`, when the field is syntactically optional.
    pub(crate) fn option_inner(&self) -> Option<&Type> {
        let Type::Path(path) = &self.ty else {
            return None;
        };
        let segment = path.path.segments.last()?;
        if segment.ident != "Option" {
            return None;
        }
        let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
            return None;
        };
        match arguments.args.first()? {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        }
    }
}

fn lit_str(arg: &ParseNestedMeta, usage: &str) -> Result<String> {
    let value: LitStr = arg
        .value()?
        .parse()
        .map_err(|_| arg.error(format!("Error while parsing, use it like: `{usage}`")))?;
    Ok(value.value())
}

fn flag(arg: &ParseNestedMeta, usage: &str) -> Result<()> {
    if arg.input.peek(syn::Token![=]) || arg.input.peek(syn::token::Paren) {
        return Err(arg.error(format!("Unexpected value, use it like: `{usage}`")));
    }
    Ok(())
}

pub(crate) fn decode_attribute(field: &Field) -> Result<AttributeMetadata> {
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new_spanned(field, "Field is expected to have a name"))?;
    let name = ident.to_string().trim_start_matches("r#").to_string();
    let type_text = field.ty.to_token_stream().to_string();
    let mut metadata = AttributeMetadata {
        ident,
        ty: field.ty.clone(),
        name,
        column: None,
        key: false,
        sequence: None,
        ignore_dialects: Vec::new(),
        timestamp: false,
        ignore: false,
        enumeration: false,
        getter: None,
        setter: None,
        declared: decode_type_name(&type_text).map_err(|_| type_text),
    };
    for attr in &field.attrs {
        if !attr.path().is_ident("skiff") {
            continue;
        }
        attr.parse_nested_meta(|arg| {
            if arg.path.is_ident("column") {
                metadata.column = Some(lit_str(&arg, "#[skiff(column = \"my_column\")]")?);
            } else if arg.path.is_ident("key") {
                flag(&arg, "#[skiff(key)]")?;
                metadata.key = true;
            } else if arg.path.is_ident("sequence") {
                metadata.sequence = Some(lit_str(&arg, "#[skiff(sequence = \"my_seq\")]")?);
            } else if arg.path.is_ident("ignore_dialects") {
                let value = lit_str(&arg, "#[skiff(ignore_dialects = \"mysql, sqlite\")]")?;
                metadata.ignore_dialects.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(String::from),
                );
            } else if arg.path.is_ident("timestamp") {
                flag(&arg, "#[skiff(timestamp)]")?;
                metadata.timestamp = true;
            } else if arg.path.is_ident("ignore") {
                flag(&arg, "#[skiff(ignore)]")?;
                metadata.ignore = true;
            } else if arg.path.is_ident("enumeration") {
                flag(&arg, "#[skiff(enumeration)]")?;
                metadata.enumeration = true;
            } else if arg.path.is_ident("getter") {
                let value = lit_str(&arg, "#[skiff(getter = \"method\")]")?;
                metadata.getter = Some(syn::parse_str(&value)?);
            } else if arg.path.is_ident("setter") {
                let value = lit_str(&arg, "#[skiff(setter = \"method\")]")?;
                metadata.setter = Some(syn::parse_str(&value)?);
            } else {
                return Err(arg.error(format!(
                    "Unknown attribute `{}` inside skiff macro",
                    arg.path.to_token_stream()
                )));
            }
            Ok(())
        })?;
    }
    if metadata.getter.is_some() != metadata.setter.is_some() {
        return Err(syn::Error::new_spanned(
            &metadata.ident,
            "A property needs both `getter` and `setter`",
        ));
    }
    if metadata.sequence.is_some() && metadata.option_inner().is_none() {
        return Err(syn::Error::new_spanned(
            &metadata.ty,
            "A key generated from a `sequence` must be optional, like `Option<i64>`",
        ));
    }
    if !metadata.ignore_dialects.is_empty() && metadata.sequence.is_none() {
        return Err(syn::Error::new_spanned(
            &metadata.ident,
            "`ignore_dialects` applies only to a key with a `sequence`",
        ));
    }
    Ok(metadata)
}
