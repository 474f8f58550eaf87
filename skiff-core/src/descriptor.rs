use crate::{
    Accessor, DeclaredAttribute, Dialect, Error, KeyMarker, KeyPlan, RecordDeclaration, Result, Value,
    ValueKind, column_name_of, relation_name_of,
};
use std::collections::HashMap;

/// A persistent attribute of a record type.
pub struct AttributeDescriptor<R> {
    pub attribute_name: String,
    pub column_name: String,
    pub kind: ValueKind,
    pub primary_key: bool,
    /// Only meaningful for date like kinds: bind as a timestamp instead of text.
    pub store_as_timestamp: bool,
    pub accessor: Accessor<R>,
}

impl<R> AttributeDescriptor<R> {
    pub fn get(&self, record: &R) -> Value {
        self.accessor.get(record)
    }
    pub fn set(&self, record: &mut R, value: Value) -> Result<()> {
        self.accessor.set(record, value)
    }
}

/// The key attribute filled from a sequence or by the database.
#[derive(Debug)]
pub struct GeneratedKey {
    /// Index of the key attribute in [`RecordDescriptor::attributes`].
    pub attribute: usize,
    pub sequence: String,
    pub ignore_dialects: Vec<String>,
    plans: HashMap<Dialect, KeyPlan>,
}

impl GeneratedKey {
    fn new(attribute: usize, sequence: String, ignore_dialects: Vec<String>) -> Self {
        let plans = Dialect::KNOWN
            .into_iter()
            .filter_map(|dialect| {
                let plan = dialect.key_plan(&sequence, &ignore_dialects).ok()?;
                Some((dialect, plan))
            })
            .collect();
        Self {
            attribute,
            sequence,
            ignore_dialects,
            plans,
        }
    }

    /// Generated key handling on `dialect`, resolved once per descriptor for the known dialects.
    pub fn plan(&self, dialect: &Dialect) -> Result<KeyPlan> {
        match self.plans.get(dialect) {
            Some(plan) => Ok(plan.clone()),
            None => dialect.key_plan(&self.sequence, &self.ignore_dialects),
        }
    }
}

/// Immutable metadata of a record type, shared through the metadata cache.
pub struct RecordDescriptor<R> {
    type_name: &'static str,
    relation: String,
    attributes: Vec<AttributeDescriptor<R>>,
    keys: Vec<usize>,
    generated_key: Option<GeneratedKey>,
}

impl<R> RecordDescriptor<R> {
    /// Validates a declaration. `key_names` are the attribute names given at registration, if any.
    pub(crate) fn build(declaration: RecordDeclaration<R>, key_names: &[&str]) -> Result<Self>
    where
        R: Default,
    {
        let record = declaration.type_name;
        let has_markers = declaration
            .attributes
            .iter()
            .any(|v| !v.ignore && v.key.is_some());
        if has_markers && !key_names.is_empty() {
            return Err(Error::ConflictingKeyDeclaration { record });
        }
        let mut attributes = Vec::with_capacity(declaration.attributes.len());
        let mut generated = Vec::new();
        for attribute in declaration.attributes {
            if attribute.ignore {
                continue;
            }
            let (kind, accessor) = match attribute.declared {
                DeclaredAttribute::Persistent { kind, accessor } => (kind, accessor),
                DeclaredAttribute::Collection => continue,
                DeclaredAttribute::Unsupported { type_name } => {
                    return Err(Error::UnsupportedAttributeType { type_name });
                }
            };
            let primary_key =
                attribute.key.is_some() || key_names.contains(&attribute.name.as_str());
            if let Some(KeyMarker {
                sequence: Some(sequence),
                ignore_dialects,
            }) = attribute.key
            {
                if kind != ValueKind::Int64 {
                    return Err(Error::InvalidGeneratedKey {
                        record,
                        reason: format!(
                            "attribute `{}` must be a 64 bit integer, found {kind:?}",
                            attribute.name
                        ),
                    });
                }
                if !accessor.get(&R::default()).is_null() {
                    return Err(Error::InvalidGeneratedKey {
                        record,
                        reason: format!(
                            "attribute `{}` is never absent, a generated key must be optional",
                            attribute.name
                        ),
                    });
                }
                generated.push(GeneratedKey::new(
                    attributes.len(),
                    sequence,
                    ignore_dialects,
                ));
            }
            attributes.push(AttributeDescriptor {
                column_name: attribute
                    .column
                    .unwrap_or_else(|| column_name_of(&attribute.name)),
                attribute_name: attribute.name,
                kind,
                primary_key,
                store_as_timestamp: attribute.store_as_timestamp && kind.is_date_like(),
                accessor,
            });
        }
        if let Some(missing) = key_names
            .iter()
            .find(|name| !attributes.iter().any(|v| v.attribute_name == **name))
        {
            return Err(Error::UnknownAttribute {
                record,
                attribute: missing.to_string(),
            });
        }
        if generated.len() > 1 {
            return Err(Error::InvalidGeneratedKey {
                record,
                reason: "more than one attribute is generated from a sequence".into(),
            });
        }
        let keys = attributes
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.primary_key.then_some(i))
            .collect();
        Ok(Self {
            type_name: record,
            relation: declaration
                .relation
                .unwrap_or_else(|| relation_name_of(record)),
            attributes,
            keys,
            generated_key: generated.pop(),
        })
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
    pub fn relation(&self) -> &str {
        &self.relation
    }
    pub fn attributes(&self) -> &[AttributeDescriptor<R>] {
        &self.attributes
    }
    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor<R>> {
        self.attributes.iter().find(|v| v.attribute_name == name)
    }
    /// Key attributes, in descriptor order.
    pub fn key_attributes(&self) -> impl ExactSizeIterator<Item = &AttributeDescriptor<R>> {
        self.keys.iter().map(|i| &self.attributes[*i])
    }
    pub fn non_key_attributes(&self) -> impl Iterator<Item = &AttributeDescriptor<R>> {
        self.attributes.iter().filter(|v| !v.primary_key)
    }
    pub fn has_key(&self) -> bool {
        !self.keys.is_empty()
    }
    pub fn generated_key(&self) -> Option<&GeneratedKey> {
        self.generated_key.as_ref()
    }

    /// The key attribute of a single column key.
    pub fn single_key(&self) -> Result<&AttributeDescriptor<R>> {
        match self.keys.as_slice() {
            [key] => Ok(&self.attributes[*key]),
            [] => Err(Error::NoPrimaryKey {
                record: self.type_name,
            }),
            keys => Err(Error::UnsupportedShape {
                record: self.type_name,
                reason: format!(
                    "has a composite key of {} attributes, lookup by a single key is not possible",
                    keys.len()
                ),
            }),
        }
    }
}
