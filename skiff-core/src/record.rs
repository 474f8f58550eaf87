use crate::{RecordDescriptor, Result, Value, ValueKind, describe, describe_table};
use std::sync::Arc;

/// Reads an attribute out of a record.
pub type Getter<R> = fn(&R) -> Value;
/// Writes an attribute into a record.
pub type Setter<R> = fn(&mut R, Value) -> Result<()>;

/// How an attribute is reached: a public field, or a getter and setter pair.
pub enum Accessor<R> {
    Field { get: Getter<R>, set: Setter<R> },
    Property { getter: Getter<R>, setter: Setter<R> },
}

impl<R> Accessor<R> {
    pub fn get(&self, record: &R) -> Value {
        match self {
            Accessor::Field { get, .. } => get(record),
            Accessor::Property { getter, .. } => getter(record),
        }
    }
    pub fn set(&self, record: &mut R, value: Value) -> Result<()> {
        match self {
            Accessor::Field { set, .. } => set(record, value),
            Accessor::Property { setter, .. } => setter(record, value),
        }
    }
    pub fn is_property(&self) -> bool {
        matches!(self, Accessor::Property { .. })
    }
}

impl<R> Clone for Accessor<R> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<R> Copy for Accessor<R> {}

/// Key marker of an attribute: optionally generated from a sequence.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct KeyMarker {
    pub sequence: Option<String>,
    /// Dialects on which the sequence is not used and the key is inserted as is.
    pub ignore_dialects: Vec<String>,
}

pub(crate) enum DeclaredAttribute<R> {
    Persistent {
        kind: ValueKind,
        accessor: Accessor<R>,
    },
    Collection,
    Unsupported {
        type_name: String,
    },
}

/// One attribute as declared by a record type, before validation.
pub struct AttributeDeclaration<R> {
    pub(crate) name: String,
    pub(crate) column: Option<String>,
    pub(crate) declared: DeclaredAttribute<R>,
    pub(crate) key: Option<KeyMarker>,
    pub(crate) store_as_timestamp: bool,
    pub(crate) ignore: bool,
}

impl<R> AttributeDeclaration<R> {
    fn with(name: impl Into<String>, declared: DeclaredAttribute<R>) -> Self {
        Self {
            name: name.into(),
            column: None,
            declared,
            key: None,
            store_as_timestamp: false,
            ignore: false,
        }
    }

    /// Attribute reached through a field.
    pub fn field(name: impl Into<String>, kind: ValueKind, get: Getter<R>, set: Setter<R>) -> Self {
        Self::with(
            name,
            DeclaredAttribute::Persistent {
                kind,
                accessor: Accessor::Field { get, set },
            },
        )
    }

    /// Attribute reached through a getter and setter pair.
    pub fn property(
        name: impl Into<String>,
        kind: ValueKind,
        getter: Getter<R>,
        setter: Setter<R>,
    ) -> Self {
        Self::with(
            name,
            DeclaredAttribute::Persistent {
                kind,
                accessor: Accessor::Property { getter, setter },
            },
        )
    }

    /// A collection valued attribute, never persisted.
    pub fn collection(name: impl Into<String>) -> Self {
        Self::with(name, DeclaredAttribute::Collection)
    }

    /// An attribute whose type is outside the supported kinds. Describing the record fails.
    pub fn unsupported(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::with(
            name,
            DeclaredAttribute::Unsupported {
                type_name: type_name.into(),
            },
        )
    }

    /// An attribute excluded from persistence.
    pub fn ignored(name: impl Into<String>) -> Self {
        let mut result = Self::with(name, DeclaredAttribute::Collection);
        result.ignore = true;
        result
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn key(mut self) -> Self {
        self.key.get_or_insert_with(Default::default);
        self
    }

    /// Marks the attribute as a key generated from `sequence`.
    pub fn sequence(mut self, sequence: impl Into<String>) -> Self {
        self.key.get_or_insert_with(Default::default).sequence = Some(sequence.into());
        self
    }

    pub fn ignore_dialects<I, S>(mut self, dialects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key
            .get_or_insert_with(Default::default)
            .ignore_dialects
            .extend(dialects.into_iter().map(Into::into));
        self
    }

    pub fn timestamp(mut self) -> Self {
        self.store_as_timestamp = true;
        self
    }

    pub fn ignore(mut self) -> Self {
        self.ignore = true;
        self
    }
}

/// The ordered attribute declarations of a record type.
pub struct RecordDeclaration<R> {
    pub(crate) type_name: &'static str,
    pub(crate) relation: Option<String>,
    pub(crate) attributes: Vec<AttributeDeclaration<R>>,
}

impl<R> RecordDeclaration<R> {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            relation: None,
            attributes: Vec::new(),
        }
    }
    pub fn relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }
    pub fn attribute(mut self, attribute: AttributeDeclaration<R>) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// A type that maps to a relation.
///
/// Implement it with `#[derive(Record)]`, or by hand:
/// ```rust
/// use skiff_core::{AsValue, AttributeDeclaration, Record, RecordDeclaration};
///
/// #[derive(Default)]
/// struct Department {
///     id: Option<i64>,
///     name: String,
/// }
///
/// impl Record for Department {
///     fn declare() -> RecordDeclaration<Self> {
///         RecordDeclaration::new("Department")
///             .attribute(
///                 AttributeDeclaration::field(
///                     "id",
///                     <Option<i64> as AsValue>::KIND,
///                     |r: &Self| r.id.as_value(),
///                     |r: &mut Self, v| Ok(r.id = AsValue::try_from_value(v)?),
///                 )
///                 .sequence("department_seq"),
///             )
///             .attribute(AttributeDeclaration::field(
///                 "name",
///                 <String as AsValue>::KIND,
///                 |r: &Self| r.name.clone().as_value(),
///                 |r: &mut Self, v| Ok(r.name = AsValue::try_from_value(v)?),
///             ))
///     }
/// }
///
/// let descriptor = Department::describe().unwrap();
/// assert_eq!(descriptor.relation(), "department");
/// ```
pub trait Record: Default + 'static {
    /// Declares the attributes. Called once per type, the result is cached.
    fn declare() -> RecordDeclaration<Self>;

    fn describe() -> Result<Arc<RecordDescriptor<Self>>> {
        describe::<Self>()
    }

    /// Like [`Record::describe`], requiring at least one key attribute.
    fn describe_table() -> Result<Arc<RecordDescriptor<Self>>> {
        describe_table::<Self>()
    }
}
