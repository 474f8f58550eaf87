use crate::{Error, Record, RecordDescriptor, Result};
use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::{Arc, LazyLock, PoisonError, RwLock},
};

type Cache = RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

static DESCRIPTORS: LazyLock<Cache> = LazyLock::new(Default::default);

fn cached<R: Record>() -> Option<Arc<RecordDescriptor<R>>> {
    let cache = DESCRIPTORS.read().unwrap_or_else(PoisonError::into_inner);
    cache
        .get(&TypeId::of::<R>())
        .cloned()
        .and_then(|v| v.downcast::<RecordDescriptor<R>>().ok())
}

/// Stores `computed` unless another thread got there first, returns the cached one.
fn store<R: Record>(computed: RecordDescriptor<R>) -> Arc<RecordDescriptor<R>> {
    let mut cache = DESCRIPTORS.write().unwrap_or_else(PoisonError::into_inner);
    let id = TypeId::of::<R>();
    if let Some(existing) = cache
        .get(&id)
        .cloned()
        .and_then(|v| v.downcast::<RecordDescriptor<R>>().ok())
    {
        return existing;
    }
    log::debug!(
        "Described `{}` as relation `{}` with {} attributes",
        computed.type_name(),
        computed.relation(),
        computed.attributes().len()
    );
    let computed = Arc::new(computed);
    cache.insert(id, computed.clone());
    computed
}

/// Metadata of `R`, extracted on first use and then shared.
///
/// Subsequent calls return the very same `Arc`.
pub fn describe<R: Record>() -> Result<Arc<RecordDescriptor<R>>> {
    if let Some(descriptor) = cached::<R>() {
        return Ok(descriptor);
    }
    let computed = RecordDescriptor::build(R::declare(), &[])?;
    Ok(store(computed))
}

/// Metadata of `R` for table operations, which need at least one key attribute.
pub fn describe_table<R: Record>() -> Result<Arc<RecordDescriptor<R>>> {
    let descriptor = describe::<R>()?;
    if !descriptor.has_key() {
        return Err(Error::NoPrimaryKey {
            record: descriptor.type_name(),
        });
    }
    Ok(descriptor)
}

/// Extracts the metadata of `R` using `key_names` as its key attributes.
///
/// Must happen before the type is described for the first time.
pub fn register<R: Record>(key_names: &[&str]) -> Result<Arc<RecordDescriptor<R>>> {
    let declaration = R::declare();
    let record = declaration.type_name;
    if cached::<R>().is_some() {
        return Err(Error::DuplicateRegistration { record });
    }
    let computed = Arc::new(RecordDescriptor::build(declaration, key_names)?);
    let mut cache = DESCRIPTORS.write().unwrap_or_else(PoisonError::into_inner);
    if cache.contains_key(&TypeId::of::<R>()) {
        return Err(Error::DuplicateRegistration { record });
    }
    cache.insert(TypeId::of::<R>(), computed.clone());
    Ok(computed)
}

/// Forgets every cached descriptor. Meant for tests only.
pub fn clear_cache() {
    DESCRIPTORS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
}
