//! # Metatypes
//!
//! A [`Metatype`] is the declared type of a handler argument, recorded
//! explicitly since Rust has no runtime reflection. It keys the schema and
//! DTO side tables by [`TypeId`] and remembers whether the type is one of the
//! primitive wrappers the pipe never validates.

use std::any::{type_name, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde_json::{Map, Value};

/// Primitive wrapper categories. Arguments of these types are never validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Boolean,
    Number,
    Array,
    Object,
}

/// The declared type of a pipeline argument.
#[derive(Clone, Copy)]
pub struct Metatype {
    type_id: TypeId,
    type_name: &'static str,
    primitive: Option<PrimitiveKind>,
}

impl Metatype {
    /// Describe `T`, classifying the primitive wrapper types automatically.
    pub fn of<T: ?Sized + 'static>() -> Self {
        let type_id = TypeId::of::<T>();
        Self {
            type_id,
            type_name: type_name::<T>(),
            primitive: primitive_kind(type_id),
        }
    }

    /// Describe `T` as a primitive of `kind`, for collection or wrapper types
    /// [`Metatype::of`] does not recognize.
    pub fn primitive<T: ?Sized + 'static>(kind: PrimitiveKind) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            primitive: Some(kind),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Full Rust type name, as reported by [`std::any::type_name`].
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name without its module path, e.g. `CreateUser`.
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.type_name)
    }

    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        self.primitive
    }

    pub fn is_primitive(&self) -> bool {
        self.primitive.is_some()
    }
}

impl PartialEq for Metatype {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for Metatype {}

impl fmt::Debug for Metatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metatype")
            .field("type_name", &self.type_name)
            .field("primitive", &self.primitive)
            .finish()
    }
}

fn primitive_kind(id: TypeId) -> Option<PrimitiveKind> {
    let is = |other: TypeId| id == other;

    if is(TypeId::of::<String>()) || is(TypeId::of::<str>()) || is(TypeId::of::<&'static str>())
    {
        return Some(PrimitiveKind::String);
    }
    if is(TypeId::of::<bool>()) {
        return Some(PrimitiveKind::Boolean);
    }
    let numbers = [
        TypeId::of::<i8>(),
        TypeId::of::<i16>(),
        TypeId::of::<i32>(),
        TypeId::of::<i64>(),
        TypeId::of::<i128>(),
        TypeId::of::<isize>(),
        TypeId::of::<u8>(),
        TypeId::of::<u16>(),
        TypeId::of::<u32>(),
        TypeId::of::<u64>(),
        TypeId::of::<u128>(),
        TypeId::of::<usize>(),
        TypeId::of::<f32>(),
        TypeId::of::<f64>(),
        TypeId::of::<serde_json::Number>(),
    ];
    if numbers.contains(&id) {
        return Some(PrimitiveKind::Number);
    }
    let arrays = [
        TypeId::of::<Vec<Value>>(),
        TypeId::of::<[Value]>(),
        TypeId::of::<Vec<String>>(),
    ];
    if arrays.contains(&id) {
        return Some(PrimitiveKind::Array);
    }
    let objects = [
        TypeId::of::<Value>(),
        TypeId::of::<Map<String, Value>>(),
        TypeId::of::<HashMap<String, Value>>(),
        TypeId::of::<BTreeMap<String, Value>>(),
        TypeId::of::<HashMap<String, String>>(),
    ];
    if objects.contains(&id) {
        return Some(PrimitiveKind::Object);
    }
    None
}

/// Strip module paths from a type name, keeping generic arguments intact.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}
