use crate::serde::{PrimitiveType, Tag};
use crate::types::Value;
use std::any::{self, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub enum NamedKind {
    /// Written field by field, or through a serializer plugin.
    Composite,
    /// A closed or open set of named constants.
    Enumeration,
}

/// The runtime identity of a user-defined Rust type.
///
/// Equality and hashing consider the [`TypeId`] only.
#[derive(Clone, Copy)]
pub struct NamedType {
    id: TypeId,
    name: &'static str,
    kind: NamedKind,
}

impl NamedType {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
            kind: NamedKind::Composite,
        }
    }

    pub fn enumeration<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
            kind: NamedKind::Enumeration,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }
    pub fn name(&self) -> &'static str {
        self.name
    }
    pub fn kind(&self) -> NamedKind {
        self.kind
    }
    pub fn is_enum(&self) -> bool {
        self.kind == NamedKind::Enumeration
    }
    pub fn is<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for NamedType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for NamedType {}
impl Hash for NamedType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
impl fmt::Debug for NamedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
impl fmt::Display for NamedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Every type a value, a field or an array component can have.
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub enum Type {
    Primitive(PrimitiveType),
    Wrapper(PrimitiveType),
    String,
    /// A type descriptor used as a value.
    Class,
    /// The untyped object root. Accepts every non-primitive value.
    Any,
    Array(Box<Type>),
    Named(NamedType),
}

impl Type {
    /// Identifier of [`Type::Any`]. No resolver may claim it.
    pub const ANY_ID: &'static str = "Object";

    pub fn array_of(component: Type) -> Self {
        Type::Array(Box::new(component))
    }

    pub fn named<T: 'static>() -> Self {
        Type::Named(NamedType::of::<T>())
    }

    pub fn component(&self) -> Option<&Type> {
        match self {
            Type::Array(component) => Some(component),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    /// Peels off all array dimensions.
    pub fn base(&self) -> (usize, &Type) {
        let mut dims = 0;
        let mut ty = self;
        while let Type::Array(component) = ty {
            dims += 1;
            ty = component;
        }
        (dims, ty)
    }

    /// Whether a value of type `other` may be stored where `self` is declared.
    ///
    /// Arrays of non-primitives are covariant. Named types match exactly.
    pub fn is_assignable_from(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Primitive(_), _) | (_, Type::Primitive(_)) => self == other,
            (Type::Any, _) => true,
            (Type::Array(a), Type::Array(b)) => {
                if a.is_primitive() || b.is_primitive() {
                    a == b
                } else {
                    a.is_assignable_from(b)
                }
            }
            _ => self == other,
        }
    }

    /// Whether `value` may be stored where `self` is declared. `Null` fits every non-primitive type.
    pub fn accepts(&self, value: &Value) -> bool {
        match value.type_of() {
            None => !self.is_primitive(),
            Some(ty) => self.is_assignable_from(&ty),
        }
    }
}

impl From<&Type> for Tag {
    fn from(ty: &Type) -> Self {
        match ty {
            Type::Primitive(kind) => kind.tag(),
            Type::Wrapper(kind) => kind.wrapper_tag(),
            Type::String => Tag::String,
            Type::Class => Tag::Class,
            Type::Any => Tag::Object,
            Type::Array(_) => Tag::Array,
            Type::Named(named) => match named.kind() {
                NamedKind::Composite => Tag::Object,
                NamedKind::Enumeration => Tag::Enum,
            },
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(kind) => write!(f, "{kind}"),
            Type::Wrapper(kind) => f.write_str(kind.wrapper_tag().name()),
            Type::String => f.write_str("String"),
            Type::Class => f.write_str("Class"),
            Type::Any => f.write_str(Type::ANY_ID),
            Type::Array(component) => write!(f, "{component}[]"),
            Type::Named(named) => write!(f, "{named}"),
        }
    }
}
