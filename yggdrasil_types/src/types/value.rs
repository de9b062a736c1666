use crate::serde::{Primitive, PrimitiveType};
use crate::types::{EnumConstant, NamedType, Type};
use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// A shared, mutable handle to an instance of a user type.
///
/// Clones share the instance. Identity is the allocation address, which is what the
/// writer deduplicates on and what cycles are made of.
#[derive(Clone)]
pub struct ObjectRef {
    ty: NamedType,
    cell: Rc<RefCell<dyn Any>>,
}

impl ObjectRef {
    pub fn new<T: Any>(instance: T) -> Self {
        let cell: Rc<RefCell<dyn Any>> = Rc::new(RefCell::new(instance));
        Self {
            ty: NamedType::of::<T>(),
            cell,
        }
    }

    pub fn named_type(&self) -> NamedType {
        self.ty
    }

    pub fn is<T: Any>(&self) -> bool {
        self.ty.is::<T>()
    }

    /// `None` if the instance is not a `T`.
    ///
    /// Panics if the instance is currently borrowed mutably, like [`RefCell::borrow`].
    pub fn borrow<T: Any>(&self) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.cell.borrow(), |any| any.downcast_ref::<T>()).ok()
    }

    /// `None` if the instance is not a `T`.
    ///
    /// Panics if the instance is currently borrowed, like [`RefCell::borrow_mut`].
    pub fn borrow_mut<T: Any>(&self) -> Option<RefMut<'_, T>> {
        RefMut::filter_map(self.cell.borrow_mut(), |any| any.downcast_mut::<T>()).ok()
    }

    pub fn borrow_any(&self) -> Ref<'_, dyn Any> {
        self.cell.borrow()
    }

    pub fn borrow_any_mut(&self) -> RefMut<'_, dyn Any> {
        self.cell.borrow_mut()
    }

    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.cell) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        self.addr() == other.addr()
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:x}", self.ty, self.addr())
    }
}

/// The contents of an array value.
pub struct Array {
    pub component: Type,
    pub items: Vec<Value>,
}

/// A shared, mutable handle to an array.
///
/// Arrays of a primitive component hold only [`Value::Primitive`]s of that kind.
#[derive(Clone)]
pub struct ArrayRef(Rc<RefCell<Array>>);

impl ArrayRef {
    pub fn new(component: Type, items: Vec<Value>) -> Self {
        Self(Rc::new(RefCell::new(Array { component, items })))
    }

    pub fn of_primitives<P: Into<Primitive>>(items: impl IntoIterator<Item = P>) -> Option<Self> {
        let items = items.into_iter().map(Into::into).collect::<Vec<Primitive>>();
        let kind = items.first().map(Primitive::kind)?;
        if items.iter().any(|p| p.kind() != kind) {
            return None;
        }
        let items = items.into_iter().map(Value::Primitive).collect();
        Some(Self::new(Type::Primitive(kind), items))
    }

    pub fn component(&self) -> Type {
        self.0.borrow().component.clone()
    }

    pub fn component_primitive(&self) -> Option<PrimitiveType> {
        match self.0.borrow().component {
            Type::Primitive(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.0.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().items.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<Value> {
        self.0.borrow().items.get(i).cloned()
    }

    pub fn set(&self, i: usize, value: Value) -> bool {
        match self.0.borrow_mut().items.get_mut(i) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn push(&self, value: Value) {
        self.0.borrow_mut().items.push(value);
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().items.clone()
    }

    pub fn borrow(&self) -> Ref<'_, Array> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Array> {
        self.0.borrow_mut()
    }

    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn ptr_eq(&self, other: &ArrayRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ArrayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(arr) => write!(f, "{}[{}]@{:x}", arr.component, arr.items.len(), self.addr()),
            Err(_) => write!(f, "array@{:x}", self.addr()),
        }
    }
}

/// Anything that can be written as a value.
///
/// Handles ([`Value::Array`], [`Value::Object`]) compare and hash by identity, everything
/// else by value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    /// A boxed primitive, written with its wrapper tag.
    Primitive(Primitive),
    String(String),
    Array(ArrayRef),
    Enum(EnumConstant),
    Class(Type),
    Object(ObjectRef),
}

impl Value {
    /// `None` for `Null`, which has no type.
    pub fn type_of(&self) -> Option<Type> {
        match self {
            Value::Null => None,
            Value::Primitive(p) => Some(Type::Wrapper(p.kind())),
            Value::String(_) => Some(Type::String),
            Value::Array(arr) => Some(Type::array_of(arr.component())),
            Value::Enum(constant) => Some(Type::Named(constant.declaring_type())),
            Value::Class(_) => Some(Type::Class),
            Value::Object(obj) => Some(Type::Named(obj.named_type())),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            Value::Primitive(p) => Some(*p),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Primitive(a), Value::Primitive(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Class(a), Value::Class(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}
impl Eq for Value {}
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Primitive(p) => p.hash(state),
            Value::String(s) => s.hash(state),
            Value::Array(arr) => arr.addr().hash(state),
            Value::Enum(constant) => constant.hash(state),
            Value::Class(ty) => ty.hash(state),
            Value::Object(obj) => obj.addr().hash(state),
        }
    }
}

impl From<Primitive> for Value {
    fn from(p: Primitive) -> Self {
        Value::Primitive(p)
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}
impl From<ArrayRef> for Value {
    fn from(arr: ArrayRef) -> Self {
        Value::Array(arr)
    }
}
impl From<EnumConstant> for Value {
    fn from(constant: EnumConstant) -> Self {
        Value::Enum(constant)
    }
}
impl From<Type> for Value {
    fn from(ty: Type) -> Self {
        Value::Class(ty)
    }
}
impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}
