use crate::serde::{Primitive, PrimitiveType};
use crate::types::{ArrayRef, EnumConstant, ObjectRef, Type, Value};

/// A Rust type stored in a primitive field.
///
/// Reading widens: an `i64` field accepts a stored `Int`, an `i32` field does not accept a
/// stored `Long`.
pub trait PrimitiveField: Sized + 'static {
    const KIND: PrimitiveType;

    fn from_primitive(p: Primitive) -> Option<Self>;

    fn into_primitive(self) -> Primitive;
}

macro_rules! primitive_field {
    ($t:ty, $variant:ident) => {
        impl PrimitiveField for $t {
            const KIND: PrimitiveType = PrimitiveType::$variant;

            fn from_primitive(p: Primitive) -> Option<Self> {
                match p.widen_to(Self::KIND)? {
                    Primitive::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn into_primitive(self) -> Primitive {
                Primitive::$variant(self)
            }
        }

        impl From<$t> for Primitive {
            fn from(v: $t) -> Self {
                Primitive::$variant(v)
            }
        }
    };
}

primitive_field!(i8, Byte);
primitive_field!(i16, Short);
primitive_field!(i32, Int);
primitive_field!(i64, Long);
primitive_field!(f32, Float);
primitive_field!(f64, Double);
primitive_field!(u16, Char);
primitive_field!(bool, Boolean);

/// A Rust type stored in an object field.
///
/// A failed conversion hands the value back, so that the caller can report it.
pub trait ObjectField: Sized {
    /// The widest type this field can hold.
    fn declared_type() -> Type;

    fn from_value(v: Value) -> Result<Self, Value>;

    fn into_value(self) -> Value;
}

impl ObjectField for Value {
    fn declared_type() -> Type {
        Type::Any
    }
    fn from_value(v: Value) -> Result<Self, Value> {
        Ok(v)
    }
    fn into_value(self) -> Value {
        self
    }
}

impl<T: ObjectField> ObjectField for Option<T> {
    fn declared_type() -> Type {
        T::declared_type()
    }
    fn from_value(v: Value) -> Result<Self, Value> {
        match v {
            Value::Null => Ok(None),
            v => T::from_value(v).map(Some),
        }
    }
    fn into_value(self) -> Value {
        self.map_or(Value::Null, T::into_value)
    }
}

macro_rules! object_field {
    ($t:ty, $variant:ident, $declared:expr) => {
        impl ObjectField for $t {
            fn declared_type() -> Type {
                $declared
            }
            fn from_value(v: Value) -> Result<Self, Value> {
                match v {
                    Value::$variant(inner) => Ok(inner),
                    v => Err(v),
                }
            }
            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }
    };
}

object_field!(String, String, Type::String);
object_field!(EnumConstant, Enum, Type::Any);
object_field!(Type, Class, Type::Class);
object_field!(ObjectRef, Object, Type::Any);

impl ObjectField for ArrayRef {
    fn declared_type() -> Type {
        Type::array_of(Type::Any)
    }
    fn from_value(v: Value) -> Result<Self, Value> {
        match v {
            Value::Array(arr) => Ok(arr),
            v => Err(v),
        }
    }
    fn into_value(self) -> Value {
        Value::Array(self)
    }
}

/// A boxed primitive in an object field. Unlike primitive fields, boxes never widen.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Boxed<P>(pub P);

impl<P: PrimitiveField> ObjectField for Boxed<P> {
    fn declared_type() -> Type {
        Type::Wrapper(P::KIND)
    }
    fn from_value(v: Value) -> Result<Self, Value> {
        match v {
            Value::Primitive(p) if p.kind() == P::KIND => P::from_primitive(p).map(Boxed).ok_or(v),
            v => Err(v),
        }
    }
    fn into_value(self) -> Value {
        Value::Primitive(self.0.into_primitive())
    }
}
