use crate::serde::Tag;
use crate::{Result, YggError};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::{self, Read, Write};

/// The eight primitive kinds.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub enum PrimitiveType {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    /// A UTF-16 code unit.
    Char,
    Boolean,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 8] = [
        PrimitiveType::Byte,
        PrimitiveType::Short,
        PrimitiveType::Int,
        PrimitiveType::Long,
        PrimitiveType::Float,
        PrimitiveType::Double,
        PrimitiveType::Char,
        PrimitiveType::Boolean,
    ];

    pub fn tag(self) -> Tag {
        match self {
            PrimitiveType::Byte => Tag::Byte,
            PrimitiveType::Short => Tag::Short,
            PrimitiveType::Int => Tag::Int,
            PrimitiveType::Long => Tag::Long,
            PrimitiveType::Float => Tag::Float,
            PrimitiveType::Double => Tag::Double,
            PrimitiveType::Char => Tag::Char,
            PrimitiveType::Boolean => Tag::Boolean,
        }
    }

    pub fn wrapper_tag(self) -> Tag {
        match self {
            PrimitiveType::Byte => Tag::ByteObj,
            PrimitiveType::Short => Tag::ShortObj,
            PrimitiveType::Int => Tag::IntObj,
            PrimitiveType::Long => Tag::LongObj,
            PrimitiveType::Float => Tag::FloatObj,
            PrimitiveType::Double => Tag::DoubleObj,
            PrimitiveType::Char => Tag::CharObj,
            PrimitiveType::Boolean => Tag::BooleanObj,
        }
    }

    pub fn body_len(self) -> usize {
        match self {
            PrimitiveType::Byte | PrimitiveType::Boolean => 1,
            PrimitiveType::Short | PrimitiveType::Char => 2,
            PrimitiveType::Int | PrimitiveType::Float => 4,
            PrimitiveType::Long | PrimitiveType::Double => 8,
        }
    }

    pub fn zero(self) -> Primitive {
        match self {
            PrimitiveType::Byte => Primitive::Byte(0),
            PrimitiveType::Short => Primitive::Short(0),
            PrimitiveType::Int => Primitive::Int(0),
            PrimitiveType::Long => Primitive::Long(0),
            PrimitiveType::Float => Primitive::Float(0.0),
            PrimitiveType::Double => Primitive::Double(0.0),
            PrimitiveType::Char => Primitive::Char(0),
            PrimitiveType::Boolean => Primitive::Boolean(false),
        }
    }

    /// Whether a value of this kind may be stored into a slot of kind `to` without loss of
    /// range. Every kind widens to itself. Boolean widens to nothing else.
    pub fn widens_to(self, to: PrimitiveType) -> bool {
        use PrimitiveType::*;
        if self == to {
            return true;
        }
        match self {
            Byte => matches!(to, Short | Int | Long | Float | Double),
            Short | Char => matches!(to, Int | Long | Float | Double),
            Int => matches!(to, Long | Float | Double),
            Long => matches!(to, Float | Double),
            Float => matches!(to, Double),
            Double | Boolean => false,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag().name())
    }
}

/// A primitive value.
///
/// Floats compare and hash by their bit patterns, so that `NaN == NaN` and `0.0 != -0.0`.
#[derive(Clone, Copy, Debug)]
pub enum Primitive {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(u16),
    Boolean(bool),
}

impl Primitive {
    pub fn kind(&self) -> PrimitiveType {
        match self {
            Primitive::Byte(_) => PrimitiveType::Byte,
            Primitive::Short(_) => PrimitiveType::Short,
            Primitive::Int(_) => PrimitiveType::Int,
            Primitive::Long(_) => PrimitiveType::Long,
            Primitive::Float(_) => PrimitiveType::Float,
            Primitive::Double(_) => PrimitiveType::Double,
            Primitive::Char(_) => PrimitiveType::Char,
            Primitive::Boolean(_) => PrimitiveType::Boolean,
        }
    }

    /// Converts to a wider (or the same) kind. `None` if the conversion is not a widening one.
    pub fn widen_to(self, to: PrimitiveType) -> Option<Primitive> {
        if !self.kind().widens_to(to) {
            return None;
        }
        let widened = match (self, to) {
            (p, to) if p.kind() == to => p,

            (Primitive::Byte(v), PrimitiveType::Short) => Primitive::Short(v as i16),
            (Primitive::Byte(v), PrimitiveType::Int) => Primitive::Int(v as i32),
            (Primitive::Byte(v), PrimitiveType::Long) => Primitive::Long(v as i64),
            (Primitive::Byte(v), PrimitiveType::Float) => Primitive::Float(v as f32),
            (Primitive::Byte(v), PrimitiveType::Double) => Primitive::Double(v as f64),

            (Primitive::Short(v), PrimitiveType::Int) => Primitive::Int(v as i32),
            (Primitive::Short(v), PrimitiveType::Long) => Primitive::Long(v as i64),
            (Primitive::Short(v), PrimitiveType::Float) => Primitive::Float(v as f32),
            (Primitive::Short(v), PrimitiveType::Double) => Primitive::Double(v as f64),

            (Primitive::Char(v), PrimitiveType::Int) => Primitive::Int(v as i32),
            (Primitive::Char(v), PrimitiveType::Long) => Primitive::Long(v as i64),
            (Primitive::Char(v), PrimitiveType::Float) => Primitive::Float(v as f32),
            (Primitive::Char(v), PrimitiveType::Double) => Primitive::Double(v as f64),

            (Primitive::Int(v), PrimitiveType::Long) => Primitive::Long(v as i64),
            (Primitive::Int(v), PrimitiveType::Float) => Primitive::Float(v as f32),
            (Primitive::Int(v), PrimitiveType::Double) => Primitive::Double(v as f64),

            (Primitive::Long(v), PrimitiveType::Float) => Primitive::Float(v as f32),
            (Primitive::Long(v), PrimitiveType::Double) => Primitive::Double(v as f64),

            (Primitive::Float(v), PrimitiveType::Double) => Primitive::Double(v as f64),

            _ => return None,
        };
        Some(widened)
    }

    /// Writes the body only. The tag, if any, is the caller's.
    pub fn ser(&self, w: &mut impl Write) -> Result<usize, io::Error> {
        match *self {
            Primitive::Byte(v) => w.write_all(&v.to_be_bytes())?,
            Primitive::Short(v) => w.write_all(&v.to_be_bytes())?,
            Primitive::Int(v) => w.write_all(&v.to_be_bytes())?,
            Primitive::Long(v) => w.write_all(&v.to_be_bytes())?,
            Primitive::Float(v) => w.write_all(&v.to_bits().to_be_bytes())?,
            Primitive::Double(v) => w.write_all(&v.to_bits().to_be_bytes())?,
            Primitive::Char(v) => w.write_all(&v.to_be_bytes())?,
            Primitive::Boolean(v) => w.write_all(&[v as u8])?,
        }
        Ok(self.kind().body_len())
    }

    pub fn deser(kind: PrimitiveType, r: &mut impl Read) -> Result<(usize, Self)> {
        let mut buf = [0u8; 8];
        let body = &mut buf[..kind.body_len()];
        r.read_exact(body)?;
        let prim = match kind {
            PrimitiveType::Byte => Primitive::Byte(i8::from_be_bytes([body[0]])),
            PrimitiveType::Short => Primitive::Short(i16::from_be_bytes([body[0], body[1]])),
            PrimitiveType::Char => Primitive::Char(u16::from_be_bytes([body[0], body[1]])),
            PrimitiveType::Int => Primitive::Int(i32::from_be_bytes(buf4(body))),
            PrimitiveType::Float => Primitive::Float(f32::from_bits(u32::from_be_bytes(buf4(body)))),
            PrimitiveType::Long => Primitive::Long(i64::from_be_bytes(buf)),
            PrimitiveType::Double => Primitive::Double(f64::from_bits(u64::from_be_bytes(buf))),
            PrimitiveType::Boolean => match body[0] {
                0 => Primitive::Boolean(false),
                1 => Primitive::Boolean(true),
                b => return Err(YggError::corrupted(format!("invalid boolean value {b}"))),
            },
        };
        Ok((kind.body_len(), prim))
    }

    fn bits(&self) -> u64 {
        match *self {
            Primitive::Byte(v) => v as u64,
            Primitive::Short(v) => v as u64,
            Primitive::Int(v) => v as u64,
            Primitive::Long(v) => v as u64,
            Primitive::Float(v) => v.to_bits() as u64,
            Primitive::Double(v) => v.to_bits(),
            Primitive::Char(v) => v as u64,
            Primitive::Boolean(v) => v as u64,
        }
    }
}

fn buf4(body: &[u8]) -> [u8; 4] {
    [body[0], body[1], body[2], body[3]]
}

impl PartialEq for Primitive {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.bits() == other.bits()
    }
}
impl Eq for Primitive {}
impl Hash for Primitive {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        self.bits().hash(state);
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Byte(v) => write!(f, "{v}"),
            Primitive::Short(v) => write!(f, "{v}"),
            Primitive::Int(v) => write!(f, "{v}"),
            Primitive::Long(v) => write!(f, "{v}L"),
            Primitive::Float(v) => write!(f, "{v}f"),
            Primitive::Double(v) => write!(f, "{v}"),
            Primitive::Char(v) => match char::from_u32(*v as u32) {
                Some(c) => write!(f, "'{c}'"),
                None => write!(f, "'\\u{v:04x}'"),
            },
            Primitive::Boolean(v) => write!(f, "{v}"),
        }
    }
}
