use crate::serde::PrimitiveType;
use crate::{Result, YggError};
use derive_more::{Deref, From};
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive, ToPrimitive};
use std::io::{self, Read, Write};
use std::mem;

/// Distance between a primitive tag and the tag of its nullable wrapper.
pub const WRAPPER_OFFSET: u8 = 0x10;

/// The wire-level category of a value. Every value in a stream starts with one of these.
///
/// The discriminants are the wire format; they must never be renumbered.
/// Primitive tags occupy `0x01..=0x0f`, and each wrapper tag is its primitive tag plus
/// [`WRAPPER_OFFSET`], so converting between the two is arithmetic.
#[repr(u8)]
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, FromPrimitive, ToPrimitive, Debug)]
pub enum Tag {
    Null = 0x00,

    Byte = 0x01,
    Short = 0x02,
    Int = 0x03,
    Long = 0x04,
    Float = 0x08,
    Double = 0x09,
    Char = 0x0e,
    Boolean = 0x0f,

    ByteObj = 0x11,
    ShortObj = 0x12,
    IntObj = 0x13,
    LongObj = 0x14,
    FloatObj = 0x18,
    DoubleObj = 0x19,
    CharObj = 0x1e,
    BooleanObj = 0x1f,

    String = 0x20,

    Array = 0x30,

    Enum = 0x40,
    Class = 0x41,

    Object = 0x80,

    /// Must stay at `0xFF`: short identifiers use it as their back-reference marker too.
    Reference = 0xFF,
}

impl Tag {
    pub const ALL: [Tag; 23] = [
        Tag::Null,
        Tag::Byte,
        Tag::Short,
        Tag::Int,
        Tag::Long,
        Tag::Float,
        Tag::Double,
        Tag::Char,
        Tag::Boolean,
        Tag::ByteObj,
        Tag::ShortObj,
        Tag::IntObj,
        Tag::LongObj,
        Tag::FloatObj,
        Tag::DoubleObj,
        Tag::CharObj,
        Tag::BooleanObj,
        Tag::String,
        Tag::Array,
        Tag::Enum,
        Tag::Class,
        Tag::Object,
        Tag::Reference,
    ];

    pub const MIN_PRIMITIVE: u8 = Tag::Byte as u8;
    pub const MAX_PRIMITIVE: u8 = Tag::Boolean as u8;
    pub const MIN_WRAPPER: u8 = Tag::ByteObj as u8;
    pub const MAX_WRAPPER: u8 = Tag::BooleanObj as u8;

    pub fn byte(self) -> u8 {
        *TagInt::from(self)
    }

    pub fn is_primitive(self) -> bool {
        (Self::MIN_PRIMITIVE..=Self::MAX_PRIMITIVE).contains(&self.byte())
    }

    pub fn is_wrapper(self) -> bool {
        (Self::MIN_WRAPPER..=Self::MAX_WRAPPER).contains(&self.byte())
    }

    /// The primitive tag a wrapper tag boxes. `None` for every other tag.
    pub fn primitive(self) -> Option<Tag> {
        if !self.is_wrapper() {
            return None;
        }
        Tag::from_u8(self.byte() - WRAPPER_OFFSET)
    }

    /// The wrapper tag of a primitive tag. `None` for every other tag.
    pub fn wrapper(self) -> Option<Tag> {
        if !self.is_primitive() {
            return None;
        }
        Tag::from_u8(self.byte() + WRAPPER_OFFSET)
    }

    /// The primitive kind behind a primitive or wrapper tag.
    pub fn primitive_type(self) -> Option<PrimitiveType> {
        let prim = if self.is_wrapper() {
            self.primitive()?
        } else {
            self
        };
        match prim {
            Tag::Byte => Some(PrimitiveType::Byte),
            Tag::Short => Some(PrimitiveType::Short),
            Tag::Int => Some(PrimitiveType::Int),
            Tag::Long => Some(PrimitiveType::Long),
            Tag::Float => Some(PrimitiveType::Float),
            Tag::Double => Some(PrimitiveType::Double),
            Tag::Char => Some(PrimitiveType::Char),
            Tag::Boolean => Some(PrimitiveType::Boolean),
            _ => None,
        }
    }

    /// Reserved name of the tag. Type identifiers may never collide with these.
    pub fn name(self) -> &'static str {
        match self {
            Tag::Null => "null",
            Tag::Byte => "byte",
            Tag::Short => "short",
            Tag::Int => "int",
            Tag::Long => "long",
            Tag::Float => "float",
            Tag::Double => "double",
            Tag::Char => "char",
            Tag::Boolean => "boolean",
            Tag::ByteObj => "Byte",
            Tag::ShortObj => "Short",
            Tag::IntObj => "Integer",
            Tag::LongObj => "Long",
            Tag::FloatObj => "Float",
            Tag::DoubleObj => "Double",
            Tag::CharObj => "Character",
            Tag::BooleanObj => "Boolean",
            Tag::String => "string",
            Tag::Array => "array",
            Tag::Enum => "enum",
            Tag::Class => "class",
            Tag::Object => "object",
            Tag::Reference => "reference",
        }
    }

    pub fn by_name(name: &str) -> Option<Tag> {
        Self::ALL.into_iter().find(|tag| tag.name() == name)
    }

    pub fn ser(self, w: &mut impl Write) -> Result<usize, io::Error> {
        let buf = [self.byte()];
        w.write_all(&buf)?;
        Ok(buf.len())
    }

    pub fn deser(r: &mut impl Read) -> Result<(usize, Self)> {
        let (r_len, int) = TagInt::deser(r)?;
        let tag = Tag::try_from(int)?;
        Ok((r_len, tag))
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The raw byte of a [`Tag`], before it is known to be valid.
#[derive(From, Deref, Clone, Copy, Debug)]
pub struct TagInt(u8);
impl From<Tag> for TagInt {
    fn from(tag: Tag) -> Self {
        let int = tag.to_u8().unwrap_or(tag as u8);
        Self(int)
    }
}
impl TagInt {
    pub fn deser(r: &mut impl Read) -> Result<(usize, Self), io::Error> {
        let mut buf = [0u8; mem::size_of::<u8>()];
        r.read_exact(&mut buf)?;
        Ok((buf.len(), Self(buf[0])))
    }
}
impl TryFrom<TagInt> for Tag {
    type Error = YggError;
    fn try_from(int: TagInt) -> Result<Self> {
        Tag::from_u8(int.0).ok_or_else(|| YggError::corrupted(format!("invalid tag 0x{:02x}", int.0)))
    }
}
