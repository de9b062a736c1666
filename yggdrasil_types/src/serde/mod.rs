//! # Serialization format
//!
//! A stream is a header followed by any number of tagged values.
//! All multi-byte integers are big-endian.
//!
//! Every value starts with a [`Tag`], encoded in `u8`.
//! Primitives have fixed body lengths, which are not encoded.
//! Strings and arrays encode their lengths as [`UnsignedInt`]s.
//!
//! Type identifiers, field ids and enum constant ids are "short strings".
//! A short string whose byte length is above 4 is remembered by both sides, and a repeat
//! occurrence is written as a back-reference (`0xFF` in place of the length byte) into
//! that table. Hence a short string can never be 255 bytes or longer.
//!
//! Every non-null value that is not a primitive field or a primitive array element takes
//! the next slot in the stream's reference table, in the order it is first encountered.
//! A `reference` value points into that table.
//!
//! ```text
//! struct Header {
//!     magic:              [u8; 4],        // "Ygg\0"
//!     version:            u16,
//! }
//!
//! struct Null {
//!     tag:                u8,             // 0x00
//! }
//!
//! struct Wrapper {                        // also a primitive field value, with the primitive tag
//!     tag:                u8,             // 0x11..=0x1f
//!     body:               [u8; size_of_primitive],
//! }
//!
//! struct String {
//!     tag:                u8,             // 0x20
//!     len:                UnsignedInt,
//!     utf8:               [u8; len],
//! }
//!
//! struct Array {
//!     tag:                u8,             // 0x30
//!     component:          ClassDesc,
//!     len:                UnsignedInt,
//!     items:              [Primitive body or Value; len],
//! }
//!
//! struct Enum {
//!     tag:                u8,             // 0x40
//!     declaring_type:     ShortString,
//!     constant:           ShortString,
//! }
//!
//! struct Class {
//!     tag:                u8,             // 0x41
//!     desc:               ClassDesc,
//! }
//!
//! struct ClassDesc {
//!     array_tags:         [u8; dimensions],   // one 0x30 per array dimension
//!     base_tag:           u8,
//!     base_id:            ShortString,        // only if base_tag is object or enum
//! }
//!
//! struct Object {
//!     tag:                u8,             // 0x80
//!     type_id:            ShortString,
//!     field_count:        UnsignedShort,
//!     fields:             [{ id: ShortString, value: Value }; field_count],
//! }
//!
//! struct Reference {
//!     tag:                u8,             // 0xFF
//!     index:              UnsignedInt,
//! }
//!
//! struct ShortString {
//!     len:                u8,             // < 0xFF
//!     utf8:               [u8; len],
//! } | {
//!     marker:             u8,             // 0xFF
//!     index:              u32 (version 1) | UnsignedInt (version 2+),
//! }
//! ```

mod lengths;
mod primitive;
mod tag;

pub use lengths::*;
pub use primitive::*;
pub use tag::*;

/// `"Ygg\0"`
pub const MAGIC_NUMBER: u32 = u32::from_be_bytes(*b"Ygg\0");

/// Latest format version. Version 1 differs only in how short string back-references are encoded.
pub const LATEST_VERSION: u16 = 2;
