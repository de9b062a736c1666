use derive_more::Deref;
use std::io::{self, Read, Write};
use std::mem;

/// A non-negative 15-bit count, written in 1 or 2 bytes.
///
/// Values up to `0x7f` fit in one byte with its high bit set. Larger values take two
/// bytes, whose high bit is clear.
#[derive(Deref, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct UnsignedShort(u16);
impl UnsignedShort {
    pub const MAX: u16 = 0x7FFF;
    const ONE_BYTE_MAX: u16 = 0x7F;

    pub fn new(n: usize) -> Option<Self> {
        let n = u16::try_from(n).ok()?;
        (n <= Self::MAX).then_some(Self(n))
    }

    pub fn ser(&self, w: &mut impl Write) -> Result<usize, io::Error> {
        if self.0 <= Self::ONE_BYTE_MAX {
            let buf = [0x80 | self.0 as u8];
            w.write_all(&buf)?;
            Ok(buf.len())
        } else {
            let buf = self.0.to_be_bytes();
            w.write_all(&buf)?;
            Ok(buf.len())
        }
    }

    pub fn deser(r: &mut impl Read) -> Result<(usize, Self), io::Error> {
        let mut first = [0u8; 1];
        r.read_exact(&mut first)?;
        if first[0] & 0x80 != 0 {
            return Ok((1, Self((first[0] & 0x7F) as u16)));
        }
        let mut second = [0u8; 1];
        r.read_exact(&mut second)?;
        let int = u16::from_be_bytes([first[0], second[0]]);
        Ok((mem::size_of::<u16>(), Self(int)))
    }
}

/// A non-negative 31-bit count or index, written in 2 or 4 bytes.
///
/// Values up to `0x7FFF` fit in two bytes with the high bit set. Larger values take four
/// bytes, whose high bit is clear.
#[derive(Deref, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct UnsignedInt(u32);
impl UnsignedInt {
    pub const MAX: u32 = 0x7FFF_FFFF;
    const TWO_BYTE_MAX: u32 = 0x7FFF;

    pub fn new(n: usize) -> Option<Self> {
        let n = u32::try_from(n).ok()?;
        (n <= Self::MAX).then_some(Self(n))
    }

    pub fn ser(&self, w: &mut impl Write) -> Result<usize, io::Error> {
        if self.0 <= Self::TWO_BYTE_MAX {
            let buf = (0x8000 | self.0 as u16).to_be_bytes();
            w.write_all(&buf)?;
            Ok(buf.len())
        } else {
            let buf = self.0.to_be_bytes();
            w.write_all(&buf)?;
            Ok(buf.len())
        }
    }

    pub fn deser(r: &mut impl Read) -> Result<(usize, Self), io::Error> {
        let mut head = [0u8; 2];
        r.read_exact(&mut head)?;
        if head[0] & 0x80 != 0 {
            let int = u16::from_be_bytes([head[0] & 0x7F, head[1]]);
            return Ok((head.len(), Self(int as u32)));
        }
        let mut tail = [0u8; 2];
        r.read_exact(&mut tail)?;
        let int = u32::from_be_bytes([head[0], head[1], tail[0], tail[1]]);
        Ok((mem::size_of::<u32>(), Self(int)))
    }
}
