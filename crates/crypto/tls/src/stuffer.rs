//! A growable byte buffer with independent read/write cursors.
//!
//! This generalizes [crate::encoding::Cursor] (a read-only borrowed view) with an
//! owned, growable backing store and a write cursor, matching the read-then-patch
//! discipline [crate::handshake::ClientHello::encode] already used by hand (reserve
//! space for a length prefix, write the body, go back and patch it in).
//!
//! Buffers that are known to hold secret material (session keys, traffic secrets,
//! early derived PSK material) are wiped to zero on drop.

use crate::encoding::{Decoding, Encoding};
use crate::TLSError;

const MIN_GROWTH: usize = 1024;

/// An opaque token produced by [Stuffer::reserve_u16]/[Stuffer::reserve_u24],
/// later consumed by [Stuffer::write_vector_size].
#[derive(Clone, Copy, Debug)]
pub struct Reservation {
    at: usize,
    width: u8,
}

#[derive(Debug, Default)]
pub struct Stuffer {
    data: Vec<u8>,
    r: usize,
    w: usize,
    growable: bool,
    tainted: bool,
    high_water_mark: usize,
}

impl Stuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            r: 0,
            w: 0,
            growable: true,
            tainted: false,
            high_water_mark: 0,
        }
    }

    /// A fixed-capacity, non-growable view over already-owned bytes.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let w = bytes.len();
        Self {
            data: bytes,
            r: 0,
            w,
            growable: false,
            tainted: false,
            high_water_mark: w,
        }
    }

    #[must_use]
    pub fn readable(&self) -> usize {
        self.w - self.r
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readable() == 0
    }

    fn ensure_capacity(&mut self, additional: usize) -> Result<(), TLSError> {
        let required = self.w + additional;
        if required <= self.data.len() {
            return Ok(());
        }

        if !self.growable {
            return Err(TLSError::Overflow);
        }

        if self.tainted {
            return Err(TLSError::Safety);
        }

        let new_len = required.max(2 * self.data.len()).max(MIN_GROWTH);
        self.data.resize(new_len, 0);
        Ok(())
    }

    pub fn write_bytes(&mut self, src: &[u8]) -> Result<(), TLSError> {
        self.ensure_capacity(src.len())?;
        self.data[self.w..self.w + src.len()].copy_from_slice(src);
        self.w += src.len();
        self.high_water_mark = self.high_water_mark.max(self.w);
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), TLSError> {
        self.write_bytes(&[value])
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), TLSError> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_u24(&mut self, value: u32) -> Result<(), TLSError> {
        debug_assert!(value < (1 << 24));
        self.write_bytes(&value.to_be_bytes()[1..])
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), TLSError> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_u64(&mut self, value: u64) -> Result<(), TLSError> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn read_n(&mut self, n: usize) -> Result<&[u8], TLSError> {
        if self.readable() < n {
            return Err(TLSError::BadMessage);
        }
        let slice = &self.data[self.r..self.r + n];
        self.r += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, TLSError> {
        Ok(self.read_n(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, TLSError> {
        let bytes = self.read_n(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u24(&mut self) -> Result<u32, TLSError> {
        let bytes = self.read_n(3)?;
        Ok(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, TLSError> {
        let bytes = self.read_n(4)?;
        Ok(u32::from_be_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_u64(&mut self) -> Result<u64, TLSError> {
        let bytes = self.read_n(8)?;
        Ok(u64::from_be_bytes(bytes.try_into().unwrap()))
    }

    /// Hands out a borrowed slice of the unread data and taints the stuffer,
    /// preventing any further growth while that borrow may still be outstanding.
    pub fn raw_read(&mut self, n: usize) -> Result<&[u8], TLSError> {
        self.tainted = true;
        self.read_n(n)
    }

    pub fn skip_read(&mut self, n: usize) -> Result<(), TLSError> {
        self.read_n(n).map(|_| ())
    }

    pub fn reserve_u16(&mut self) -> Result<Reservation, TLSError> {
        let at = self.w;
        self.write_u16(0)?;
        Ok(Reservation { at, width: 2 })
    }

    pub fn reserve_u24(&mut self) -> Result<Reservation, TLSError> {
        let at = self.w;
        self.write_u24(0)?;
        Ok(Reservation { at, width: 3 })
    }

    /// Patches the length of everything written since `reservation` was taken
    /// into the reserved slot.
    pub fn write_vector_size(&mut self, reservation: Reservation) -> Result<(), TLSError> {
        let length = self.w - (reservation.at + reservation.width as usize);
        match reservation.width {
            2 => {
                let length = u16::try_from(length).map_err(|_| TLSError::Overflow)?;
                self.data[reservation.at..reservation.at + 2].copy_from_slice(&length.to_be_bytes());
            },
            3 => {
                if length >= 1 << 24 {
                    return Err(TLSError::Overflow);
                }
                self.data[reservation.at..reservation.at + 3].copy_from_slice(&length.to_be_bytes()[1..]);
            },
            _ => unreachable!("only u16/u24 reservations exist"),
        }
        Ok(())
    }

    /// Resets both cursors to zero and zeroizes everything that was ever written.
    pub fn wipe(&mut self) {
        for byte in &mut self.data[..self.high_water_mark] {
            *byte = 0;
        }
        self.r = 0;
        self.w = 0;
        self.tainted = false;
        self.high_water_mark = 0;
    }

    /// Rewinds the write cursor by `n` bytes and zeroizes the freed range.
    pub fn wipe_n(&mut self, n: usize) -> Result<(), TLSError> {
        if n > self.w {
            return Err(TLSError::Safety);
        }
        let new_w = self.w - n;
        for byte in &mut self.data[new_w..self.w] {
            *byte = 0;
        }
        self.w = new_w;
        Ok(())
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.r..self.w]
    }

    pub fn decode<'a, T: Decoding<'a>>(&'a mut self) -> Result<T, TLSError>
    where
        T: 'a,
    {
        let mut cursor = crate::encoding::Cursor::new(&self.data[self.r..self.w]);
        let value = cursor.decode::<T>()?;
        let consumed = self.w - self.r - cursor.remainder().len();
        self.r += consumed;
        Ok(value)
    }

    pub fn encode<T: Encoding + ?Sized>(&mut self, value: &T) -> Result<(), TLSError> {
        let bytes = value.as_bytes();
        self.write_bytes(&bytes)
    }
}

impl Drop for Stuffer {
    fn drop(&mut self) {
        self.wipe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_on_write() {
        let mut stuffer = Stuffer::new();
        stuffer.write_bytes(&[1, 2, 3]).unwrap();
        assert_eq!(stuffer.readable(), 3);
    }

    #[test]
    fn read_respects_cursor_order() {
        let mut stuffer = Stuffer::new();
        stuffer.write_u16(0x1234).unwrap();
        stuffer.write_u8(0x56).unwrap();
        assert_eq!(stuffer.read_u16().unwrap(), 0x1234);
        assert_eq!(stuffer.read_u8().unwrap(), 0x56);
    }

    #[test]
    fn reservation_patches_length() {
        let mut stuffer = Stuffer::new();
        let reservation = stuffer.reserve_u16().unwrap();
        stuffer.write_bytes(&[0xAA; 5]).unwrap();
        stuffer.write_vector_size(reservation).unwrap();

        assert_eq!(stuffer.read_u16().unwrap(), 5);
    }

    #[test]
    fn wipe_zeroes_used_range() {
        let mut stuffer = Stuffer::new();
        stuffer.write_bytes(&[1, 2, 3, 4]).unwrap();
        stuffer.wipe();
        assert!(stuffer.data.iter().take(4).all(|&b| b == 0));
    }

    #[test]
    fn non_growable_rejects_overflow() {
        let mut stuffer = Stuffer::from_bytes(Vec::new());
        assert!(matches!(stuffer.write_u8(1), Err(TLSError::Overflow)));
    }
}
