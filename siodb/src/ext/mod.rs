use bytes::{Buf, Bytes};

/// Length carried on the wire is `u64`, while rust want `usize`.
pub trait LenExt {
    /// Saturate to `usize::MAX` on narrower targets, reads are bounded
    /// by the stream anyway.
    fn to_len(self) -> usize;
}

/// Checked read operation in [`Bytes`].
///
/// [`Buf`] getters panic when there is not enough remaining bytes, row frames
/// come from the network, so every read must be checked.
pub trait BytesExt {
    /// Split off exactly `n` bytes, or `None` if not enough remaining.
    fn try_split_to(&mut self, n: usize) -> Option<Bytes>;

    /// Read exactly `N` bytes into an array, or `None` if not enough remaining.
    fn try_get_array<const N: usize>(&mut self) -> Option<[u8; N]>;
}

/// Helper trait to [`Display`][std::fmt::Display] bytes.
pub trait FmtExt {
    /// Lossy [`Display`][std::fmt::Display] bytes.
    fn lossy(&self) -> LossyFmt<'_>;
}

/// Lossy [`Display`][std::fmt::Display] implementation for bytes.
pub struct LossyFmt<'a>(pub &'a [u8]);

impl LenExt for u64 {
    fn to_len(self) -> usize {
        usize::try_from(self).unwrap_or(usize::MAX)
    }
}

impl BytesExt for Bytes {
    fn try_split_to(&mut self, n: usize) -> Option<Bytes> {
        if self.remaining() < n {
            return None;
        }
        Some(self.split_to(n))
    }

    fn try_get_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        if self.remaining() < N {
            return None;
        }
        let mut array = [0u8; N];
        self.copy_to_slice(&mut array);
        Some(array)
    }
}

impl FmtExt for [u8] {
    fn lossy(&self) -> LossyFmt<'_> {
        LossyFmt(self)
    }
}

impl std::fmt::Display for LossyFmt<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &b in self.0 {
            if b.is_ascii_graphic() || b.is_ascii_whitespace() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:x}")?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for LossyFmt<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "b\"{self}\"")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn checked_reads() {
        let mut b = Bytes::from_static(&[1, 2, 3]);
        assert_eq!(b.try_get_array::<2>(), Some([1, 2]));
        assert_eq!(b.try_get_array::<2>(), None);
        assert_eq!(b.try_split_to(2), None);
        assert_eq!(b.try_split_to(1).as_deref(), Some(&[3][..]));
        assert!(b.is_empty());
    }

    #[test]
    fn lossy_display() {
        assert_eq!(b"ab\x01".lossy().to_string(), "ab\\x1");
    }
}
