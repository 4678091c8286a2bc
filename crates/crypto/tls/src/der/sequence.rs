use super::{Error, Item};

/// A `SEQUENCE` or `SET` whose elements are parsed lazily.
///
/// Iterating yields one [Item] per call, advancing past whatever encoded
/// length that item reported. Leftover bytes (if the caller stops iterating
/// early) are simply never parsed.
#[derive(Clone, Copy, Debug)]
pub struct Sequence<'a> {
    bytes: &'a [u8],
}

impl<'a> Sequence<'a> {
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl<'a> Iterator for Sequence<'a> {
    type Item = Result<Item<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.bytes.is_empty() {
            return None;
        }

        match Item::parse(self.bytes) {
            Ok((item, consumed)) => {
                self.bytes = &self.bytes[consumed..];
                Some(Ok(item))
            },
            Err(error) => {
                // Don't loop forever on a truncated item.
                self.bytes = &[];
                Some(Err(error))
            },
        }
    }
}
