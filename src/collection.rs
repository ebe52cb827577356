//! Capabilities a leaf value must provide to be stored in a tree.
//!
//! Offsets and counts are in elements of the implementing type. For
//! `String` that means bytes, so callers must keep offsets on `char`
//! boundaries.

/// A value that can extract a sub-range of itself.
pub trait Sliceable: Sized {
    /// Returns the elements in `offset..offset + count` as a new value.
    fn slice(&self, offset: usize, count: usize) -> Self;
}

/// A value that can also replace a sub-range of itself.
///
/// Required for the flat representation used by [`crate::Hybrid`].
pub trait Spliceable: Sliceable {
    /// Returns a new value with `offset..offset + count` replaced by
    /// `replacement`.
    fn splice(&self, offset: usize, count: usize, replacement: &Self) -> Self;
}

impl<T: Clone> Sliceable for Vec<T> {
    fn slice(&self, offset: usize, count: usize) -> Self {
        self[offset..offset + count].to_vec()
    }
}

impl<T: Clone> Spliceable for Vec<T> {
    fn splice(&self, offset: usize, count: usize, replacement: &Self) -> Self {
        let mut out = Vec::with_capacity(self.len() - count + replacement.len());
        out.extend_from_slice(&self[..offset]);
        out.extend_from_slice(replacement);
        out.extend_from_slice(&self[offset + count..]);
        out
    }
}

impl Sliceable for String {
    fn slice(&self, offset: usize, count: usize) -> Self {
        self[offset..offset + count].to_string()
    }
}

impl Spliceable for String {
    fn splice(&self, offset: usize, count: usize, replacement: &Self) -> Self {
        let mut out = String::with_capacity(self.len() - count + replacement.len());
        out.push_str(&self[..offset]);
        out.push_str(replacement);
        out.push_str(&self[offset + count..]);
        out
    }
}
