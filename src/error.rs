//! Range errors reported by slicing and splicing.

use thiserror::Error;

/// Returned when an `offset..offset + count` range does not fit the
/// sequence it is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid range: offset {offset} + count {count} exceeds length {len}")]
pub struct RangeError {
    pub offset: usize,
    pub count: usize,
    pub len: usize,
}

/// Checks that `offset..offset + count` lies within `0..=len`.
pub(crate) fn check_range(offset: usize, count: usize, len: usize) -> Result<(), RangeError> {
    match offset.checked_add(count) {
        Some(end) if end <= len => Ok(()),
        _ => Err(RangeError { offset, count, len }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ranges_up_to_the_end() {
        assert!(check_range(0, 0, 0).is_ok());
        assert!(check_range(5, 0, 5).is_ok());
        assert!(check_range(2, 3, 5).is_ok());
    }

    #[test]
    fn rejects_out_of_bounds_and_overflow() {
        assert_eq!(
            check_range(3, 20, 5),
            Err(RangeError { offset: 3, count: 20, len: 5 })
        );
        assert!(check_range(usize::MAX, 4, 5).is_err());
        assert!(check_range(1, usize::MAX - 1, 5).is_err());
        assert!(check_range(6, 0, 5).is_err());
    }

    #[test]
    fn message_names_the_range() {
        let err = check_range(3, 20, 5).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid range: offset 3 + count 20 exceeds length 5"
        );
    }
}
