use std::collections::TryReserveError;

use thiserror::Error;

/// Failures of a single alignment call.
///
/// Not finding a match is not an error; it is reported as `Ok(None)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlignError {
    #[error("failed to allocate {len} cells for the {buffer} buffer: {source}")]
    Allocation {
        buffer: &'static str,
        len: usize,
        #[source]
        source: TryReserveError,
    },
    #[error("reference has {phonemes} phonemes but {word_indices} word indices")]
    MismatchedWordIndex {
        phonemes: usize,
        word_indices: usize,
    },
}

/// Empty buffer with room for exactly `len` elements, reporting allocation
/// failure instead of aborting.
pub(crate) fn reserved_buffer<T>(buffer: &'static str, len: usize) -> Result<Vec<T>, AlignError> {
    let mut cells = Vec::new();
    cells
        .try_reserve_exact(len)
        .map_err(|source| AlignError::Allocation {
            buffer,
            len,
            source,
        })?;
    Ok(cells)
}

/// Allocates a buffer of `len` copies of `value`.
pub(crate) fn filled_buffer<T: Clone>(
    buffer: &'static str,
    len: usize,
    value: T,
) -> Result<Vec<T>, AlignError> {
    let mut cells = reserved_buffer(buffer, len)?;
    cells.resize(len, value);
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_buffer_has_requested_len() {
        let buf = filled_buffer("cost", 5, 1.5f64).unwrap();
        assert_eq!(buf, vec![1.5; 5]);
    }

    #[test]
    fn test_filled_buffer_reports_capacity_overflow() {
        let err = filled_buffer("cost", usize::MAX, 0.0f64).unwrap_err();
        match err {
            AlignError::Allocation { buffer, len, .. } => {
                assert_eq!(buffer, "cost");
                assert_eq!(len, usize::MAX);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reserved_buffer_is_empty_with_capacity() {
        let buf: Vec<u32> = reserved_buffer("ids", 8).unwrap();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= 8);
    }

    #[test]
    fn test_reserved_buffer_reports_capacity_overflow() {
        assert!(matches!(
            reserved_buffer::<u64>("ids", usize::MAX),
            Err(AlignError::Allocation { buffer: "ids", .. })
        ));
    }

    #[test]
    fn test_mismatch_message() {
        let err = AlignError::MismatchedWordIndex {
            phonemes: 4,
            word_indices: 3,
        };
        assert_eq!(
            err.to_string(),
            "reference has 4 phonemes but 3 word indices"
        );
    }
}
