//! Matrix encode/decode against the fixed wire layout.

use crate::error::{WireError, WireResult};

/// A 2-D array of 32-bit signed integers, row-major.
pub type Matrix = Vec<Vec<i32>>;

/// Element width on the wire: 4-byte big-endian two's complement.
const CELL_BYTES: usize = 4;

/// Compute `(rows, cols)` for a matrix.
///
/// `cols` is the longest row length observed, so ragged input still yields
/// a shape; a well-formed matrix is fully rectangular.
pub fn shape_of(matrix: &[Vec<i32>]) -> (usize, usize) {
    let rows = matrix.len();
    let cols = matrix.iter().map(Vec::len).max().unwrap_or(0);
    (rows, cols)
}

/// Serialize a matrix into its shape descriptor and byte payload.
///
/// Cells are written row-major as big-endian `i32`; for a rectangular
/// matrix the payload is exactly `rows * cols * 4` bytes.
pub fn encode(matrix: &[Vec<i32>]) -> (String, Vec<u8>) {
    let (rows, cols) = shape_of(matrix);
    let mut payload = Vec::with_capacity(rows * cols * CELL_BYTES);
    for row in matrix {
        for cell in row {
            payload.extend_from_slice(&cell.to_be_bytes());
        }
    }
    (format!("{rows},{cols}"), payload)
}

/// Deserialize a matrix from its shape descriptor and byte payload.
///
/// Fails with [`WireError::MalformedShape`] unless the descriptor is
/// exactly two comma-separated non-negative decimal integers, and with
/// [`WireError::TruncatedPayload`] if the payload is shorter than
/// `rows * cols * 4` bytes. Trailing bytes are ignored. The result is
/// always fully rectangular with the declared shape.
pub fn decode(shape: &str, payload: &[u8]) -> WireResult<Matrix> {
    let (rows, cols) = parse_shape(shape)?;

    let expected = rows
        .checked_mul(cols)
        .and_then(|cells| cells.checked_mul(CELL_BYTES))
        .ok_or_else(|| WireError::MalformedShape(shape.to_string()))?;
    if payload.len() < expected {
        return Err(WireError::TruncatedPayload {
            expected,
            actual: payload.len(),
        });
    }

    let mut matrix = Vec::with_capacity(rows);
    for row_idx in 0..rows {
        let mut row = Vec::with_capacity(cols);
        for col_idx in 0..cols {
            let offset = (row_idx * cols + col_idx) * CELL_BYTES;
            let bytes: [u8; CELL_BYTES] = payload[offset..offset + CELL_BYTES]
                .try_into()
                .expect("slice length checked above");
            row.push(i32::from_be_bytes(bytes));
        }
        matrix.push(row);
    }
    Ok(matrix)
}

/// Parse `"<rows>,<cols>"` into a dimension pair.
fn parse_shape(shape: &str) -> WireResult<(usize, usize)> {
    let malformed = || WireError::MalformedShape(shape.to_string());

    let (rows, cols) = shape.split_once(',').ok_or_else(|| malformed())?;
    if cols.contains(',') {
        return Err(malformed());
    }
    let rows = parse_dim(rows).ok_or_else(|| malformed())?;
    let cols = parse_dim(cols).ok_or_else(|| malformed())?;
    Ok((rows, cols))
}

/// A dimension is a plain ASCII decimal number, no sign and no whitespace.
fn parse_dim(s: &str) -> Option<usize> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_vector_two_by_three() {
        let matrix = vec![vec![1, 2, 3], vec![4, 5, 6]];
        let (shape, payload) = encode(&matrix);

        assert_eq!(shape, "2,3");
        assert_eq!(
            payload,
            [
                0, 0, 0, 1, //
                0, 0, 0, 2, //
                0, 0, 0, 3, //
                0, 0, 0, 4, //
                0, 0, 0, 5, //
                0, 0, 0, 6,
            ]
        );
    }

    #[test]
    fn negative_values_are_twos_complement() {
        let (shape, payload) = encode(&[vec![-1, i32::MIN], vec![i32::MAX, 0]]);

        assert_eq!(shape, "2,2");
        assert_eq!(
            payload,
            [
                0xff, 0xff, 0xff, 0xff, //
                0x80, 0x00, 0x00, 0x00, //
                0x7f, 0xff, 0xff, 0xff, //
                0x00, 0x00, 0x00, 0x00,
            ]
        );
    }

    #[test]
    fn round_trip() {
        let matrices: Vec<Matrix> = vec![
            vec![vec![1, 2, 3], vec![4, 5, 6]],
            vec![vec![42]],
            vec![vec![-7, 0, 7]],
            vec![vec![i32::MIN, i32::MAX]],
        ];

        for matrix in matrices {
            let (shape, payload) = encode(&matrix);
            assert_eq!(decode(&shape, &payload).unwrap(), matrix);
        }
    }

    #[test]
    fn empty_matrix_round_trip() {
        let (shape, payload) = encode(&[]);
        assert_eq!(shape, "0,0");
        assert!(payload.is_empty());
        assert_eq!(decode(&shape, &payload).unwrap(), Vec::<Vec<i32>>::new());
    }

    #[test]
    fn zero_column_matrix() {
        let matrix: Matrix = vec![vec![], vec![]];
        let (shape, payload) = encode(&matrix);
        assert_eq!(shape, "2,0");
        assert!(payload.is_empty());
        assert_eq!(decode(&shape, &payload).unwrap(), matrix);
    }

    #[test]
    fn decode_rejects_malformed_shapes() {
        for shape in ["", "2", "2,3,4", "2,", ",3", "a,3", "2, 3", "-2,3", "2,+3"] {
            assert!(
                matches!(decode(shape, &[]), Err(WireError::MalformedShape(_))),
                "shape {shape:?} should be rejected"
            );
        }
    }

    #[test]
    fn decode_rejects_short_payload() {
        let (shape, mut payload) = encode(&[vec![1, 2], vec![3, 4]]);
        payload.pop();

        assert_eq!(
            decode(&shape, &payload),
            Err(WireError::TruncatedPayload {
                expected: 16,
                actual: 15
            })
        );
    }

    #[test]
    fn decode_ignores_trailing_bytes() {
        let (shape, mut payload) = encode(&[vec![9, 8]]);
        payload.extend_from_slice(&[0xde, 0xad]);

        assert_eq!(decode(&shape, &payload).unwrap(), vec![vec![9, 8]]);
    }

    #[test]
    fn shape_of_ragged_rows_uses_longest() {
        assert_eq!(shape_of(&[vec![1], vec![1, 2, 3]]), (2, 3));
    }

    #[test]
    fn shape_parses_large_dims_without_overflow() {
        let shape = format!("{},{}", usize::MAX, usize::MAX);
        assert!(matches!(
            decode(&shape, &[]),
            Err(WireError::MalformedShape(_))
        ));
    }
}
