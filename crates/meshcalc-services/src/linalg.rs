//! Matrix multiplication handler.

use std::sync::Arc;

use thiserror::Error;

use meshcalc_rpc::{Frame, HandlerRegistry, RpcError, RpcRequest, RpcResult};
use meshcalc_wire::{decode, encode, shape_of, Matrix};

/// Errors from matrix operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinalgError {
    /// The left matrix's column count does not equal the right matrix's
    /// row count.
    #[error("shape mismatch: left is {a_rows}x{a_cols}, right is {b_rows}x{b_cols}")]
    ShapeMismatch {
        a_rows: usize,
        a_cols: usize,
        b_rows: usize,
        b_cols: usize,
    },
}

/// Multiply two matrices.
///
/// Standard semantics: the result is `rows(a) × cols(b)`, each cell the
/// dot product of the corresponding row of `a` and column of `b`.
/// Arithmetic wraps in two's complement, matching what fixed-width
/// multiplication does on the other participating implementations.
pub fn matmul(a: &[Vec<i32>], b: &[Vec<i32>]) -> Result<Matrix, LinalgError> {
    let (a_rows, a_cols) = shape_of(a);
    let (b_rows, b_cols) = shape_of(b);
    if a_cols != b_rows {
        return Err(LinalgError::ShapeMismatch {
            a_rows,
            a_cols,
            b_rows,
            b_cols,
        });
    }

    let mut result = vec![vec![0i32; b_cols]; a_rows];
    for i in 0..a_rows {
        for j in 0..b_cols {
            let mut acc = 0i32;
            for k in 0..a_cols {
                acc = acc.wrapping_add(a[i][k].wrapping_mul(b[k][j]));
            }
            result[i][j] = acc;
        }
    }
    Ok(result)
}

/// Build the handler registry for a linalg worker.
///
/// Registers `linalg-matmul(shapeA, bytesA, shapeB, bytesB)`, responding
/// `[result_shape, result_bytes]`. Decode failures and incompatible
/// shapes become structured errors, never panics.
pub fn linalg_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    registry.register(
        "linalg-matmul",
        Arc::new(|req: &RpcRequest| handle_matmul(req)),
    );

    registry
}

fn handle_matmul(req: &RpcRequest) -> RpcResult<Vec<Frame>> {
    if req.args().len() != 4 {
        return Err(RpcError::InvalidArgument(format!(
            "linalg-matmul takes 4 arguments, got {}",
            req.args().len()
        )));
    }

    let a = decode_arg(req, 0, 1)?;
    let b = decode_arg(req, 2, 3)?;

    let result =
        matmul(&a, &b).map_err(|e| RpcError::InvalidArgument(e.to_string()))?;

    let (shape, payload) = encode(&result);
    Ok(vec![shape.into_bytes(), payload])
}

fn decode_arg(req: &RpcRequest, shape_idx: usize, payload_idx: usize) -> RpcResult<Matrix> {
    let shape = req.arg_str(shape_idx)?;
    let payload = req.arg(payload_idx)?;
    decode(shape, payload).map_err(|e| RpcError::InvalidArgument(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call_matmul(a: &Matrix, b: &Matrix) -> RpcResult<Vec<Frame>> {
        let registry = linalg_registry();
        let (shape_a, bytes_a) = encode(a);
        let (shape_b, bytes_b) = encode(b);
        registry.dispatch(&RpcRequest::new(
            "linalg-matmul",
            vec![shape_a.into_bytes(), bytes_a, shape_b.into_bytes(), bytes_b],
        ))
    }

    #[test]
    fn matmul_known_product() {
        let a = vec![vec![1, 2, 3], vec![4, 5, 6]];
        let b = vec![vec![2], vec![2], vec![2]];

        assert_eq!(matmul(&a, &b).unwrap(), vec![vec![12], vec![30]]);
    }

    #[test]
    fn matmul_shape_mismatch_never_computes() {
        let a = vec![vec![1, 2, 3], vec![4, 5, 6]];
        let b = vec![vec![2], vec![2], vec![2], vec![2]];

        assert_eq!(
            matmul(&a, &b),
            Err(LinalgError::ShapeMismatch {
                a_rows: 2,
                a_cols: 3,
                b_rows: 4,
                b_cols: 1,
            })
        );
    }

    #[test]
    fn matmul_identity() {
        let a = vec![vec![3, -1], vec![0, 7]];
        let identity = vec![vec![1, 0], vec![0, 1]];

        assert_eq!(matmul(&a, &identity).unwrap(), a);
    }

    #[test]
    fn matmul_wraps_on_overflow() {
        let a = vec![vec![i32::MAX]];
        let b = vec![vec![2]];

        assert_eq!(matmul(&a, &b).unwrap(), vec![vec![-2]]);
    }

    #[test]
    fn handler_valid_multiply() {
        let a = vec![vec![1, 2, 3], vec![4, 5, 6]];
        let b = vec![vec![2], vec![2], vec![2]];

        let response = call_matmul(&a, &b).unwrap();
        assert_eq!(response[0], b"2,1".to_vec());
        assert_eq!(
            decode("2,1", &response[1]).unwrap(),
            vec![vec![12], vec![30]]
        );
    }

    #[test]
    fn handler_shape_mismatch_is_structured_error() {
        let a = vec![vec![1, 2, 3], vec![4, 5, 6]];
        let b = vec![vec![2], vec![2], vec![2], vec![2]];

        let err = call_matmul(&a, &b).unwrap_err();
        match err {
            RpcError::InvalidArgument(message) => {
                assert!(message.contains("shape mismatch"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn handler_rejects_wrong_arity() {
        let registry = linalg_registry();
        let err = registry
            .dispatch(&RpcRequest::new("linalg-matmul", vec![b"2,2".to_vec()]))
            .unwrap_err();

        assert!(matches!(err, RpcError::InvalidArgument(_)));
    }

    #[test]
    fn handler_rejects_corrupt_payload() {
        let registry = linalg_registry();
        let (shape_b, bytes_b) = encode(&vec![vec![1]]);

        let err = registry
            .dispatch(&RpcRequest::new(
                "linalg-matmul",
                vec![
                    b"2,2".to_vec(),
                    vec![0, 0], // far too short for 2x2
                    shape_b.into_bytes(),
                    bytes_b,
                ],
            ))
            .unwrap_err();

        match err {
            RpcError::InvalidArgument(message) => {
                assert!(message.contains("truncated"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
