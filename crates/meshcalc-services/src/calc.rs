//! Scalar arithmetic handlers.

use std::sync::Arc;

use meshcalc_rpc::{Frame, HandlerRegistry, RpcRequest, RpcResult};

/// Build the handler registry for a calculator worker.
///
/// Registers `calculate-sum` and `calculate-subtract`; both take two
/// decimal integer arguments and respond `[impl_tag, result]`.
pub fn calc_registry(impl_tag: &str) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    let tag = impl_tag.to_string();
    registry.register(
        "calculate-sum",
        Arc::new(move |req: &RpcRequest| binary_op(req, &tag, |a, b| a + b)),
    );

    let tag = impl_tag.to_string();
    registry.register(
        "calculate-subtract",
        Arc::new(move |req: &RpcRequest| binary_op(req, &tag, |a, b| a - b)),
    );

    registry
}

fn binary_op(
    req: &RpcRequest,
    impl_tag: &str,
    op: impl Fn(i64, i64) -> i64,
) -> RpcResult<Vec<Frame>> {
    let a = req.arg_i64(0)?;
    let b = req.arg_i64(1)?;
    let result = op(a, b);
    Ok(vec![
        impl_tag.as_bytes().to_vec(),
        result.to_string().into_bytes(),
    ])
}
