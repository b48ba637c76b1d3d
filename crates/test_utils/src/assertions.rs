//! Custom Test Assertions
//!
//! Assertion helpers over the calls recorded by `MockTransport`, giving
//! more useful failure messages than comparing raw JSON.

use serde_json::Value;

use infra_erp::RpcCall;

use crate::mock::MockTransport;

/// Asserts that exactly one `execute_kw` call was made and returns it
///
/// # Panics
///
/// Panics if the mock received zero or several calls, or if the single
/// call does not target `model.method`
pub fn assert_single_call(transport: &MockTransport, model: &str, method: &str) -> RpcCall {
    let calls = transport.calls();
    assert_eq!(
        calls.len(),
        1,
        "Expected exactly one ERP call, got {:?}",
        calls.iter().map(RpcCall::operation).collect::<Vec<_>>()
    );
    let call = calls[0].clone();
    assert_eq!(call.model, model, "Unexpected model for {}", call.operation());
    assert_eq!(call.method, method, "Unexpected method for {}", call.operation());
    call
}

/// Asserts that no model method was invoked
pub fn assert_no_invocations(transport: &MockTransport) {
    let calls = transport.calls();
    assert!(
        calls.is_empty(),
        "Expected no ERP calls, got {:?}",
        calls.iter().map(RpcCall::operation).collect::<Vec<_>>()
    );
}

/// Asserts the search domain (first positional argument) of a call
pub fn assert_domain(call: &RpcCall, expected: Value) {
    let domain = call.args.first().cloned().unwrap_or(Value::Null);
    assert_eq!(
        domain,
        expected,
        "Unexpected domain for {}",
        call.operation()
    );
}

/// Asserts that none of `keys` appear in the call's keyword arguments
pub fn assert_kwargs_omit(call: &RpcCall, keys: &[&str]) {
    for key in keys {
        assert!(
            !call.kwargs.contains_key(*key),
            "Expected kwarg '{}' to be omitted from {}, got {:?}",
            key,
            call.operation(),
            call.kwargs
        );
    }
}

/// Asserts a single keyword argument
pub fn assert_kwarg(call: &RpcCall, key: &str, expected: Value) {
    assert_eq!(
        call.kwargs.get(key),
        Some(&expected),
        "Unexpected kwarg '{}' for {}",
        key,
        call.operation()
    );
}
