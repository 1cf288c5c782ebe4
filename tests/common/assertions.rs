//! Custom test assertions
//!
//! Domain-specific assertions for gate decisions.

/// Assert a gate decision allowed the request and return its context
#[macro_export]
macro_rules! assert_allowed {
    ($decision:expr) => {
        match $decision {
            greenlight::Decision::Allow(ctx) => ctx,
            greenlight::Decision::Deny(reason) => panic!("Expected Allow, got Deny({:?})", reason),
        }
    };
}

/// Assert a gate decision denied the request with a matching reason
#[macro_export]
macro_rules! assert_denied {
    ($decision:expr, $reason:pat) => {
        match $decision {
            greenlight::Decision::Deny(reason) => assert!(
                matches!(reason, $reason),
                "Expected Deny({}), got Deny({:?})",
                stringify!($reason),
                reason
            ),
            greenlight::Decision::Allow(ctx) => {
                panic!("Expected Deny({}), got Allow({:?})", stringify!($reason), ctx)
            }
        }
    };
}

/// Assert an error matches a `GatewayError` pattern
#[macro_export]
macro_rules! assert_gateway_err {
    ($result:expr, $pattern:pat) => {
        match $result {
            Err(e) => assert!(
                matches!(e, $pattern),
                "Expected {}, got {:?}",
                stringify!($pattern),
                e
            ),
            Ok(v) => panic!("Expected {}, got Ok({:?})", stringify!($pattern), v),
        }
    };
}
