//! Custom assertion macros
//!
//! Provides assertions with more descriptive failure output than plain
//! `assert!` for the shapes the API tests check over and over.

#![allow(unused_macros)]

/// Assert that a result is ok and return the value
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($result:expr, $message:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $message, e),
        }
    };
}

/// Assert that a string contains a substring
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        assert!(
            $haystack.contains($needle),
            "Expected '{}' to contain '{}'",
            $haystack,
            $needle
        );
    };
}

/// Assert an API error response: status code and `error` message
macro_rules! assert_api_error {
    ($response:expr, $status:expr, $message:expr) => {{
        let response = &$response;
        assert_eq!(
            response.status_code(),
            $status,
            "unexpected status, body: {}",
            response.text()
        );
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], $message, "unexpected error body: {}", body);
        assert_eq!(body["status"], $status.as_u16());
    }};
}

/// Assert that two id collections hold the same set of ids
macro_rules! assert_same_ids {
    ($left:expr, $right:expr) => {{
        let left: std::collections::BTreeSet<uuid::Uuid> = $left.iter().copied().collect();
        let right: std::collections::BTreeSet<uuid::Uuid> = $right.iter().copied().collect();
        pretty_assertions::assert_eq!(left, right);
    }};
}
