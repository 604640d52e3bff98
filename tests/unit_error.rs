/// Unit tests for ResolveError and ResolveResult

use ferrous_resolver::{LifeCycle, ResolveError, ResolveResult};
use std::error::Error;

#[test]
fn test_error_display_configuration() {
    let error = ResolveError::Configuration {
        strategy: "ByTag",
        discriminator: "tag",
    };
    assert_eq!(error.to_string(), "ByTag requires a non-empty tag");
}

#[test]
fn test_error_display_unresolvable() {
    let error = ResolveError::Unresolvable {
        type_name: "game::Board",
        lifecycle: LifeCycle::SINGLETON,
        reason: "no binding and no construction path",
    };
    let display_str = error.to_string();
    assert!(display_str.starts_with("Cannot resolve game::Board as "));
    assert!(display_str.contains("SINGLETON"));
    assert!(display_str.ends_with("no binding and no construction path"));
}

#[test]
fn test_error_display_type_mismatch() {
    let error = ResolveError::TypeMismatch("std::string::String");
    assert_eq!(error.to_string(), "Type mismatch for: std::string::String");
}

#[test]
fn test_error_display_circular() {
    let error = ResolveError::Circular(vec!["ServiceA", "ServiceB", "ServiceA"]);
    assert_eq!(error.to_string(), "Circular dependency: ServiceA -> ServiceB -> ServiceA");
}

#[test]
fn test_error_display_depth_exceeded() {
    let error = ResolveError::DepthExceeded(100);
    assert_eq!(error.to_string(), "Max depth 100 exceeded");
}

#[test]
fn test_error_display_invalid_config() {
    let error = ResolveError::InvalidConfig("max_depth must be positive".into());
    assert_eq!(error.to_string(), "Invalid configuration: max_depth must be positive");
}

#[test]
fn test_error_is_std_error() {
    let error: Box<dyn Error> = Box::new(ResolveError::DepthExceeded(1));
    assert!(error.source().is_none());
}

#[test]
fn test_result_alias_propagates() {
    fn inner() -> ResolveResult<u8> {
        Err(ResolveError::TypeMismatch("u8"))
    }

    fn outer() -> ResolveResult<u8> {
        let value = inner()?;
        Ok(value + 1)
    }

    assert!(matches!(outer(), Err(ResolveError::TypeMismatch("u8"))));
}
