use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(NarrationError::input("x").to_string().contains("input error:"));
    assert!(
        NarrationError::background("x")
            .to_string()
            .contains("background load error:")
    );
    assert!(
        NarrationError::invariant("x")
            .to_string()
            .contains("invariant violation:")
    );
    assert!(NarrationError::render("x").to_string().contains("render error:"));
    assert!(
        NarrationError::RetryExhausted { attempts: 4 }
            .to_string()
            .contains("after 4 attempts")
    );
}

#[test]
fn only_rate_limit_is_retryable() {
    assert!(NarrationError::rate_limit("429").is_retryable());
    assert!(!NarrationError::synthesis("500").is_retryable());
    assert!(!NarrationError::input("empty text").is_retryable());
    assert!(!NarrationError::RetryExhausted { attempts: 4 }.is_retryable());
}

#[test]
fn kind_matches_variant() {
    assert_eq!(NarrationError::cancelled("x").kind(), ErrorKind::Cancelled);
    assert_eq!(NarrationError::config("x").kind(), ErrorKind::Config);
    assert_eq!(
        NarrationError::RetryExhausted { attempts: 1 }.kind(),
        ErrorKind::RetryExhausted
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = NarrationError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.kind(), ErrorKind::Other);
}
