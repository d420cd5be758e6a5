//! The shared `Result` alias.
//!
//! Domain crates keep their own plain error enums (`SceneError`,
//! `EngineError`, ...) and only wrap them in a rootcause `Report` at public
//! entry points, so `?` on a bare domain error lifts it into the report.

use rootcause::Report;

/// A Result whose error is a rootcause `Report` carrying context `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug, PartialEq, Eq)]
    struct Refused;

    impl fmt::Display for Refused {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("refused")
        }
    }

    impl std::error::Error for Refused {}

    fn refuse() -> Result<(), Refused> {
        let outcome: std::result::Result<(), Refused> = Err(Refused);
        outcome?;
        Ok(())
    }

    #[test]
    fn domain_error_lifts_into_report() {
        let err = refuse().expect_err("refused");
        assert_eq!(err.current_context(), &Refused);
    }
}
