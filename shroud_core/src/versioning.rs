//! Wire versioning helpers.

use crate::error::ShroudError;

pub const PACKAGE_VERSION: u16 = 1;

pub fn check_version(found: u16, expected: u16, context: &'static str) -> Result<(), ShroudError> {
    if found != expected {
        return Err(ShroudError::VersionMismatch {
            context,
            expected,
            found,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_reports_both_versions() {
        let err = check_version(3, PACKAGE_VERSION, "Package").unwrap_err();
        match err {
            ShroudError::VersionMismatch {
                expected, found, ..
            } => {
                assert_eq!(expected, PACKAGE_VERSION);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
