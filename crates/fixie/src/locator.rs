//! Resolution of short fixture names to paths.

use std::path::PathBuf;

/// Resolves a short fixture name, such as `initial_data`, to a file.
///
/// Discovery itself is left to the embedding application. Any
/// `Fn(&str) -> Option<PathBuf>` closure is a locator.
pub trait SourceLocator {
    /// Return the path of the fixture called `name`, if one exists.
    fn locate(&self, name: &str) -> Option<PathBuf>;
}

impl<F> SourceLocator for F
where
    F: Fn(&str) -> Option<PathBuf>,
{
    fn locate(&self, name: &str) -> Option<PathBuf> {
        self(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_locator() {
        let locator = |name: &str| (name == "initial_data").then(|| PathBuf::from("fixtures/initial_data.json"));

        assert_eq!(
            locator.locate("initial_data"),
            Some(PathBuf::from("fixtures/initial_data.json"))
        );
        assert_eq!(locator.locate("other"), None);
    }
}
