//! Contains the demo programs shipped with the crate, written in the
//! textual instruction list.

/// All available demo sources by name.
const DEMOS: [(&str, &str); 5] = [
    ("AND_OR", include_str!("and_or.il")),
    ("GROUP", include_str!("group.il")),
    ("BLINKER", include_str!("blinker.il")),
    ("COUNTER", include_str!("counter.il")),
    ("MATH", include_str!("math.il")),
];

/// Will return all the demo names available to be chosen.
pub fn names() -> Vec<&'static str> {
    DEMOS.iter().map(|(name, _)| *name).collect()
}

/// Will return the source text of the given demo.
pub fn source(name: &str) -> Option<&'static str> {
    DEMOS
        .iter()
        .find(|(demo, _)| *demo == name)
        .map(|(_, source)| *source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compiler, program::Program};

    #[test]
    fn test_names() {
        let names = names();
        assert_eq!(names.len(), 5);
        assert!(names.contains(&"BLINKER"));
        assert_eq!(source("NO_SUCH_DEMO"), None);
    }

    #[test]
    /// every shipped demo compiles without findings and passes the
    /// loader verification
    fn test_demos_compile_clean() {
        for (name, source) in DEMOS.iter() {
            let output = compiler::compile(source)
                .unwrap_or_else(|err| panic!("demo {} failed: {}", name, err));
            assert!(
                output.warnings.is_empty(),
                "demo {} produced warnings",
                name
            );
            assert!(Program::new(name, output.binary).is_ok());
        }
    }
}
