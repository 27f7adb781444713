//! Regex utilities for argus
//! Extracted to a separate crate for compilation optimization

use once_cell::sync::Lazy;
use regex::Regex;

/// Wildcard watch specifications of the form `<dir>*.<ext>`
pub mod wildcard {
    use super::*;

    /// Directory prefix, a literal `*`, then a dot-extension
    pub static SPEC_PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^(.*)\*\.(\w+)").expect("Invalid regex pattern")
    });

    /// The two halves of a wildcard specification
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct WildcardSpec {
        /// Everything before the `*`, possibly empty
        pub dir: String,
        /// Extension without the leading dot
        pub ext: String,
    }

    /// Split a specification into directory prefix and extension
    pub fn parse(spec: &str) -> Option<WildcardSpec> {
        let caps = SPEC_PATTERN.captures(spec)?;
        Some(WildcardSpec {
            dir: caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
            ext: caps.get(2)?.as_str().to_string(),
        })
    }

    /// Build a matcher for file names carrying the given extension
    pub fn file_name_matcher(ext: &str) -> Result<Regex, regex::Error> {
        Regex::new(&format!(r"^.+\.{}$", regex::escape(ext)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_parse() {
        assert_eq!(
            wildcard::parse("/tmp/watched/*.log"),
            Some(wildcard::WildcardSpec {
                dir: "/tmp/watched/".to_string(),
                ext: "log".to_string(),
            })
        );

        assert_eq!(
            wildcard::parse("*.rs"),
            Some(wildcard::WildcardSpec { dir: String::new(), ext: "rs".to_string() })
        );

        assert_eq!(wildcard::parse("/tmp/watched/a.log"), None);
        assert_eq!(wildcard::parse("/tmp/watched/*"), None);
    }

    #[test]
    fn test_file_name_matcher() {
        let matcher = wildcard::file_name_matcher("log").unwrap();

        assert!(matcher.is_match("a.log"));
        assert!(matcher.is_match("server-01.log"));
        assert!(!matcher.is_match(".log"));
        assert!(!matcher.is_match("a.log.bak"));
        assert!(!matcher.is_match("b.txt"));
    }
}
