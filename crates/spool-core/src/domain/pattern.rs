//! MatchPattern - handler が受け取る envelope を絞り込む述語

use std::fmt;

use regex::Regex;

/// Regex predicate over the serialized envelope.
#[derive(Debug, Clone)]
pub struct MatchPattern(Regex);

impl MatchPattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }

    pub fn is_match(&self, wire: &str) -> bool {
        self.0.is_match(wire)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for MatchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.0.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_anywhere_in_the_wire_form() {
        let p = MatchPattern::new("abc").unwrap();
        assert!(p.is_match(r#"{"locked":false,"payload":{"messageId":"abc1"}}"#));
        assert!(!p.is_match(r#"{"locked":false,"payload":{"messageId":"xyz2"}}"#));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(MatchPattern::new("(unclosed").is_err());
    }

    #[test]
    fn display_uses_slashes() {
        let p = MatchPattern::new("xyz").unwrap();
        assert_eq!(p.to_string(), "/xyz/");
        assert_eq!(p.as_str(), "xyz");
    }
}
