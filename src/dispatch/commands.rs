use regex::Regex;
use std::sync::OnceLock;

static AUTO_CC: OnceLock<Option<Regex>> = OnceLock::new();
static CC: OnceLock<Option<Regex>> = OnceLock::new();

/// True if a line of `body` is exactly `/auto-cc` (any case, trailing space allowed)
pub fn is_auto_cc(body: &str) -> bool {
    AUTO_CC
        .get_or_init(|| Regex::new(r"(?mi)^/auto-cc\s*$").ok())
        .as_ref()
        .map(|re| re.is_match(body))
        .unwrap_or(false)
}

/// True if `body` carries an explicit `/cc` or `/uncc` command line
pub fn has_cc_command(body: &str) -> bool {
    CC.get_or_init(|| Regex::new(r"(?mi)^/(un)?cc(( +@?[-/\w]+?)*)\s*$").ok())
        .as_ref()
        .map(|re| re.is_match(body))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_cc_matches_whole_line() {
        assert!(is_auto_cc("/auto-cc"));
        assert!(is_auto_cc("/AUTO-CC  "));
        assert!(is_auto_cc("thanks!\n/auto-cc\r\nmore text"));
        assert!(!is_auto_cc("please /auto-cc"));
        assert!(!is_auto_cc("/auto-cc now"));
        assert!(!is_auto_cc("/auto-ccc"));
    }

    #[test]
    fn test_cc_commands() {
        assert!(has_cc_command("/cc @alice"));
        assert!(has_cc_command("Fixes #1\n\n/cc @alice bob"));
        assert!(has_cc_command("/uncc @bob"));
        assert!(has_cc_command("/cc"));
        assert!(has_cc_command("/cc kubernetes/sig-net"));
        assert!(!has_cc_command("see /cc docs"));
        assert!(!has_cc_command("/ccc @alice"));
        assert!(!has_cc_command("/auto-cc"));
    }
}
