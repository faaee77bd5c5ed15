use ammonia;

/// Sanitizes free text before it is stored.
///
/// Whitelist-based: safe inline tags survive, `<script>` and friends are dropped
/// together with their content, event-handler attributes are stripped.
/// Plain text without markup passes through except for entity escaping of `<`, `>` and `&`.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Sanitized optional description; blank input becomes `None`.
pub fn clean_description(input: Option<&str>) -> Option<String> {
    input
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(clean_html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_are_stripped() {
        assert_eq!(clean_html("great <script>alert(1)</script>read"), "great read");
    }

    #[test]
    fn blank_description_is_none() {
        assert_eq!(clean_description(Some("   ")), None);
        assert_eq!(clean_description(None), None);
        assert_eq!(clean_description(Some(" A classic ")), Some("A classic".to_string()));
    }
}
