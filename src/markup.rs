//! Tag-marked text helpers.
//!
//! Rendered output (charmap labels, feedback lines) is a plain string with
//! embedded HTML-like tags (`<red>...</red>`, `<bold>...</bold>`). These
//! helpers build well-formed tag runs and neutralize any literal angle
//! brackets coming from user-derived strings (a ship or fleet name) before
//! they are spliced into tag-marked output, so a player cannot inject a
//! fake tag by naming a ship `</red><h1>`.

/// Wrap `text` in a single tag.
pub fn wrap_tag(tag: &str, text: &str) -> String {
    format!("<{tag}>{text}</{tag}>")
}

/// Wrap `text` in nested tags, outermost first.
pub fn wrap_tags(tags: &[&str], text: &str) -> String {
    tags.iter().rev().fold(text.to_string(), |acc, tag| wrap_tag(tag, &acc))
}

/// Escape literal `<` and `>` characters so a user-derived string cannot
/// be mistaken for markup when embedded in tag-marked output.
pub fn escape(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_tag_produces_matching_open_close() {
        assert_eq!(wrap_tag("red", "hi"), "<red>hi</red>");
    }

    #[test]
    fn wrap_tags_nests_outermost_first() {
        assert_eq!(wrap_tags(&["red", "bold"], "hi"), "<red><bold>hi</bold></red>");
    }

    #[test]
    fn escape_neutralizes_injected_tags() {
        assert_eq!(escape("</red><h1>pwned"), "&lt;/red&gt;&lt;h1&gt;pwned");
    }

    #[test]
    fn escape_is_a_noop_on_plain_text() {
        assert_eq!(escape("Ironclad"), "Ironclad");
    }
}
