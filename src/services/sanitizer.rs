//! Allow-list HTML sanitizer for free text that is re-displayed to other
//! users. Mandatory on every write path for such fields.

use ammonia::Builder;
use std::collections::{HashMap, HashSet};

/// Strip all markup except basic formatting: b, i, u, em, strong, anchors
/// (href/title only), headings, paragraphs, line breaks and lists.
#[must_use]
pub fn sanitize_html(input: &str) -> String {
    let tags: HashSet<&str> = [
        "b", "i", "u", "em", "strong", "a", "h1", "h2", "h3", "h4", "h5", "h6", "p", "br", "ul",
        "ol", "li",
    ]
    .into_iter()
    .collect();

    let mut tag_attributes: HashMap<&str, HashSet<&str>> = HashMap::new();
    tag_attributes.insert("a", ["href", "title"].into_iter().collect());

    Builder::default()
        .tags(tags)
        .generic_attributes(HashSet::new())
        .tag_attributes(tag_attributes)
        .link_rel(None)
        .clean(input)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_tags() {
        let dirty = "<p>ok</p><script>alert('xss')</script>";
        assert_eq!(sanitize_html(dirty), "<p>ok</p>");
    }

    #[test]
    fn keeps_allowed_formatting() {
        let input = "<b>bold</b> and <em>emphasis</em><br><ul><li>item</li></ul>";
        assert_eq!(sanitize_html(input), input);
    }

    #[test]
    fn anchors_keep_only_href_and_title() {
        let dirty = r#"<a href="https://example.com" title="t" onclick="steal()">link</a>"#;
        let clean = sanitize_html(dirty);

        assert!(clean.contains(r#"href="https://example.com""#));
        assert!(clean.contains(r#"title="t""#));
        assert!(!clean.contains("onclick"));
    }

    #[test]
    fn strips_event_handlers_and_unknown_tags() {
        let dirty = r#"<img src=x onerror=alert(1)><div>text</div>"#;
        assert_eq!(sanitize_html(dirty), "text");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(sanitize_html("engine fire on stand 42"), "engine fire on stand 42");
    }
}
