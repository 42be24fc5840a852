use std::collections::HashMap;

fn opening(tag: &str) -> String {
    format!("{{{tag}:")
}

/// Walk every well-formed `{tag:payload}` occurrence in a single pass.
///
/// `on_tag` receives the trimmed payload and the raw tag text and returns the
/// replacement. Malformed openings (unclosed, empty, nested or multi-line
/// payloads) are copied through unchanged.
fn scan_tags(text: &str, tag: &str, mut on_tag: impl FnMut(&str, &str) -> String) -> String {
    let open = opening(tag);
    let mut rendered = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(&open) {
        rendered.push_str(&rest[..start]);
        let body_start = start + open.len();
        let body = &rest[body_start..];

        let Some(end) = body.find(|c: char| matches!(c, '}' | '{' | '\n')) else {
            rendered.push_str(&rest[start..]);
            rest = "";
            break;
        };

        let payload = body[..end].trim();
        if !body[end..].starts_with('}') || payload.is_empty() {
            rendered.push_str(&open);
            rest = body;
            continue;
        }

        let raw = &rest[start..body_start + end + 1];
        rendered.push_str(&on_tag(payload, raw));
        rest = &body[end + 1..];
    }
    rendered.push_str(rest);
    rendered
}

/// Extract the distinct payloads of every `{tag:payload}` occurrence, in
/// first-occurrence order.
pub fn parse_by_tag(text: &str, tag: &str) -> Vec<String> {
    let mut payloads: Vec<String> = Vec::new();
    scan_tags(text, tag, |payload, raw| {
        if !payloads.iter().any(|seen| seen == payload) {
            payloads.push(payload.to_string());
        }
        raw.to_string()
    });
    payloads
}

/// Substitute each `{tag:payload}` whose payload has a replacement.
///
/// Payloads without a replacement keep their original tag text.
pub fn replace_tags(text: &str, tag: &str, replacements: &HashMap<String, String>) -> String {
    scan_tags(text, tag, |payload, raw| {
        replacements
            .get(payload)
            .cloned()
            .unwrap_or_else(|| raw.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_by_tag_returns_payloads_in_order() {
        let text = "See {channel:rules} and {channel:general}, then {channel:rules} again.";
        assert_eq!(parse_by_tag(text, "channel"), vec!["rules", "general"]);
    }

    #[test]
    fn test_parse_by_tag_ignores_other_tags() {
        let text = "{role:Moderator} pinged {mention:alice} in {channel:general}";
        assert_eq!(parse_by_tag(text, "role"), vec!["Moderator"]);
        assert_eq!(parse_by_tag(text, "mention"), vec!["alice"]);
        assert!(parse_by_tag(text, "user").is_empty());
    }

    #[test]
    fn test_parse_by_tag_empty_when_absent() {
        assert!(parse_by_tag("plain text, {no tags} here", "role").is_empty());
        assert!(parse_by_tag("", "role").is_empty());
    }

    #[test]
    fn test_parse_by_tag_trims_and_collapses_duplicates() {
        let text = "{role: Root } {role:Root}";
        assert_eq!(parse_by_tag(text, "role"), vec!["Root"]);
    }

    #[test]
    fn test_parse_by_tag_skips_malformed() {
        let text = "{role:} {role:a\nb} {role:outer {role:inner} {role:unclosed";
        assert_eq!(parse_by_tag(text, "role"), vec!["inner"]);
    }

    #[test]
    fn test_parse_by_tag_is_case_sensitive_on_name() {
        assert!(parse_by_tag("{Role:Root}", "role").is_empty());
    }

    #[test]
    fn test_replace_tags_keeps_unknown_payloads() {
        let replacements = HashMap::from([("Root".to_string(), "<@&1>".to_string())]);
        let rendered = replace_tags("{role:Root} {role:Ghost} {role: Root}", "role", &replacements);
        assert_eq!(rendered, "<@&1> {role:Ghost} <@&1>");
    }

    #[test]
    fn test_replace_tags_leaves_malformed_text_intact() {
        let replacements = HashMap::from([("x".to_string(), "y".to_string())]);
        let text = "prefix {role:x";
        assert_eq!(replace_tags(text, "role", &replacements), text);
    }
}
