//! Fullname and permalink helpers

use regex::Regex;
use std::sync::LazyLock;

/// Regex for comment permalinks: /r/{subreddit}/comments/{post}/...
static COMMENT_CONTEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/r/[^/]*/comments/([^/]*)/.*").unwrap());

/// Split a fullname such as `t3_abc123` into its kind and id
pub fn split_id(fullname: &str) -> Option<(&str, &str)> {
    let mut parts = fullname.split('_');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(kind), Some(id), None) => Some((kind, id)),
        _ => None,
    }
}

/// Extract the post id from a comment context permalink
///
/// `/r/pics/comments/abc123/some_title/def456/?context=3` gives `abc123`.
pub fn post_id_from_context(context: &str) -> Option<&str> {
    COMMENT_CONTEXT
        .captures(context)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("t3_abc123", Some(("t3", "abc123")) ; "post fullname")]
    #[test_case("t1_x", Some(("t1", "x")) ; "comment fullname")]
    #[test_case("abc123", None ; "no separator")]
    #[test_case("t3_abc_def", None ; "too many parts")]
    fn test_split_id(input: &str, expected: Option<(&str, &str)>) {
        assert_eq!(split_id(input), expected);
    }

    #[test]
    fn test_post_id_from_context() {
        assert_eq!(
            post_id_from_context("/r/pics/comments/abc123/a_title/def456/?context=3"),
            Some("abc123")
        );
        assert_eq!(post_id_from_context("/message/messages/xyz"), None);
        assert_eq!(post_id_from_context(""), None);
    }
}
