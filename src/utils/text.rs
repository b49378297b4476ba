//! C-source text helpers for the header generator.

/// Rewrites C block-comment tokens so a shader source can be embedded in a
/// C comment: `/*` becomes `/_` and `*/` becomes `_/`.
#[must_use]
pub fn replace_c_comment_tokens(s: &str) -> String {
    s.replace("/*", "/_").replace("*/", "_/")
}

/// Escapes one source line for use inside a C string literal.
///
/// Backslashes and double quotes are escaped; the caller appends the
/// explicit `\n` terminator when stitching lines together.
#[must_use]
pub fn escape_c_string(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for ch in line.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_tokens() {
        assert_eq!(replace_c_comment_tokens("/* hi */"), "/_ hi _/");
        assert_eq!(replace_c_comment_tokens("a / * b"), "a / * b");
    }

    #[test]
    fn test_comment_tokens_inverse() {
        let original = "/* nested /* tokens */ here */";
        let rewritten = replace_c_comment_tokens(original);
        let restored = rewritten.replace("/_", "/*").replace("_/", "*/");
        assert_eq!(restored, original);
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape_c_string(r#"vec2 a = "x\y";"#), r#"vec2 a = \"x\\y\";"#);
        assert_eq!(escape_c_string("plain"), "plain");
    }
}
