//! Identifier case transforms.
//!
//! Symbol names in the generated header are derived from snake_case
//! identifiers in the input file. The four transforms here cover the
//! naming conventions a generator may need: `some_name` becomes
//! `someName` (camel), `SomeName` (pascal), `Some_Name` (ada) or
//! `SOME_NAME` (upper).

/// First character upper-cased, the rest lower-cased.
fn capitalize(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => {
            let mut s = first.to_ascii_uppercase().to_string();
            s.push_str(&chars.as_str().to_ascii_lowercase());
            s
        }
        None => String::new(),
    }
}

/// `some_name` -> `SomeName`
#[must_use]
pub fn to_pascal_case(s: &str) -> String {
    s.split('_').map(capitalize).collect()
}

/// `some_name` -> `Some_Name`
#[must_use]
pub fn to_ada_case(s: &str) -> String {
    s.split('_').map(capitalize).collect::<Vec<_>>().join("_")
}

/// `some_name` -> `someName`
#[must_use]
pub fn to_camel_case(s: &str) -> String {
    let mut pascal = to_pascal_case(s);
    if let Some(first) = pascal.get(..1) {
        let lowered = first.to_ascii_lowercase();
        pascal.replace_range(..1, &lowered);
    }
    pascal
}

/// `some_name` -> `SOME_NAME`
#[must_use]
pub fn to_upper_case(s: &str) -> String {
    s.to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transforms() {
        assert_eq!(to_pascal_case("vs_params"), "VsParams");
        assert_eq!(to_camel_case("vs_params"), "vsParams");
        assert_eq!(to_ada_case("vs_params"), "Vs_Params");
        assert_eq!(to_upper_case("vs_params"), "VS_PARAMS");
    }

    #[test]
    fn test_single_word() {
        assert_eq!(to_pascal_case("tex"), "Tex");
        assert_eq!(to_camel_case("tex"), "tex");
        assert_eq!(to_ada_case("tex"), "Tex");
    }

    #[test]
    fn test_empty() {
        assert_eq!(to_pascal_case(""), "");
        assert_eq!(to_camel_case(""), "");
        assert_eq!(to_ada_case(""), "");
        assert_eq!(to_upper_case(""), "");
    }

    #[test]
    fn test_pascal_is_capitalized_camel() {
        for name in ["prog", "vs_params", "offscreen_pass_fs", "a_b_c"] {
            let camel = to_camel_case(name);
            let mut expected = camel.clone();
            expected.replace_range(..1, &camel[..1].to_ascii_uppercase());
            assert_eq!(to_pascal_case(name), expected);
        }
    }

    #[test]
    fn test_upper_of_pascal_drops_underscores() {
        for name in ["prog", "vs_params", "offscreen_pass_fs"] {
            let from_pascal = to_upper_case(&to_pascal_case(name));
            let direct = to_upper_case(name).replace('_', "");
            assert_eq!(from_pascal, direct);
        }
    }

    #[test]
    fn test_ada_preserves_underscore_count() {
        for name in ["prog", "vs_params", "a_b_c", "trailing_"] {
            let underscores = |s: &str| s.matches('_').count();
            assert_eq!(underscores(&to_ada_case(name)), underscores(name));
        }
    }
}
