//! Compiles declared route paths into anchored regular expressions.
//!
//! A path mixes three kinds of text:
//!
//! - literal text, used as-is (so regex metacharacters in it keep their meaning),
//! - named params, `:name` or `:name?` for an optional one,
//! - raw groups, `(...)` or `(...)?`, passed through verbatim.
//!
//! Non-capturing groups like `(?:...)` and flag groups like `(?i)` are not params; they
//! stay part of the literal text around them.
//!
//! Each param becomes one capture group, in declaration order. Raw groups are named after
//! their position among all params of the path, so `/:a/(\d+)` declares `["a", "1"]`.

use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashMap;

/// The pattern a param matches when no assertion overrides it.
pub const DEFAULT_PARAM_PATTERN: &str = "(\\w+)";

/// A route path compiled into a matcher and the names of the values it captures.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Regex,
    params: Vec<String>,
}

impl CompiledPattern {
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Param names, one per capture group, in capture order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn into_parts(self) -> (Regex, Vec<String>) {
        (self.regex, self.params)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Placeholder<'p> {
    Named { name: &'p str, optional: bool },
    Group { source: &'p str },
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'p> {
    Literal(&'p str),
    Param(Placeholder<'p>),
}

/// Compiles `path` into an anchored pattern.
///
/// `assertions` maps param names to replacement patterns, already wrapped in a capture group.
/// A passthrough pattern is left open at the end so it matches any path it is a prefix of.
pub fn compile(
    path: &str,
    assertions: &HashMap<String, String>,
    passthrough: bool,
) -> Result<CompiledPattern, ConfigError> {
    let tokens = tokenize(path)?;

    let mut params = Vec::new();
    let mut source = String::with_capacity(path.len() + 16);
    source.push('^');

    for token in tokens {
        let placeholder = match token {
            Token::Literal(text) => {
                source.push_str(text);
                continue;
            }
            Token::Param(placeholder) => placeholder,
        };

        let index = params.len();
        let (name, optional) = match &placeholder {
            Placeholder::Named { name, optional } => ((*name).to_owned(), *optional),
            Placeholder::Group { source } => (index.to_string(), source.ends_with('?')),
        };

        match (assertions.get(&name), &placeholder) {
            (Some(assertion), _) if optional => {
                source.push('?');
                source.push_str(assertion);
                source.push('?');
            }
            (Some(assertion), _) => source.push_str(assertion),
            (None, Placeholder::Group { source: group }) => source.push_str(group),
            (None, Placeholder::Named { .. }) if optional => {
                source.push('?');
                source.push_str(DEFAULT_PARAM_PATTERN);
                source.push('?');
            }
            (None, Placeholder::Named { .. }) => source.push_str(DEFAULT_PARAM_PATTERN),
        }
        params.push(name);
    }

    if source.ends_with('/') {
        source.push('?');
    } else {
        source.push_str("/?");
    }
    if !passthrough {
        source.push('$');
    }

    let regex = Regex::new(&source).map_err(|e| ConfigError::invalid_pattern(path, e))?;

    let groups = regex.captures_len() - 1;
    if groups != params.len() {
        return Err(ConfigError::ParamGroupMismatch { path: path.to_owned(), params: params.len(), groups });
    }

    Ok(CompiledPattern { regex, params })
}

/// Splits a path into literal runs and params.
fn tokenize(path: &str) -> Result<Vec<Token<'_>>, ConfigError> {
    let bytes = path.as_bytes();
    let mut tokens = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            // an escaped char is literal, even when it is `(` or `:`
            b'\\' => i += 2,
            b':' => {
                let name_end = i + 1 + bytes[i + 1..].iter().take_while(|b| is_word(**b)).count();
                if name_end == i + 1 {
                    i += 1;
                    continue;
                }
                let optional = bytes.get(name_end) == Some(&b'?');
                push_literal(&mut tokens, &path[literal_start..i]);
                tokens.push(Token::Param(Placeholder::Named { name: &path[i + 1..name_end], optional }));
                i = if optional { name_end + 1 } else { name_end };
                literal_start = i;
            }
            b'(' => {
                let close = closing_paren(bytes, i)
                    .ok_or_else(|| ConfigError::UnbalancedGroup { path: path.to_owned(), position: i })?;
                if !is_capturing(&bytes[i..]) {
                    i = close + 1;
                    continue;
                }
                let end = if bytes.get(close + 1) == Some(&b'?') { close + 2 } else { close + 1 };
                push_literal(&mut tokens, &path[literal_start..i]);
                tokens.push(Token::Param(Placeholder::Group { source: &path[i..end] }));
                i = end;
                literal_start = i;
            }
            _ => i += 1,
        }
    }
    push_literal(&mut tokens, &path[literal_start.min(path.len())..]);

    Ok(tokens)
}

fn push_literal<'p>(tokens: &mut Vec<Token<'p>>, text: &'p str) {
    if !text.is_empty() {
        tokens.push(Token::Literal(text));
    }
}

/// Finds the `)` closing the group opened at `open`, honouring nesting, escapes and classes.
fn closing_paren(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_class = false;
    let mut i = open;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'[' if !in_class => in_class = true,
            b']' if in_class => in_class = false,
            b'(' if !in_class => depth += 1,
            b')' if !in_class => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Whether the group starting at `group[0]` captures: plain `(...)` and named groups do,
/// `(?:...)` and flag groups such as `(?i)` don't.
fn is_capturing(group: &[u8]) -> bool {
    match group.get(1..) {
        Some([b'?', b'P', b'<', ..]) => true,
        Some([b'?', b'<', b'=' | b'!', ..]) => false,
        Some([b'?', b'<', ..]) => true,
        Some([b'?', ..]) => false,
        _ => true,
    }
}

#[inline]
fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::{Placeholder, Token, compile, tokenize};
    use crate::error::ConfigError;
    use std::collections::HashMap;

    fn no_assertions() -> HashMap<String, String> {
        HashMap::new()
    }

    fn captures(path: &str, request_path: &str) -> Option<Vec<(String, String)>> {
        let compiled = compile(path, &no_assertions(), false).unwrap();
        let caps = compiled.regex().captures(request_path)?;
        Some(
            compiled
                .params()
                .iter()
                .zip(caps.iter().skip(1))
                .filter_map(|(name, value)| value.map(|v| (name.clone(), v.as_str().to_owned())))
                .collect(),
        )
    }

    #[test]
    fn tokenize_mixed_path() {
        let tokens = tokenize("/a/:id?/(\\d+)/b").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Literal("/a/"),
                Token::Param(Placeholder::Named { name: "id", optional: true }),
                Token::Literal("/"),
                Token::Param(Placeholder::Group { source: "(\\d+)" }),
                Token::Literal("/b"),
            ]
        );
    }

    #[test]
    fn tokenize_keeps_lone_colon_and_escapes_literal() {
        let tokens = tokenize("/time/12:/\\(x\\)").unwrap();
        assert_eq!(tokens, vec![Token::Literal("/time/12:/\\(x\\)")]);
    }

    #[test]
    fn static_path_matches_itself_with_optional_trailing_slash() {
        for path in ["/", "/about", "/docs/intro", "/docs/intro/"] {
            let compiled = compile(path, &no_assertions(), false).unwrap();
            let regex = compiled.regex();
            let bare = path.trim_end_matches('/');

            assert!(regex.is_match(path), "{path} should match itself");
            if !bare.is_empty() {
                assert!(regex.is_match(bare), "{path} should match without a trailing slash");
            }
            assert!(regex.is_match(&format!("{bare}/")), "{path} should match with a trailing slash");
            assert!(!regex.is_match(&format!("{bare}/extra")), "{path} should not match a longer path");
            assert!(!regex.is_match(&format!("{bare}//")), "{path} should not match a double slash");
            assert!(compiled.params().is_empty());
        }
    }

    #[test]
    fn named_params_capture_in_order() {
        let compiled = compile("/catalog/:category/:productId", &no_assertions(), false).unwrap();
        assert_eq!(compiled.params(), ["category", "productId"]);
        assert_eq!(compiled.regex().as_str(), "^/catalog/(\\w+)/(\\w+)/?$");

        assert_eq!(
            captures("/catalog/:category/:productId", "/catalog/books/42"),
            Some(vec![("category".into(), "books".into()), ("productId".into(), "42".into())])
        );
    }

    #[test]
    fn optional_param_may_be_absent() {
        let compiled = compile("/item/:id?", &no_assertions(), false).unwrap();
        assert_eq!(compiled.regex().as_str(), "^/item/?(\\w+)?/?$");

        assert!(compiled.regex().is_match("/item"));
        assert!(compiled.regex().is_match("/item/"));
        assert!(compiled.regex().is_match("/item/7"));
        assert_eq!(captures("/item/:id?", "/item"), Some(vec![]));
        assert_eq!(captures("/item/:id?", "/item/7"), Some(vec![("id".into(), "7".into())]));
    }

    #[test]
    fn assertion_overrides_default_pattern() {
        let mut assertions = HashMap::new();
        assertions.insert("id".to_owned(), "(\\d+)".to_owned());

        let compiled = compile("/item/:id", &assertions, false).unwrap();
        assert!(compiled.regex().is_match("/item/123"));
        assert!(!compiled.regex().is_match("/item/abc"));
    }

    #[test]
    fn optional_assertion_is_wrapped() {
        let mut assertions = HashMap::new();
        assertions.insert("page".to_owned(), "(\\d+)".to_owned());

        let compiled = compile("/list/:page?", &assertions, false).unwrap();
        assert_eq!(compiled.regex().as_str(), "^/list/?(\\d+)?/?$");
        assert!(compiled.regex().is_match("/list"));
        assert!(!compiled.regex().is_match("/list/abc"));
    }

    #[test]
    fn raw_groups_get_positional_names() {
        let compiled = compile("/archive/(\\d{4})/(\\d{2})", &no_assertions(), false).unwrap();
        assert_eq!(compiled.params(), ["0", "1"]);
        assert_eq!(
            captures("/archive/(\\d{4})/(\\d{2})", "/archive/2015/06"),
            Some(vec![("0".into(), "2015".into()), ("1".into(), "06".into())])
        );

        let mixed = compile("/:section/(\\d+)", &no_assertions(), false).unwrap();
        assert_eq!(mixed.params(), ["section", "1"]);
    }

    #[test]
    fn optional_raw_group_is_passed_through() {
        let compiled = compile("/feed(\\.xml)?", &no_assertions(), false).unwrap();
        assert_eq!(compiled.regex().as_str(), "^/feed(\\.xml)?/?$");
        assert!(compiled.regex().is_match("/feed"));
        assert!(compiled.regex().is_match("/feed.xml"));
    }

    #[test]
    fn passthrough_is_not_end_anchored() {
        let compiled = compile("/admin", &no_assertions(), true).unwrap();
        assert_eq!(compiled.regex().as_str(), "^/admin/?");
        assert!(compiled.regex().is_match("/admin/users/1"));
        assert!(!compiled.regex().is_match("/public"));

        let root = compile("/", &no_assertions(), true).unwrap();
        assert!(root.regex().is_match("/anything/at/all"));
    }

    #[test]
    fn invalid_raw_group_fails_at_compile_time() {
        assert!(matches!(
            compile("/bad/(*a)", &no_assertions(), false),
            Err(ConfigError::InvalidPattern { .. })
        ));
        assert!(matches!(
            compile("/bad/(\\d+", &no_assertions(), false),
            Err(ConfigError::UnbalancedGroup { position: 5, .. })
        ));
    }

    #[test]
    fn non_capturing_groups_stay_literal() {
        let tokens = tokenize("/(?:en|fr)/about").unwrap();
        assert_eq!(tokens, vec![Token::Literal("/(?:en|fr)/about")]);

        let feed = compile("/feed(?:\\.xml)?", &no_assertions(), false).unwrap();
        assert!(feed.params().is_empty());
        assert!(feed.regex().is_match("/feed"));
        assert!(feed.regex().is_match("/feed.xml"));

        let localized = compile("/(?:en|fr)/about/:section", &no_assertions(), false).unwrap();
        assert_eq!(localized.params(), ["section"]);
        assert_eq!(captures("/(?:en|fr)/about/:section", "/fr/about/team"), Some(vec![("section".into(), "team".into())]));
        assert!(!localized.regex().is_match("/de/about/team"));

        let insensitive = compile("/(?i)about", &no_assertions(), false).unwrap();
        assert!(insensitive.regex().is_match("/ABOUT"));
    }

    #[test]
    fn named_groups_are_params() {
        let compiled = compile("/year/(?P<year>\\d{4})", &no_assertions(), false).unwrap();
        assert_eq!(compiled.params(), ["0"]);
        assert_eq!(captures("/year/(?P<year>\\d{4})", "/year/2015"), Some(vec![("0".into(), "2015".into())]));
    }

    #[test]
    fn nested_capture_groups_are_rejected() {
        assert!(matches!(
            compile("/x/((a)|b)", &no_assertions(), false),
            Err(ConfigError::ParamGroupMismatch { params: 1, groups: 2, .. })
        ));
        compile("/x/((?:a)|b)", &no_assertions(), false).unwrap();
    }
}
