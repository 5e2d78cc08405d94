//! Path-spec compilation.
//!
//! A path spec is a literal path with optional capture groups:
//!
//! ```text
//! /users/(id:[0-9]+)/posts/(post:[0-9]+)
//! ```
//!
//! A group written `(name:regex)` captures the matched substring under
//! `name`; a group without the `name:` prefix still consumes matching input
//! but extracts nothing. Compilation turns a spec into a single anchored
//! full-path matcher whose named groups double as the extractors: the value
//! for each variable is read out of the match the route itself produced, so
//! literal text and accumulated sub-router prefixes can never bleed into a
//! capture. Everything here is a pure function — no process-wide state,
//! every artifact owned by the route that asked for it.
//!
//! Anchoring is decided by the spec's shape:
//!
//! - a leaf spec anchors both ends (`^…$`) — exact match;
//! - a spec ending in `/` (other than the bare root `/`) is a delegation
//!   boundary and anchors at the start only, with the trailing separator
//!   relaxed to `(?:/|$)` so `/api` and `/api/...` both cross the boundary
//!   while `/apiwidgets` does not.

use std::fmt;

use regex::Regex;

use crate::request::Params;

// ── Compiled artifacts ────────────────────────────────────────────────────────

/// Everything the route table needs for one spec.
pub(crate) struct Compiled {
    /// Stable identity for route deduplication: prefix + name-stripped spec.
    /// Two registrations with equal keys land on the same route.
    pub(crate) key: String,
    /// Anchored matcher over the full request path. Named groups carry the
    /// variable captures.
    pub(crate) pattern: Regex,
    /// Variable names in left-to-right spec order.
    pub(crate) vars: Vec<String>,
}

/// A path spec that could not be compiled. Surfaces at registration time,
/// never at request time.
#[derive(Debug)]
pub(crate) struct PatternError {
    spec: String,
    detail: String,
}

impl PatternError {
    fn new(spec: &str, detail: impl Into<String>) -> Self {
        Self { spec: spec.to_owned(), detail: detail.into() }
    }
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "path spec `{}`: {}", self.spec, self.detail)
    }
}

impl std::error::Error for PatternError {}

// ── Spec parsing ──────────────────────────────────────────────────────────────

enum Segment {
    Literal(String),
    Group { name: Option<String>, regex: String },
}

/// Splits a spec into literal text and capture groups.
///
/// Parentheses delimit groups; inside a group, nesting and `\(`-style escapes
/// are tracked so regex fragments may themselves contain groups. The text up
/// to the first `:` names the group when it is a plain identifier; otherwise
/// the whole content is treated as an anonymous regex fragment.
fn parse(spec: &str) -> Result<Vec<Segment>, PatternError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = spec.chars();

    while let Some(c) = chars.next() {
        if c != '(' {
            literal.push(c);
            continue;
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }

        // Consume up to the matching close paren.
        let mut content = String::new();
        let mut depth = 1usize;
        let mut escaped = false;
        loop {
            let Some(c) = chars.next() else {
                return Err(PatternError::new(spec, "unclosed capture group"));
            };
            if escaped {
                escaped = false;
            } else {
                match c {
                    '\\' => escaped = true,
                    '('  => depth += 1,
                    ')'  => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
            }
            content.push(c);
        }

        segments.push(split_group(content));
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    Ok(segments)
}

/// Decides whether a group body is `name:regex` or a bare regex fragment.
fn split_group(content: String) -> Segment {
    if let Some((name, regex)) = content.split_once(':') {
        if is_identifier(name) {
            return Segment::Group {
                name: Some(name.to_owned()),
                regex: regex.to_owned(),
            };
        }
    }
    Segment::Group { name: None, regex: content }
}

/// Valid variable names are also valid regex group names, so a named spec
/// group can be emitted directly as `(?P<name>…)`.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn render_normalized(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Group { regex, .. } => {
                out.push('(');
                out.push_str(regex);
                out.push(')');
            }
        }
    }
    out
}

// ── Public (crate) compilation API ────────────────────────────────────────────

/// Strips capture-group names from a spec: `/u/(id:[0-9]+)` → `/u/([0-9]+)`.
///
/// The result is what delegation prefixes and dedup keys are built from — a
/// prefix only has to *match*, so it keeps the value patterns but drops the
/// extraction names.
pub(crate) fn normalize(spec: &str) -> Result<String, PatternError> {
    Ok(render_normalized(&parse(spec)?))
}

/// Compiles `spec` under `prefix` into its matcher, extractors and dedup key.
///
/// Named groups become `(?P<name>…)` in the assembled matcher; anonymous
/// groups stay `(…)`. The matcher is compiled here, so an invalid fragment
/// fails the registration that introduced it instead of a request months
/// later.
pub(crate) fn compile(prefix: &str, spec: &str) -> Result<Compiled, PatternError> {
    let segments = parse(spec)?;

    let mut vars: Vec<String> = Vec::new();
    let mut matcher = String::new();
    for segment in &segments {
        match segment {
            Segment::Literal(text) => matcher.push_str(text),
            Segment::Group { name: Some(name), regex } => {
                if vars.iter().any(|v| v == name) {
                    return Err(PatternError::new(spec, format!("duplicate variable `{name}`")));
                }
                vars.push(name.clone());
                matcher.push_str("(?P<");
                matcher.push_str(name);
                matcher.push('>');
                matcher.push_str(regex);
                matcher.push(')');
            }
            Segment::Group { name: None, regex } => {
                matcher.push('(');
                matcher.push_str(regex);
                matcher.push(')');
            }
        }
    }

    let normalized = render_normalized(&segments);
    let key = format!("{prefix}{normalized}");

    // Delegation boundary: trailing separator, except the bare root spec.
    // The matcher ends in the same literal separator the normalized form does.
    let anchored = if normalized.len() > 1 && normalized.ends_with('/') {
        format!("^{prefix}{}(?:/|$)", &matcher[..matcher.len() - 1])
    } else {
        format!("^{prefix}{matcher}$")
    };
    let pattern = Regex::new(&anchored)
        .map_err(|e| PatternError::new(spec, e.to_string()))?;

    Ok(Compiled { key, pattern, vars })
}

// ── Variable extraction ───────────────────────────────────────────────────────

/// Builds the per-request variable mapping for a matched route.
///
/// Capture positions come from the route's own anchored pattern, so each
/// variable holds exactly the substring its group matched — never a
/// lookalike from a literal segment or the sub-router prefix. Returns
/// `None` when the pattern does not match or a declared group did not
/// participate in the match (a group the surrounding spec made optional);
/// the caller must treat that as a contract violation, never as an empty
/// capture.
pub(crate) fn extract(pattern: &Regex, vars: &[String], path: &str) -> Option<Params> {
    let caps = pattern.captures(path)?;
    let mut params = Params::new();
    for name in vars {
        let found = caps.name(name)?;
        params.push(name.clone(), found.as_str().to_owned());
    }
    Some(params)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_names() {
        assert_eq!(normalize("/test/(id:[0-9]+)").unwrap(), "/test/([0-9]+)");
        assert_eq!(
            normalize("/a/(x:[a-z]+)/b/(y:[0-9]+)").unwrap(),
            "/a/([a-z]+)/b/([0-9]+)"
        );
        // Anonymous groups pass through unchanged.
        assert_eq!(normalize("/v/([0-9]+)").unwrap(), "/v/([0-9]+)");
        assert_eq!(normalize("/plain").unwrap(), "/plain");
    }

    #[test]
    fn leaf_spec_anchors_both_ends() {
        let c = compile("", "/test/(id:[0-9]+)").unwrap();
        assert!(c.pattern.is_match("/test/42"));
        assert!(!c.pattern.is_match("/test/42/more"));
        assert!(!c.pattern.is_match("/prefix/test/42"));
    }

    #[test]
    fn delegation_spec_requires_separator_boundary() {
        let c = compile("", "/api/").unwrap();
        assert!(c.pattern.is_match("/api"));
        assert!(c.pattern.is_match("/api/"));
        assert!(c.pattern.is_match("/api/widgets/7"));
        assert!(!c.pattern.is_match("/apiwidgets"));
    }

    #[test]
    fn root_spec_is_a_leaf() {
        let c = compile("", "/").unwrap();
        assert!(c.pattern.is_match("/"));
        assert!(!c.pattern.is_match("/anything"));

        // Root under a sub-router prefix matches the literal prefix path.
        let c = compile("/sub", "/").unwrap();
        assert!(c.pattern.is_match("/sub/"));
        assert!(!c.pattern.is_match("/sub/x"));
    }

    #[test]
    fn vars_keep_spec_order_and_skip_anonymous_groups() {
        let c = compile("", "/([a-z]+)/x/(id:[0-9]+)/y/(id2:[0-9]+)").unwrap();
        assert_eq!(c.vars, ["id", "id2"]);
    }

    #[test]
    fn nested_parens_stay_inside_one_group() {
        let c = compile("", "/tags/(slug:[a-z]+(?:-[a-z]+)*)").unwrap();
        assert_eq!(c.vars.len(), 1);
        assert!(c.pattern.is_match("/tags/one-two-three"));
        assert!(!c.pattern.is_match("/tags/one-"));
    }

    #[test]
    fn key_is_prefix_plus_normalized_spec() {
        let a = compile("/api", "/x/(id:[0-9]+)").unwrap();
        let b = compile("/api", "/x/(id2:[0-9]+)").unwrap();
        // Different names, same value pattern: same identity.
        assert_eq!(a.key, b.key);
        let c = compile("", "/x/(id:[0-9]+)").unwrap();
        assert_ne!(a.key, c.key);
    }

    #[test]
    fn invalid_fragments_fail_at_compile_time() {
        assert!(compile("", "/bad/(id:[0-9+)").is_err());
        assert!(compile("", "/unclosed/(id:[0-9]+").is_err());
        assert!(compile("", "/dup/(id:[0-9]+)/(id:[a-z]+)").is_err());
    }

    #[test]
    fn extraction_reads_the_groups_in_spec_order() {
        let c = compile("", "/test/(id:[0-9]+)/test/(id2:[0-9]+)").unwrap();

        let params = extract(&c.pattern, &c.vars, "/test/1/test/2").unwrap();
        assert_eq!(params.get("id"), Some("1"));
        assert_eq!(params.get("id2"), Some("2"));

        // Each variable holds its own group's match: no cross-contamination.
        let params = extract(&c.pattern, &c.vars, "/test/12/test/3").unwrap();
        assert_eq!(params.get("id"), Some("12"));
        assert_eq!(params.get("id2"), Some("3"));
        let order: Vec<_> = params.iter().collect();
        assert_eq!(order, [("id", "12"), ("id2", "3")]);
    }

    #[test]
    fn captures_never_come_from_prefix_or_literal_text() {
        // The accumulated sub-router prefix contains a digit that the value
        // pattern would match.
        let c = compile("/api/v1", "/items/(id:[0-9]+)").unwrap();
        let params = extract(&c.pattern, &c.vars, "/api/v1/items/7").unwrap();
        assert_eq!(params.get("id"), Some("7"));

        // So does a literal segment of the spec itself.
        let c = compile("", "/v2/reports/(year:[0-9]+)").unwrap();
        let params = extract(&c.pattern, &c.vars, "/v2/reports/2024").unwrap();
        assert_eq!(params.get("year"), Some("2024"));
    }

    #[test]
    fn extraction_fails_closed_on_an_unmatched_path() {
        let c = compile("", "/x/(id:[0-9]+)").unwrap();
        assert!(extract(&c.pattern, &c.vars, "/x/letters").is_none());
    }

    #[test]
    fn extraction_fails_closed_when_a_group_sits_out_the_match() {
        // The `?` after the group lands in the assembled matcher and makes
        // the whole group optional, so the path can match with no capture.
        let c = compile("", "/opt/(id:[0-9]+)?").unwrap();
        assert!(c.pattern.is_match("/opt/"));
        assert!(extract(&c.pattern, &c.vars, "/opt/").is_none());
        assert_eq!(
            extract(&c.pattern, &c.vars, "/opt/5").unwrap().get("id"),
            Some("5"),
        );
    }
}
