//! Path normalization shared by catalog inversion and URL lookup.

use url::Url;

const BASE_URL: &str = "https://example.org/";
const PARAMETER: &str = "{id}";

/// Normalize a catalog path key. Always lower-cases; lenient mode also
/// canonicalizes placeholders and OData parenthetical segments.
pub fn normalize_path(path: &str, lenient: bool) -> String {
    if lenient {
        normalize_lenient(path)
    } else {
        path.to_lowercase()
    }
}

/// Lenient normalization:
/// - lower-case, strip `'` and `"`
/// - `name(args)` becomes `name/{id}` (`name` alone when `args` is empty);
///   anything after the closing `)` in that segment is dropped
/// - a segment that starts with `(args)` is dropped
/// - any `{...}` placeholder becomes `{id}`
///
/// Parenthetical groups are consumed before `/` splits segments, so a key
/// such as `('a/b')` stays one parameter. Applying it twice gives the same
/// result as applying it once.
pub fn normalize_lenient(path: &str) -> String {
    let cleaned: String = path
        .to_lowercase()
        .chars()
        .filter(|c| *c != '\'' && *c != '"')
        .collect();

    let mut segments: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut state = SegmentState::Open;
    let mut chars = cleaned.chars();
    while let Some(c) = chars.next() {
        match c {
            '/' => {
                finish_segment(&mut segments, std::mem::take(&mut current), state);
                state = SegmentState::Open;
            }
            '(' => {
                let args: String = chars.by_ref().take_while(|c| *c != ')').collect();
                if state == SegmentState::Open {
                    state = if current.is_empty() {
                        SegmentState::Dropped
                    } else {
                        SegmentState::Keyed {
                            has_args: !args.trim().is_empty(),
                        }
                    };
                }
            }
            _ if state == SegmentState::Open => current.push(c),
            _ => {}
        }
    }
    finish_segment(&mut segments, current, state);
    segments.join("/")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentState {
    Open,
    /// `name(args)` seen; the rest of the segment is ignored
    Keyed { has_args: bool },
    /// segment started with `(`
    Dropped,
}

fn finish_segment(segments: &mut Vec<String>, segment: String, state: SegmentState) {
    match state {
        SegmentState::Dropped => {}
        SegmentState::Open => segments.push(canonical_segment(segment)),
        SegmentState::Keyed { has_args } => {
            segments.push(canonical_segment(segment));
            if has_args {
                segments.push(PARAMETER.to_string());
            }
        }
    }
}

fn canonical_segment(segment: String) -> String {
    if segment.starts_with('{') && segment.ends_with('}') {
        PARAMETER.to_string()
    } else {
        segment
    }
}

/// Split a request URL into decoded, lower-cased path segments.
///
/// Relative URLs are resolved against a fixed base so that absolute URLs and
/// query strings are handled alike. Empty segments are skipped. Returns `None`
/// for URLs that cannot be parsed.
pub fn request_segments(url: &str, lenient: bool) -> Option<Vec<String>> {
    let normalized = normalize_path(url, lenient);
    let base = Url::parse(BASE_URL).ok()?;
    let parsed = base.join(&normalized).ok()?;
    let segments = parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .map(|segment| match urlencoding::decode(segment) {
            Ok(decoded) => decoded.to_lowercase(),
            Err(_) => segment.to_lowercase(),
        })
        .collect();
    Some(segments)
}

/// Split an already normalized catalog path into trie segments.
pub fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}
