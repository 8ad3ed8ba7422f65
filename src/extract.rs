//! Locating struct bodies inside raw source text.
//!
//! Pattern heads are found with regexes, but the body span itself always
//! comes from an explicit brace-depth scan, so a struct containing nested
//! anonymous structs yields its full interior instead of truncating at the
//! first `}`.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::decl::{self, Field};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("struct '{name}' not found")]
    StructNotFound { name: String },
}

/// A located struct body: the brace-delimited interior (comments intact)
/// plus the name it was matched under. For the `static struct { … } member;`
/// fallback this is the member name the struct is bound to.
#[derive(Debug, Clone)]
pub struct StructSpan {
    pub name: String,
    pub body: String,
}

static TYPEDEF_HEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"typedef\s+struct\s*\{").unwrap());
static STATIC_HEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"static\s+struct\s*\{").unwrap());
static TRAILING_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\w+)\s*;").unwrap());
static TRAILING_SEMI: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*;").unwrap());
static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)//.*$").unwrap());
static BLOCK_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

/// Index of the `}` matching the `{` at `open`. `None` when `open` is not a
/// brace or the braces never balance.
pub(crate) fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Locate a struct body by name. Three shapes are tried in order:
///
/// 1. `typedef struct { … } Name;`
/// 2. `struct Name { … };`
/// 3. `static struct { … } member;`, preferring a member bound exactly to
///    `name`, else the first such struct in the file. The first-match
///    fallback is inherently ambiguous when a file holds several static
///    anonymous structs; the returned span carries the member name that was
///    actually bound so callers can detect a mismatch.
pub fn find_struct_span(content: &str, name: &str) -> Result<StructSpan, ExtractError> {
    if let Some(span) = match_typedef(content, name) {
        return Ok(span);
    }
    if let Some(span) = match_named(content, name) {
        return Ok(span);
    }
    if let Some(span) = match_static_anon(content, name) {
        return Ok(span);
    }
    Err(ExtractError::StructNotFound {
        name: name.to_string(),
    })
}

fn match_typedef(content: &str, name: &str) -> Option<StructSpan> {
    for head in TYPEDEF_HEAD.find_iter(content) {
        let open = head.end() - 1;
        let Some(close) = matching_brace(content, open) else {
            continue;
        };
        let Some(caps) = TRAILING_NAME.captures(&content[close + 1..]) else {
            continue;
        };
        if &caps[1] == name {
            return Some(StructSpan {
                name: name.to_string(),
                body: content[open + 1..close].to_string(),
            });
        }
    }
    None
}

fn match_named(content: &str, name: &str) -> Option<StructSpan> {
    let head = Regex::new(&format!(r"struct\s+{}\s*\{{", regex::escape(name)))
        .expect("struct head pattern");
    let m = head.find(content)?;
    let open = m.end() - 1;
    let close = matching_brace(content, open)?;
    if !TRAILING_SEMI.is_match(&content[close + 1..]) {
        return None;
    }
    Some(StructSpan {
        name: name.to_string(),
        body: content[open + 1..close].to_string(),
    })
}

fn match_static_anon(content: &str, name: &str) -> Option<StructSpan> {
    let mut first = None;
    for head in STATIC_HEAD.find_iter(content) {
        let open = head.end() - 1;
        let Some(close) = matching_brace(content, open) else {
            continue;
        };
        let Some(caps) = TRAILING_NAME.captures(&content[close + 1..]) else {
            continue;
        };
        let span = StructSpan {
            name: caps[1].to_string(),
            body: content[open + 1..close].to_string(),
        };
        if span.name == name {
            return Some(span);
        }
        if first.is_none() {
            first = Some(span);
        }
    }
    first
}

/// Remove `//` line comments and (possibly multi-line) `/* */` block
/// comments.
pub fn strip_comments(body: &str) -> String {
    let no_blocks = BLOCK_COMMENT.replace_all(body, "");
    LINE_COMMENT.replace_all(&no_blocks, "").into_owned()
}

/// Split a comment-stripped body into candidate declaration lines, dropping
/// blanks and preprocessor directives.
pub fn declaration_lines(body: &str) -> impl Iterator<Item = &str> {
    body.split(';')
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Comment-strip a struct body and run every declaration line through the
/// field parser, preserving declaration order.
pub fn parse_body_fields(body: &str) -> Vec<Field> {
    let clean = strip_comments(body);
    declaration_lines(&clean)
        .flat_map(decl::parse_declaration_line)
        .collect()
}

/// Extract the declared fields of a named struct.
pub fn parse_struct_fields(content: &str, name: &str) -> Result<Vec<Field>, ExtractError> {
    let span = find_struct_span(content, name)?;
    Ok(parse_body_fields(&span.body))
}

/// Integer constant lookup, recognising in order:
/// `#define NAME 123`, `static constexpr UINT NAME = 123;`,
/// `const UINT NAME = 123;`.
pub fn find_uint_constant(content: &str, name: &str) -> Option<u64> {
    let name = regex::escape(name);
    let patterns = [
        format!(r"#define\s+{name}\s+(\d+)"),
        format!(r"static\s+constexpr\s+UINT\s+{name}\s*=\s*(\d+)\s*;"),
        format!(r"const\s+UINT\s+{name}\s*=\s*(\d+)\s*;"),
    ];
    for pattern in &patterns {
        let re = Regex::new(pattern).expect("constant pattern");
        if let Some(caps) = re.captures(content) {
            return caps[1].parse().ok();
        }
    }
    None
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typedef_struct_is_found_by_name() {
        let src = "typedef struct {\n    int width, height;\n} WindowConfig;\n";
        let span = find_struct_span(src, "WindowConfig").unwrap();
        assert_eq!(span.name, "WindowConfig");
        assert!(span.body.contains("width"));
    }

    #[test]
    fn typedef_lookup_skips_other_typedefs() {
        let src = "typedef struct { int a; } First;\ntypedef struct { int b; } Second;\n";
        let span = find_struct_span(src, "Second").unwrap();
        assert!(span.body.contains('b'));
        assert!(!span.body.contains('a'));
    }

    #[test]
    fn nested_anonymous_struct_does_not_truncate_the_outer_span() {
        let src = "typedef struct { struct { int x; } inner; int y; } Outer;";
        let span = find_struct_span(src, "Outer").unwrap();
        assert!(span.body.contains("inner"));
        assert!(span.body.contains('y'));
    }

    #[test]
    fn named_struct_definition_is_found() {
        let src = "struct Vertex {\n    float pos[3];\n    float uv[2];\n};\n";
        let fields = parse_struct_fields(src, "Vertex").unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "pos");
    }

    #[test]
    fn static_anonymous_struct_prefers_the_matching_member_name() {
        let src = "\
static struct\n{\n    ID3D12Fence *m_fence;\n} sync_state;\n\
static struct\n{\n    ID3D12Device *m_device;\n} pipeline_dx12;\n";
        let span = find_struct_span(src, "pipeline_dx12").unwrap();
        assert_eq!(span.name, "pipeline_dx12");
        assert!(span.body.contains("m_device"));
    }

    #[test]
    fn static_anonymous_fallback_binds_the_first_struct() {
        let src = "static struct { int a; } whatever_name;\n";
        let span = find_struct_span(src, "Settings").unwrap();
        assert_eq!(span.name, "whatever_name");
        assert!(span.body.contains('a'));
    }

    #[test]
    fn missing_struct_is_a_recoverable_error() {
        let err = find_struct_span("int x;", "Nope").unwrap_err();
        assert!(matches!(err, ExtractError::StructNotFound { .. }));
        assert_eq!(err.to_string(), "struct 'Nope' not found");
    }

    #[test]
    fn comments_are_stripped_before_field_parsing() {
        let src = "\
typedef struct {
    int a; // trailing comment
    /* block
       spanning lines */
    float b;
} Commented;";
        let fields = parse_struct_fields(src, "Commented").unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn preprocessor_lines_never_reach_the_field_parser() {
        let clean = strip_comments("#ifdef X\nint a;\nint b;");
        let lines: Vec<&str> = declaration_lines(&clean).collect();
        assert_eq!(lines, ["int b"]);
    }

    #[test]
    fn uint_constants_are_found_in_all_three_spellings() {
        let src = "\
#define g_FrameCount 2
static constexpr UINT MAX_SKY_TEXTURES = 3;
const UINT MAX_LOADED_MODELS = 8;
";
        assert_eq!(find_uint_constant(src, "g_FrameCount"), Some(2));
        assert_eq!(find_uint_constant(src, "MAX_SKY_TEXTURES"), Some(3));
        assert_eq!(find_uint_constant(src, "MAX_LOADED_MODELS"), Some(8));
        assert_eq!(find_uint_constant(src, "MISSING"), None);
    }

    #[test]
    fn declaration_order_is_preserved() {
        let src = "typedef struct { int z; int a; int m; } Ordered;";
        let fields = parse_struct_fields(src, "Ordered").unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["z", "a", "m"]);
    }
}
