//! The field model and the single-declaration parser every generator shares.
//!
//! The grammar is deliberately tiny: comma-joined C declarators with at most
//! one array suffix and C-style pointer stars on either the type or the
//! name. No preprocessor, no templates, no multi-dimensional arrays, no
//! function pointers.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::console;

/// One parsed member of a struct-like declaration.
///
/// `base_type` never contains `*`; `name` is always a bare identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Declared type with pointer/array decoration stripped.
    pub base_type: String,
    pub name: String,
    pub is_array: bool,
    /// `None` for plain fields and for unsized `name[]` arrays.
    pub array_size: Option<String>,
    pub is_pointer: bool,
}

/// `ident[size]` where size is any bracket-free token, possibly empty.
static ARRAY_DECLARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)\[([^\[\]]*)\]$").unwrap());

static PLAIN_DECLARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+$").unwrap());

/// Parse a single C declaration line like:
/// ```c
/// int a;
/// int b, c, d;
/// float* e;
/// ID3D12Resource* ptr[4];
/// ```
/// Returns one `Field` per declarator, in declaration order. A line that
/// cannot be split into type and name yields an empty list and a single
/// warning; the caller is expected to keep going with the remaining lines.
pub fn parse_declaration_line(line: &str) -> Vec<Field> {
    let line = line.trim().trim_end_matches(';').trim();
    if line.is_empty() {
        return Vec::new();
    }

    // The grammar guarantees no commas inside a single declarator, so a
    // plain split is enough.
    let mut chunks = line.split(',');
    let first = chunks.next().unwrap_or("").trim();

    // Last whitespace token is the first declarator, everything before it is
    // the type.
    let tokens: Vec<&str> = first.split_whitespace().collect();
    if tokens.len() < 2 {
        console::warn(format!("Invalid declaration line: {line}"));
        return Vec::new();
    }
    let mut base_type = tokens[..tokens.len() - 1].join(" ");

    // A star attached to the type (`float* e`) marks the first declarator.
    let mut type_pointer = false;
    if base_type.contains('*') {
        type_pointer = true;
        base_type = base_type.replace('*', "").trim().to_string();
    }

    let mut fields = Vec::new();
    if let Some(mut field) = parse_declarator(tokens[tokens.len() - 1], &base_type) {
        field.is_pointer |= type_pointer;
        fields.push(field);
    }

    // Remaining chunks are bare declarators reusing the same base type.
    for chunk in chunks {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }
        if let Some(field) = parse_declarator(chunk, &base_type) {
            fields.push(field);
        }
    }
    fields
}

/// Extract name and array/pointer shape from one declarator. Declarators
/// outside the supported grammar (multi-dimensional arrays, function
/// pointers) are skipped so `Field::name` stays a bare identifier.
fn parse_declarator(raw: &str, base_type: &str) -> Option<Field> {
    let mut var = raw.trim();
    let mut is_pointer = false;
    while let Some(rest) = var.strip_prefix('*') {
        is_pointer = true;
        var = rest.trim_start();
    }

    if PLAIN_DECLARATOR.is_match(var) {
        return Some(Field {
            base_type: base_type.to_string(),
            name: var.to_string(),
            is_array: false,
            array_size: None,
            is_pointer,
        });
    }
    if let Some(caps) = ARRAY_DECLARATOR.captures(var) {
        let size = caps[2].trim();
        return Some(Field {
            base_type: base_type.to_string(),
            name: caps[1].to_string(),
            is_array: true,
            array_size: (!size.is_empty()).then(|| size.to_string()),
            is_pointer,
        });
    }
    console::debug(format!("Skipping unsupported declarator: {raw}"));
    None
}

// ------------------------------- Tests ------------------------------------ //
