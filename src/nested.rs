//! Discovery of anonymous `struct { … } member;` blocks inside a span of
//! text. This is what resolves multi-section layouts: config sections and
//! scene-object union variants.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::console;
use crate::decl::Field;
use crate::extract;

/// Member name → parsed fields, keyed in first-seen order. The order drives
/// generated output ordering.
pub type SectionMap = IndexMap<String, Vec<Field>>;

static STRUCT_HEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"struct\s*\{").unwrap());
static MEMBER_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\w+)\s*;").unwrap());

/// Find every anonymous-struct-typed member in `span`.
///
/// Matches are independent of each other; nesting deeper than one level is
/// not explored; call again on a section's raw text when that is needed.
/// On a duplicate member name the last occurrence wins (with a warning),
/// while the key keeps its first-seen position.
pub fn parse_nested_structs(span: &str) -> SectionMap {
    let mut sections = SectionMap::new();
    let mut at = 0usize;
    while let Some(head) = STRUCT_HEAD.find_at(span, at) {
        let open = head.end() - 1;
        let Some(close) = extract::matching_brace(span, open) else {
            break;
        };
        at = close + 1;
        let Some(caps) = MEMBER_NAME.captures(&span[close + 1..]) else {
            continue;
        };
        let name = caps[1].to_string();
        let fields = extract::parse_body_fields(&span[open + 1..close]);
        if sections.insert(name.clone(), fields).is_some() {
            console::warn(format!(
                "Duplicate nested struct member '{name}', keeping the last definition"
            ));
        }
    }
    sections
}

// ------------------------------- Tests ------------------------------------ //
