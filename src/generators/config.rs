//! INI save/load functions generated from the `ConfigData` sections.
//!
//! Every anonymous `struct { … } Section;` member of `ConfigData` becomes an
//! `[Section]` block: one snprintf format string for saving and an
//! `SDL_strncmp` key chain per section for loading.

use std::path::Path;

use anyhow::{Result, bail};

use crate::console;
use crate::decl::Field;
use crate::emit;
use crate::extract;
use crate::nested::{self, SectionMap};

fn format_specifier(field: &Field) -> &'static str {
    let ty = field.base_type.as_str();
    if ty.contains("float") {
        "%f"
    } else if ty.contains("double") {
        "%lf"
    } else if ty == "bool" {
        "%d"
    } else if ty.starts_with("uint") || ty == "unsigned" {
        "%u"
    } else if ty.starts_with("int") {
        "%d"
    } else if ty.contains("char") && field.is_pointer {
        "%s"
    } else {
        "%d"
    }
}

fn parse_call(field: &Field) -> &'static str {
    let ty = field.base_type.as_str();
    if ty.contains("float") || ty.contains("double") {
        "SDL_atof"
    } else {
        "SDL_atoi"
    }
}

fn render(sections: &SectionMap) -> String {
    // save: one format string with [Section] headers and key=value lines
    let mut format_parts: Vec<String> = Vec::new();
    let mut args: Vec<String> = Vec::new();
    for (section, fields) in sections {
        format_parts.push(format!("[{section}]"));
        for field in fields {
            format_parts.push(format!("{}={}", field.name, format_specifier(field)));
            args.push(format!("config->{section}.{}", field.name));
        }
        format_parts.push(String::new());
    }
    if format_parts.last().is_some_and(|part| part.is_empty()) {
        format_parts.pop();
    }
    let format_string = format!("{}\\n", format_parts.join("\\n"));
    let args_string = args.join(",\n                 ");

    // load: section-tracking line loop
    let mut parse: Vec<String> = vec![
        "    char* line = data;".into(),
        "    char current_section[64] = {0};".into(),
        "    ".into(),
        "    while (*line) {".into(),
        "        // Skip whitespace".into(),
        "        while (*line == ' ' || *line == '\\t') line++;".into(),
        "        ".into(),
        "        // Check for section header".into(),
        "        if (*line == '[') {".into(),
        "            char* section_end = SDL_strchr(line, ']');".into(),
        "            if (section_end) {".into(),
        "                size_t len = section_end - line - 1;".into(),
        "                if (len < sizeof(current_section) - 1) {".into(),
        "                    SDL_strlcpy(current_section, line + 1, len + 1);".into(),
        "                }".into(),
        "                line = section_end + 1;".into(),
        "            }".into(),
        "        } else {".into(),
        "            // Parse key=value pairs".into(),
    ];
    for (section, fields) in sections {
        parse.push(format!(
            "            if (SDL_strcmp(current_section, \"{section}\") == 0) {{"
        ));
        for (idx, field) in fields.iter().enumerate() {
            let key_len = field.name.len() + 1; // +1 for '='
            let keyword = if idx == 0 { "if" } else { "} else if" };
            parse.push(format!(
                "                {keyword} (SDL_strncmp(line, \"{}=\", {key_len}) == 0) {{",
                field.name
            ));
            parse.push(format!(
                "                    config->{section}.{} = {}(line + {key_len});",
                field.name,
                parse_call(field)
            ));
        }
        if !fields.is_empty() {
            parse.push("                }".into());
        }
        parse.push("            }".into());
    }
    parse.extend([
        "            ".into(),
        "            // Skip to next line".into(),
        "            while (*line && *line != '\\n') line++;".into(),
        "        }".into(),
        "        ".into(),
        "        if (*line == '\\n') line++;".into(),
        "    }".into(),
    ]);
    let parse_logic = parse.join("\n");

    format!(
        "#pragma once\n\
         #include <SDL3/SDL.h>\n\
         \n\
         /* Inline function to generate the config string with sections */\n\
         static inline void Generated_SaveConfigToString(ConfigData* config, char* buffer, size_t buffer_size) {{\n\
         \x20   SDL_snprintf(buffer, buffer_size, \n\
         \x20                \"{format_string}\", \n\
         \x20                {args_string});\n\
         }}\n\
         \n\
         /* Inline function to parse config from string data with sections */\n\
         static inline void Generated_LoadConfigFromString(ConfigData* config, char* data) {{\n\
         {parse_logic}\n\
         }}\n"
    )
}

pub fn generate(input: &Path, output: &Path, force: bool) -> Result<bool> {
    let content = emit::read_source(input)?;
    let span = extract::find_struct_span(&content, "ConfigData")
        .map_err(|err| anyhow::anyhow!("{err} in {}", input.display()))?;

    let sections: SectionMap = nested::parse_nested_structs(&span.body)
        .into_iter()
        .filter(|(_, fields)| !fields.is_empty())
        .collect();
    if sections.is_empty() {
        console::warn("No config sections found");
        bail!("no nested config sections in {}", input.display());
    }

    console::info(format!("Found {} sections:", sections.len()));
    for (name, fields) in &sections {
        let field_names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        console::info(format!("  [{name}]: {field_names:?}"));
    }

    let code = render(&sections);
    let header = emit::make_header(Some("metagen config"), "GENERATED CONFIG FUNCTIONS");
    emit::write_if_changed(output, &format!("{header}{code}"), force)
}

// ------------------------------- Tests ------------------------------------ //
