// src/statement/compose.rs

//! Composite statement assembly
//!
//! The composite document holds one `<statement>` block per converted
//! language and a single `<examples>` block. Converted HTML must land in
//! the output unescaped, so the skeleton is serialized with positional
//! placeholders and fragments are substituted afterwards; example texts are
//! data, not markup, and are escaped. Assembly finishes with math-entity
//! normalization over the whole document.

use crate::error::Result;
use crate::statement::template::{PlaceholderTemplate, PLACEHOLDER};
use crate::statement::StatementDocument;
use quick_xml::escape::escape;
use std::fmt::Write;

/// Assemble converted statement documents into the composite markup
///
/// Slots are declared in fixed order (description, input format, output
/// format, notes) per language; examples come from the first document that
/// has any. The placeholder count is checked against the fragment list
/// before anything is returned.
pub fn compose_statements(documents: &[StatementDocument]) -> Result<String> {
    let mut skeleton = String::from("<problem>");
    let mut fragments: Vec<String> = Vec::new();

    for doc in documents {
        write!(skeleton, "<statement language=\"{}\">", doc.language.tag())
            .expect("write to String");
        let slots = [
            ("description", &doc.description),
            ("input_format", &doc.input_format),
            ("output_format", &doc.output_format),
            ("notes", &doc.notes),
        ];
        for (tag, slot) in slots {
            if let Some(html) = slot {
                write!(skeleton, "<{tag}>{PLACEHOLDER}</{tag}>").expect("write to String");
                fragments.push(html.clone());
            }
        }
        skeleton.push_str("</statement>");
    }

    if let Some(doc) = documents.iter().find(|d| !d.examples.is_empty()) {
        skeleton.push_str("<examples>");
        for example in &doc.examples {
            skeleton.push_str("<example>");
            write!(skeleton, "<input>{PLACEHOLDER}</input>").expect("write to String");
            fragments.push(escape(&example.input).into_owned());
            if let Some(output) = &example.output {
                write!(skeleton, "<output>{PLACEHOLDER}</output>").expect("write to String");
                fragments.push(escape(output).into_owned());
            }
            skeleton.push_str("</example>");
        }
        skeleton.push_str("</examples>");
    }

    skeleton.push_str("</problem>");

    let composed = PlaceholderTemplate::new(skeleton).substitute(&fragments)?;
    Ok(normalize_math_entities(&composed))
}

/// Normalize comparison entities inside math spans
///
/// Inside `\(..\)` / `\[..\]` spans the converter's `&lt;`/`&gt;` (and
/// doubly escaped `&amp;lt;`/`&amp;gt;`) become the `\lt`/`\gt` macros the
/// statement renderer understands; `\textless`/`\textgreater` are replaced
/// everywhere.
pub fn normalize_math_entities(text: &str) -> String {
    const MATH_ONLY: [(&str, &str); 4] = [
        ("&amp;lt;", "\\lt"),
        ("&amp;gt;", "\\gt"),
        ("&lt;", "\\lt"),
        ("&gt;", "\\gt"),
    ];
    const ANYWHERE: [(&str, &str); 2] = [("\\textless", "\\lt"), ("\\textgreater", "\\gt")];

    let mut out = String::with_capacity(text.len());
    let mut in_math = false;
    let mut i = 0;
    'scan: while i < text.len() {
        let rest = &text[i..];

        if rest.starts_with("\\(") || rest.starts_with("\\[") {
            in_math = true;
            out.push_str(&rest[..2]);
            i += 2;
            continue;
        }
        if rest.starts_with("\\)") || rest.starts_with("\\]") {
            in_math = false;
            out.push_str(&rest[..2]);
            i += 2;
            continue;
        }

        for (pattern, replacement) in ANYWHERE {
            if rest.starts_with(pattern) {
                out.push_str(replacement);
                i += pattern.len();
                continue 'scan;
            }
        }
        if in_math {
            for (pattern, replacement) in MATH_ONLY {
                if rest.starts_with(pattern) {
                    out.push_str(replacement);
                    i += pattern.len();
                    continue 'scan;
                }
            }
        }

        let ch = rest.chars().next().expect("non-empty remainder");
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}
