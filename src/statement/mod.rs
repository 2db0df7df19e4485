// src/statement/mod.rs

//! Statement conversion: LaTeX fragments into the composite statement
//! document and the flattened legacy blob
//!
//! Each statement language directory holds fixed-name LaTeX fragments and
//! numbered example files. Fragments are preprocessed, converted to HTML by
//! the external converter, postprocessed, and collected into a
//! [`StatementDocument`]; examples are paired by file-name order. The
//! composite document is assembled in `compose` through positional
//! placeholder substitution.

pub mod assets;
pub mod compose;
pub mod sections;
pub mod template;

pub use compose::{compose_statements, normalize_math_entities};
pub use sections::{Fragment, LegacyBlob, StatementLang};
pub use template::PlaceholderTemplate;

use crate::convert::Converter;
use crate::error::{Error, Result};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// One example: input text and, once its `.a` file is seen, output text
#[derive(Debug, Clone, PartialEq)]
pub struct ExamplePair {
    pub index: String,
    pub input: String,
    pub output: Option<String>,
}

/// A converted statement with fixed slots and ordered examples
///
/// Slots hold converted HTML or are absent. An example's output slot is
/// only ever filled right after its matching input in file-name order.
#[derive(Debug, Clone)]
pub struct StatementDocument {
    pub language: StatementLang,
    pub description: Option<String>,
    pub input_format: Option<String>,
    pub output_format: Option<String>,
    pub notes: Option<String>,
    pub examples: Vec<ExamplePair>,
}

impl StatementDocument {
    pub fn empty(language: StatementLang) -> Self {
        Self {
            language,
            description: None,
            input_format: None,
            output_format: None,
            notes: None,
            examples: Vec::new(),
        }
    }

    /// Number of filled slots (placeholders the skeleton will declare)
    pub fn filled_slots(&self) -> usize {
        [
            &self.description,
            &self.input_format,
            &self.output_format,
            &self.notes,
        ]
        .iter()
        .filter(|s| s.is_some())
        .count()
    }
}

/// Result of converting one statement language section
#[derive(Debug)]
pub struct ConvertedStatement {
    pub document: StatementDocument,
    /// Flattened legacy rendering; empty when the section had no fragments
    pub legacy: String,
}

/// Drives fragment conversion for statement sections
pub struct StatementConverter<'a> {
    latex: &'a dyn Converter,
}

impl<'a> StatementConverter<'a> {
    pub fn new(latex: &'a dyn Converter) -> Self {
        Self { latex }
    }

    /// Convert one `statement-sections/<language>/` directory
    pub fn convert_section(
        &self,
        section_dir: &Path,
        lang: StatementLang,
    ) -> Result<ConvertedStatement> {
        let mut document = StatementDocument::empty(lang);
        let mut blob = LegacyBlob::new();
        let mut legend = String::new();
        let mut notes = String::new();

        for fragment in Fragment::ALL {
            let path = section_dir.join(fragment.file_name());
            if !path.exists() {
                continue;
            }
            let html = self.convert_fragment(&path, section_dir)?;
            blob.push_section(lang, fragment, &html);
            match fragment {
                Fragment::Legend => legend.push_str(&html),
                Fragment::InputFormat => document.input_format = Some(html),
                Fragment::OutputFormat => document.output_format = Some(html),
                // Interaction augments the legend rather than taking a slot
                Fragment::Interaction => {
                    legend.push_str(&sections::interaction_block(lang, &html))
                }
                Fragment::Notes => notes.push_str(&html),
                // Scoring augments the notes rather than taking a slot
                Fragment::Scoring => notes.push_str(&sections::scoring_block(lang, &html)),
            }
        }

        if !legend.is_empty() {
            document.description = Some(legend);
        }
        if !notes.is_empty() {
            document.notes = Some(notes);
        }
        document.examples = discover_examples(section_dir)?;

        let legacy = if blob.is_empty() {
            String::new()
        } else {
            blob.finish()
        };

        debug!(
            language = lang.tag(),
            slots = document.filled_slots(),
            examples = document.examples.len(),
            "converted statement section"
        );

        Ok(ConvertedStatement { document, legacy })
    }

    /// Preprocess, convert and postprocess one LaTeX fragment
    ///
    /// A converter failure is tolerated: the fragment degrades to empty
    /// HTML and the import goes on.
    fn convert_fragment(&self, path: &Path, section_dir: &Path) -> Result<String> {
        let source = fs::read_to_string(path)?;
        fs::write(path, preprocess_latex(&source))?;

        let html_path = section_dir.join("out.html");
        let _ = fs::remove_file(&html_path);
        if let Err(e) = self.latex.convert(path, &html_path) {
            warn!("conversion of {} failed: {e}", path.display());
            return Ok(String::new());
        }
        let html = match fs::read_to_string(&html_path) {
            Ok(html) => html,
            Err(e) => {
                warn!("converter produced no output for {}: {e}", path.display());
                return Ok(String::new());
            }
        };
        Ok(postprocess_html(&html))
    }
}

/// Normalize LaTeX source before conversion
///
/// Expands the `\t{..}` shorthand to `\texttt{..}`, turns `<<`/`>>` into
/// guillemets, and removes epigraphs (the converter renders them as plain
/// paragraphs, which reads as part of the legend).
pub fn preprocess_latex(text: &str) -> String {
    let text = text
        .replace("\\t{", "\\texttt{")
        .replace("<<", "«")
        .replace(">>", "»");
    remove_epigraph(&text)
}

const EPIGRAPH_START: &str = "\\epigraph";

/// Remove an `\epigraph{..}{..}` command including both brace groups
fn remove_epigraph(text: &str) -> String {
    let Some(start) = text.find(EPIGRAPH_START) else {
        return text.to_string();
    };

    let find_closing = |from: usize| -> usize {
        let mut depth = 0usize;
        let mut seen_open = false;
        for (offset, ch) in text[from..].char_indices() {
            match ch {
                '{' => {
                    depth += 1;
                    seen_open = true;
                }
                '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
            if seen_open && depth == 0 {
                return from + offset + ch.len_utf8();
            }
        }
        text.len()
    };

    let mut end = find_closing(start + EPIGRAPH_START.len());
    if text[end..].starts_with('{') {
        end = find_closing(end);
    }
    format!("{}{}", &text[..start], &text[end..])
}

/// Clean converter output for the destination format
///
/// Strips the spurious `[0cm]` spacing token the converter leaves behind
/// and tags tables with the destination stylesheet class.
pub fn postprocess_html(html: &str) -> String {
    html.replace("[0cm]", "")
        .replace("<table>", "<table class=\"statements\">")
}

static EXAMPLE_FILE: OnceLock<Regex> = OnceLock::new();

fn example_file_regex() -> &'static Regex {
    EXAMPLE_FILE.get_or_init(|| Regex::new(r"^example\.(\d{2})(\.a)?$").expect("static regex"))
}

/// Discover numbered example files and pair inputs with outputs
///
/// Files match `example.NN` (input) and `example.NN.a` (expected output)
/// and are processed in sorted file-name order. An output file whose index
/// does not match the currently open pair is a structural error.
pub fn discover_examples(section_dir: &Path) -> Result<Vec<ExamplePair>> {
    let mut names: Vec<String> = Vec::new();
    for entry in fs::read_dir(section_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if example_file_regex().is_match(&name) {
            names.push(name);
        }
    }
    names.sort();

    let mut examples: Vec<ExamplePair> = Vec::new();
    let mut open_index: Option<String> = None;
    for name in names {
        let captures = example_file_regex()
            .captures(&name)
            .expect("name matched above");
        let index = captures[1].to_string();
        let is_output = captures.get(2).is_some();
        let content = fs::read_to_string(section_dir.join(&name))?;

        if is_output {
            match open_index.take() {
                Some(open) if open == index => {
                    let pair = examples.last_mut().expect("open pair exists");
                    pair.output = Some(content);
                }
                _ => {
                    return Err(Error::statement(format!(
                        "orphan example output {name}: no matching input precedes it"
                    )));
                }
            }
        } else {
            examples.push(ExamplePair {
                index: index.clone(),
                input: content,
                output: None,
            });
            open_index = Some(index);
        }
    }
    Ok(examples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Fake LaTeX converter: wraps the source in a marker element
    struct FakeLatex;

    impl Converter for FakeLatex {
        fn convert(&self, input: &Path, output: &Path) -> Result<()> {
            let text = fs::read_to_string(input)?;
            fs::write(output, format!("<p>{}</p>", text.trim()))?;
            Ok(())
        }
    }

    /// Converter that always fails
    struct BrokenConverter;

    impl Converter for BrokenConverter {
        fn convert(&self, _input: &Path, _output: &Path) -> Result<()> {
            Err(Error::Converter("simulated failure".into()))
        }
    }

    fn section_with(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let path = dir.path().to_path_buf();
        (dir, path)
    }

    #[test]
    fn preprocess_expands_shorthand_and_quotes() {
        assert_eq!(
            preprocess_latex("\\t{code} <<q>>"),
            "\\texttt{code} «q»"
        );
    }

    #[test]
    fn epigraph_with_attribution_is_removed() {
        let text = "Intro \\epigraph{Wise {nested} words}{--- Someone} outro";
        assert_eq!(remove_epigraph(text), "Intro  outro");
    }

    #[test]
    fn epigraph_without_attribution_is_removed() {
        let text = "\\epigraph{Only quote}rest";
        assert_eq!(remove_epigraph(text), "rest");
    }

    #[test]
    fn text_without_epigraph_is_unchanged() {
        assert_eq!(remove_epigraph("plain"), "plain");
    }

    #[test]
    fn postprocess_strips_size_token_and_tags_tables() {
        assert_eq!(
            postprocess_html("a[0cm]<table><tr/></table>"),
            "a<table class=\"statements\"><tr/></table>"
        );
    }

    #[test]
    fn converts_fragments_into_slots() {
        let (_guard, dir) = section_with(&[
            ("legend.tex", "the legend"),
            ("input.tex", "the input"),
            ("output.tex", "the output"),
            ("notes.tex", "the notes"),
        ]);
        let converter = StatementConverter::new(&FakeLatex);
        let result = converter
            .convert_section(&dir, StatementLang::Russian)
            .unwrap();
        let doc = &result.document;
        assert_eq!(doc.description.as_deref(), Some("<p>the legend</p>"));
        assert_eq!(doc.input_format.as_deref(), Some("<p>the input</p>"));
        assert_eq!(doc.output_format.as_deref(), Some("<p>the output</p>"));
        assert_eq!(doc.notes.as_deref(), Some("<p>the notes</p>"));
        assert!(result.legacy.contains("Входные данные"));
    }

    #[test]
    fn interaction_and_scoring_augment_existing_slots() {
        let (_guard, dir) = section_with(&[
            ("legend.tex", "legend"),
            ("interaction.tex", "protocol"),
            ("notes.tex", "note"),
            ("scoring.tex", "points"),
        ]);
        let converter = StatementConverter::new(&FakeLatex);
        let doc = converter
            .convert_section(&dir, StatementLang::English)
            .unwrap()
            .document;
        let description = doc.description.unwrap();
        assert!(description.starts_with("<p>legend</p>"));
        assert!(description.contains("Interaction Protocol"));
        let notes = doc.notes.unwrap();
        assert!(notes.starts_with("<p>note</p>"));
        assert!(notes.contains("Scoring"));
        assert!(doc.input_format.is_none());
    }

    #[test]
    fn interaction_alone_still_creates_description() {
        let (_guard, dir) = section_with(&[("interaction.tex", "protocol")]);
        let converter = StatementConverter::new(&FakeLatex);
        let doc = converter
            .convert_section(&dir, StatementLang::Russian)
            .unwrap()
            .document;
        assert!(doc.description.is_some());
    }

    #[test]
    fn converter_failure_degrades_to_empty_fragment() {
        let (_guard, dir) = section_with(&[("legend.tex", "legend")]);
        let converter = StatementConverter::new(&BrokenConverter);
        let result = converter
            .convert_section(&dir, StatementLang::Russian)
            .unwrap();
        // slot absent because the only contribution was empty
        assert!(result.document.description.is_none());
    }

    #[test]
    fn pairs_examples_in_order() {
        let (_guard, dir) = section_with(&[
            ("example.01", "in1"),
            ("example.01.a", "out1"),
            ("example.02", "in2"),
            ("example.02.a", "out2"),
        ]);
        let examples = discover_examples(&dir).unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].input, "in1");
        assert_eq!(examples[0].output.as_deref(), Some("out1"));
        assert_eq!(examples[1].input, "in2");
        assert_eq!(examples[1].output.as_deref(), Some("out2"));
    }

    #[test]
    fn input_without_output_is_allowed() {
        let (_guard, dir) = section_with(&[("example.01", "in1")]);
        let examples = discover_examples(&dir).unwrap();
        assert_eq!(examples.len(), 1);
        assert!(examples[0].output.is_none());
    }

    #[test]
    fn orphan_output_is_a_structural_error() {
        let (_guard, dir) = section_with(&[("example.01.a", "out1")]);
        let err = discover_examples(&dir).unwrap_err();
        assert!(matches!(err, Error::Statement(_)));
    }

    #[test]
    fn mismatched_output_index_is_a_structural_error() {
        let (_guard, dir) = section_with(&[
            ("example.01", "in1"),
            ("example.01.a", "out1"),
            ("example.03.a", "stray"),
        ]);
        let err = discover_examples(&dir).unwrap_err();
        assert!(matches!(err, Error::Statement(_)));
    }

    #[test]
    fn unrelated_files_are_ignored() {
        let (_guard, dir) = section_with(&[
            ("example.01", "in1"),
            ("example.001", "not two digits"),
            ("legend.tex", "x"),
        ]);
        let examples = discover_examples(&dir).unwrap();
        assert_eq!(examples.len(), 1);
    }
}
