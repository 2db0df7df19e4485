// src/package/metadata.rs

//! Package metadata parsing (problem.xml)
//!
//! Parses the Polygon `problem.xml` document into [`PackageMetadata`]: judge
//! limits, per-language display names, declared assets (checker, interactor,
//! solutions), resource files, and statement languages. The tree is built
//! once per package and is read-only downstream.

use crate::error::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

/// A minimal XML element tree
///
/// `problem.xml` is small (a few KB), so the whole document is materialized.
/// Only elements, attributes and text are kept; comments, processing
/// instructions and the declaration are dropped.
#[derive(Debug, Clone)]
pub struct XmlNode {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
    pub text: String,
}

impl XmlNode {
    /// Parse an XML document into its root element
    pub fn parse(xml: &str) -> Result<XmlNode> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    stack.push(Self::from_tag(
                        &String::from_utf8_lossy(e.name().as_ref()),
                        e.attributes(),
                    )?);
                }
                Event::Empty(e) => {
                    let node = Self::from_tag(
                        &String::from_utf8_lossy(e.name().as_ref()),
                        e.attributes(),
                    )?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => root = Some(node),
                    }
                }
                Event::End(_) => {
                    let node = stack
                        .pop()
                        .ok_or_else(|| Error::metadata("unbalanced closing tag"))?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => root = Some(node),
                    }
                }
                Event::Text(t) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&t.unescape()?);
                    }
                }
                Event::CData(c) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&c));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        root.ok_or_else(|| Error::metadata("document has no root element"))
    }

    fn from_tag(name: &str, attrs: quick_xml::events::attributes::Attributes) -> Result<XmlNode> {
        let mut parsed = Vec::new();
        for attr in attrs {
            let attr =
                attr.map_err(|e| Error::metadata(format!("malformed attribute: {e}")))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            parsed.push((key, value));
        }
        Ok(XmlNode {
            name: name.to_string(),
            attrs: parsed,
            children: Vec::new(),
            text: String::new(),
        })
    }

    /// Attribute value by name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First child element with the given name
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All child elements with the given name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Descend through a chain of child names
    pub fn find(&self, path: &[&str]) -> Option<&XmlNode> {
        let mut node = self;
        for name in path {
            node = node.child(name)?;
        }
        Some(node)
    }

    /// Element text with surrounding whitespace removed
    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }
}

/// A per-language problem display name
#[derive(Debug, Clone)]
pub struct ProblemName {
    pub language: String,
    pub value: String,
}

/// One declared test of the main testset
#[derive(Debug, Clone)]
pub struct TestEntry {
    pub points: Option<f64>,
    pub group: Option<String>,
}

/// Judging limits and tests of the main testset
#[derive(Debug, Clone)]
pub struct Testset {
    pub time_limit_ms: u64,
    pub memory_limit_bytes: u64,
    pub tests: Vec<TestEntry>,
}

/// A declared solution source, tagged by role (main, correct, ...)
#[derive(Debug, Clone)]
pub struct SolutionDecl {
    pub tag: String,
    pub path: String,
}

/// Parsed package metadata from problem.xml
///
/// Immutable once parsed; every downstream component reads from it.
#[derive(Debug, Clone)]
pub struct PackageMetadata {
    pub revision: String,
    pub names: Vec<ProblemName>,
    pub input_file: Option<String>,
    pub output_file: Option<String>,
    pub testset: Testset,
    pub checker_path: String,
    pub interactor_path: Option<String>,
    pub solutions: Vec<SolutionDecl>,
    pub resources: Vec<String>,
    pub statement_languages: Vec<String>,
    pub has_documents: bool,
}

impl PackageMetadata {
    /// Parse package metadata from the problem.xml document text
    pub fn from_xml(xml: &str) -> Result<Self> {
        let root = XmlNode::parse(xml)?;
        if root.name != "problem" {
            return Err(Error::metadata(format!(
                "expected <problem> root, found <{}>",
                root.name
            )));
        }

        let revision = root.attr("revision").unwrap_or_default().to_string();

        let names = root
            .child("names")
            .map(|names| {
                names
                    .children_named("name")
                    .filter_map(|n| {
                        Some(ProblemName {
                            language: n.attr("language")?.to_string(),
                            value: n.attr("value")?.to_string(),
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        if names.is_empty() {
            return Err(Error::metadata("no <names> declared"));
        }

        let judging = root
            .child("judging")
            .ok_or_else(|| Error::metadata("missing <judging>"))?;
        let input_file = non_empty(judging.attr("input-file"));
        let output_file = non_empty(judging.attr("output-file"));

        let testset = judging
            .child("testset")
            .ok_or_else(|| Error::metadata("missing <testset>"))?;
        let time_limit_ms = required_u64(testset, "time-limit")?;
        let memory_limit_bytes = required_u64(testset, "memory-limit")?;
        let tests = testset
            .find(&["tests"])
            .map(|tests| {
                tests
                    .children_named("test")
                    .map(|t| TestEntry {
                        points: t.attr("points").and_then(|p| p.parse().ok()),
                        group: t.attr("group").map(str::to_string),
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let assets = root
            .child("assets")
            .ok_or_else(|| Error::metadata("missing <assets>"))?;
        let checker_path = assets
            .find(&["checker", "source"])
            .and_then(|s| s.attr("path"))
            .ok_or_else(|| Error::metadata("missing <checker> source path"))?
            .to_string();
        let interactor_path = assets
            .find(&["interactor", "source"])
            .and_then(|s| s.attr("path"))
            .map(str::to_string);
        let solutions = assets
            .child("solutions")
            .map(|sols| {
                sols.children_named("solution")
                    .filter_map(|s| {
                        Some(SolutionDecl {
                            tag: s.attr("tag").unwrap_or_default().to_string(),
                            path: s.child("source")?.attr("path")?.to_string(),
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let resources = root
            .find(&["files", "resources"])
            .map(|res| {
                res.children_named("file")
                    .filter_map(|f| f.attr("path").map(str::to_string))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        // A language may be declared once per statement type (tex, pdf, html)
        let mut statement_languages: Vec<String> = Vec::new();
        if let Some(sts) = root.child("statements") {
            for s in sts.children_named("statement") {
                if let Some(lang) = s.attr("language") {
                    if !statement_languages.iter().any(|l| l == lang) {
                        statement_languages.push(lang.to_string());
                    }
                }
            }
        }

        let has_documents = root.child("documents").is_some();

        Ok(Self {
            revision,
            names,
            input_file,
            output_file,
            testset: Testset {
                time_limit_ms,
                memory_limit_bytes,
                tests,
            },
            checker_path,
            interactor_path,
            solutions,
            resources,
            statement_languages,
            has_documents,
        })
    }

    /// Display name for a specific language code
    pub fn name_for(&self, language: &str) -> Option<&str> {
        self.names
            .iter()
            .find(|n| n.language == language)
            .map(|n| n.value.as_str())
    }

    /// Any declared display name (last declaration wins, as in the source format)
    pub fn any_name(&self) -> Option<&str> {
        self.names.last().map(|n| n.value.as_str())
    }

    /// Source path of the solution tagged `main`
    pub fn main_solution(&self) -> Result<&str> {
        self.solutions
            .iter()
            .find(|s| s.tag == "main")
            .map(|s| s.path.as_str())
            .ok_or_else(|| Error::metadata("no solution tagged 'main'"))
    }

    /// Whether the testset declares per-test points (group scoring)
    pub fn scored_tests(&self) -> bool {
        self.testset
            .tests
            .first()
            .is_some_and(|t| t.points.is_some())
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

fn required_u64(node: &XmlNode, child: &str) -> Result<u64> {
    let text = node
        .child(child)
        .ok_or_else(|| Error::metadata(format!("missing <{child}>")))?
        .trimmed_text();
    text.parse()
        .map_err(|_| Error::metadata(format!("invalid <{child}> value: {text:?}")))
}
