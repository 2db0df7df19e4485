// src/statement/sections.rs

//! Fixed statement-section vocabulary and per-language phrasing
//!
//! The source format ships statements as fixed-name LaTeX fragments inside
//! `statement-sections/<language>/`. Both the fragment set and the set of
//! supported languages are closed; phrasing lives in enum-keyed tables so a
//! missing entry is a compile error, not a runtime formatting surprise.

/// A statement language with a known phrasing table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementLang {
    Russian,
    English,
}

impl StatementLang {
    /// Map a `statement-sections/` directory name to a language
    pub fn from_section_dir(name: &str) -> Option<Self> {
        match name {
            "russian" => Some(Self::Russian),
            "english" => Some(Self::English),
            _ => None,
        }
    }

    /// Locale tag used in the composite statement document
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Russian => "ru_RU",
            Self::English => "en_EN",
        }
    }

    /// Heading for an interaction-protocol block appended to the legend
    pub fn interaction_heading(&self) -> &'static str {
        match self {
            Self::Russian => "Протокол взаимодействия",
            Self::English => "Interaction Protocol",
        }
    }

    /// Heading for a scoring block appended to the notes
    pub fn scoring_heading(&self) -> &'static str {
        match self {
            Self::Russian => "Система оценки",
            Self::English => "Scoring",
        }
    }

    fn input_heading(&self) -> &'static str {
        match self {
            Self::Russian => "Входные данные",
            Self::English => "Input",
        }
    }

    fn output_heading(&self) -> &'static str {
        match self {
            Self::Russian => "Выходные данные",
            Self::English => "Output",
        }
    }

    fn notes_heading(&self) -> &'static str {
        match self {
            Self::Russian => "Примечание",
            Self::English => "Notes",
        }
    }
}

/// The closed set of statement source fragments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    Legend,
    InputFormat,
    OutputFormat,
    Interaction,
    Notes,
    Scoring,
}

impl Fragment {
    /// Processing order; interaction follows the format sections because it
    /// augments the legend after both formats are known
    pub const ALL: [Fragment; 6] = [
        Fragment::Legend,
        Fragment::InputFormat,
        Fragment::OutputFormat,
        Fragment::Interaction,
        Fragment::Notes,
        Fragment::Scoring,
    ];

    /// Fixed source file name inside the section directory
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Legend => "legend.tex",
            Self::InputFormat => "input.tex",
            Self::OutputFormat => "output.tex",
            Self::Interaction => "interaction.tex",
            Self::Notes => "notes.tex",
            Self::Scoring => "scoring.tex",
        }
    }
}

/// Wrap an interaction-protocol fragment for appending to the legend slot
pub fn interaction_block(lang: StatementLang, html: &str) -> String {
    format!("<h3>{}</h3>\n{html}", lang.interaction_heading())
}

/// Wrap a scoring fragment for appending to the notes slot
pub fn scoring_block(lang: StatementLang, html: &str) -> String {
    format!("<h3>{}</h3>\n{html}", lang.scoring_heading())
}

/// Flattened single-document statement rendering for the legacy consumer
///
/// Sections are appended in processing order; the finished blob is a single
/// self-contained HTML fragment.
#[derive(Debug, Default)]
pub struct LegacyBlob {
    body: String,
}

impl LegacyBlob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_section(&mut self, lang: StatementLang, fragment: Fragment, html: &str) {
        let section = match fragment {
            Fragment::Legend => format!("<div class=\"legend\">\n{html}\n</div>\n"),
            Fragment::InputFormat => {
                format!("<h3>{}</h3>\n{html}\n", lang.input_heading())
            }
            Fragment::OutputFormat => {
                format!("<h3>{}</h3>\n{html}\n", lang.output_heading())
            }
            Fragment::Interaction => {
                format!("<h3>{}</h3>\n{html}\n", lang.interaction_heading())
            }
            Fragment::Notes => format!("<h3>{}</h3>\n{html}\n", lang.notes_heading()),
            Fragment::Scoring => {
                format!("<h3>{}</h3>\n{html}\n", lang.scoring_heading())
            }
        };
        self.body.push_str(&section);
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Finish the blob into a standalone document fragment
    pub fn finish(self) -> String {
        format!("<div class=\"statement\">\n{}</div>\n", self.body)
    }
}
