// src/remote/ejudge.rs

//! Thin ejudge judge-session wrapper
//!
//! Logs in to the judge interface, harvests the session id from the reply
//! page, and submits solution files. Submission is a convenience used after
//! an import to smoke-test every imported solution; it fans one file out to
//! every compiler id registered for its language.

use crate::error::{Error, Result};
use crate::remote::auth;
use reqwest::blocking::Client;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default ejudge base URL
pub const DEFAULT_EJUDGE_URL: &str = "http://localhost";

const SID_MARKER: &str = "name=\"SID\" value=\"";
const SID_LEN: usize = 16;

/// Source languages recognized for submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmitLang {
    Cpp,
    Python,
    Java,
    Pascal,
}

impl SubmitLang {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "cpp" | "cc" | "cxx" => Some(Self::Cpp),
            "py" => Some(Self::Python),
            "java" => Some(Self::Java),
            "pas" | "fpc" | "dpr" => Some(Self::Pascal),
            _ => None,
        }
    }

    /// Compiler ids registered for this language on the judge
    fn lang_ids(&self) -> &'static [u32] {
        match self {
            Self::Cpp => &[2, 3],
            Self::Python => &[23],
            Self::Java => &[18],
            Self::Pascal => &[1],
        }
    }

    fn comment_prefix(&self) -> &'static str {
        match self {
            Self::Cpp | Self::Java => "//",
            Self::Python => "#",
            Self::Pascal => "//",
        }
    }
}

/// An authenticated judge session for one contest
pub struct EjudgeSession {
    client: Client,
    base_url: String,
    sid: String,
}

impl EjudgeSession {
    /// Log in to the judge interface of a contest
    pub fn login(base_url: &str, contest_id: u32) -> Result<Self> {
        let credentials = auth::load_or_prompt("ejudge")?;
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(60))
            .build()?;

        let contest_id_field = contest_id.to_string();
        let page = client
            .post(format!("{base_url}/cgi-bin/new-judge"))
            .form(&[
                ("login", credentials.login.as_str()),
                ("password", credentials.password.as_str()),
                ("contest_id", contest_id_field.as_str()),
                ("role", "1"),
                ("language", "0"),
                ("action_2", ""),
            ])
            .send()?
            .text()?;

        let sid = extract_sid(&page)
            .ok_or_else(|| Error::remote("judge login page has no session id"))?;
        info!(contest_id, "logged in to ejudge judge interface");
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            sid,
        })
    }

    /// Submit raw source text under a specific compiler id
    pub fn submit_data(&self, data: &str, lang_id: u32, problem_id: i64) -> Result<()> {
        let problem_field = problem_id.to_string();
        let lang_field = lang_id.to_string();
        self.client
            .post(format!("{}/cgi-bin/new-judge", self.base_url))
            .form(&[
                ("SID", self.sid.as_str()),
                ("problem", problem_field.as_str()),
                ("eoln_type", "1"),
                ("lang_id", lang_field.as_str()),
                ("file", data),
                ("action_40", "Send!"),
            ])
            .send()?;
        debug!(problem_id, lang_id, "submitted solution data");
        Ok(())
    }

    /// Submit a solution file, fanning out to each registered compiler
    ///
    /// Unrecognized languages and unreadable files are skipped with a
    /// warning; a post-import smoke submission must never fail the import.
    pub fn submit_file(&self, path: &Path, problem_id: i64, no_lint: bool) -> Result<()> {
        let Some(lang) = SubmitLang::from_path(path) else {
            warn!("skipping submission of {}: unknown language", path.display());
            return Ok(());
        };
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) => {
                warn!("skipping submission of {}: {e}", path.display());
                return Ok(());
            }
        };

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let data = prepare_source(&data, lang, &file_name, no_lint);

        for lang_id in lang.lang_ids() {
            self.submit_data(&data, *lang_id, problem_id)?;
        }
        Ok(())
    }
}

/// Prepare source text for submission
///
/// Prepends a comment with the original file name (the judge shows it in
/// the run list) and, for C++ with lint suppression requested, tags every
/// line with `// NOLINT` except lines closing a block comment.
fn prepare_source(data: &str, lang: SubmitLang, file_name: &str, no_lint: bool) -> String {
    let data = if no_lint && lang == SubmitLang::Cpp {
        data.lines()
            .map(|line| {
                if line.contains("*/") {
                    line.to_string()
                } else {
                    format!("{line}  // NOLINT")
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        data.to_string()
    };
    format!("{} {file_name}\n{data}", lang.comment_prefix())
}

fn extract_sid(page: &str) -> Option<String> {
    let start = page.find(SID_MARKER)? + SID_MARKER.len();
    let sid: String = page[start..].chars().take(SID_LEN).collect();
    (sid.len() == SID_LEN).then_some(sid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn extracts_session_id_from_login_page() {
        let page = "<input type=\"hidden\" name=\"SID\" value=\"0123456789abcdef\"/>";
        assert_eq!(extract_sid(page).as_deref(), Some("0123456789abcdef"));
    }

    #[test]
    fn missing_session_id_is_none() {
        assert_eq!(extract_sid("<html>login failed</html>"), None);
    }

    #[test]
    fn prepared_source_carries_the_file_name_comment() {
        let prepared = prepare_source("print(1)\n", SubmitLang::Python, "sol.py", false);
        assert!(prepared.starts_with("# sol.py\n"));
        assert!(prepared.ends_with("print(1)\n"));
    }

    #[test]
    fn nolint_tags_cpp_lines_except_block_comment_ends() {
        let source = "int main() {\n/* note */\nreturn 0;\n}";
        let prepared = prepare_source(source, SubmitLang::Cpp, "a.cpp", true);
        assert!(prepared.contains("int main() {  // NOLINT"));
        assert!(prepared.contains("/* note */\n"));
        assert!(!prepared.contains("/* note */  // NOLINT"));
    }

    #[test]
    fn nolint_only_applies_to_cpp() {
        let prepared = prepare_source("x = 1", SubmitLang::Python, "a.py", true);
        assert!(!prepared.contains("NOLINT"));
    }

    #[test]
    fn language_detection_by_extension() {
        assert_eq!(
            SubmitLang::from_path(&PathBuf::from("sol.cpp")),
            Some(SubmitLang::Cpp)
        );
        assert_eq!(
            SubmitLang::from_path(&PathBuf::from("sol.dpr")),
            Some(SubmitLang::Pascal)
        );
        assert_eq!(SubmitLang::from_path(&PathBuf::from("sol.rs")), None);
        assert_eq!(SubmitLang::from_path(&PathBuf::from("noext")), None);
    }
}
