// src/statement/template.rs

//! Positional placeholder substitution for statement skeletons
//!
//! Converted HTML fragments must be spliced into the serialized statement
//! document verbatim, after XML serialization, or the markup would be
//! escaped. The skeleton carries one `{}` placeholder per filled slot and
//! fragments are consumed strictly left to right; any count mismatch means
//! the skeleton and the fragment list disagree about the document shape and
//! is rejected before anything is written.

use crate::error::{Error, Result};

/// The positional placeholder token
pub const PLACEHOLDER: &str = "{}";

/// A serialized document skeleton with positional placeholders
#[derive(Debug, Clone)]
pub struct PlaceholderTemplate {
    skeleton: String,
}

impl PlaceholderTemplate {
    pub fn new(skeleton: String) -> Self {
        Self { skeleton }
    }

    /// Number of placeholders declared by the skeleton
    pub fn placeholder_count(&self) -> usize {
        self.skeleton.matches(PLACEHOLDER).count()
    }

    /// Substitute fragments into the placeholders, in declaration order
    ///
    /// Fragments containing the placeholder token themselves are inserted
    /// verbatim; only the skeleton's placeholders are consumed.
    pub fn substitute(self, fragments: &[String]) -> Result<String> {
        let parts: Vec<&str> = self.skeleton.split(PLACEHOLDER).collect();
        let expected = parts.len() - 1;
        if expected != fragments.len() {
            return Err(Error::statement(format!(
                "skeleton declares {expected} placeholders but {} fragments were supplied",
                fragments.len()
            )));
        }

        let capacity =
            self.skeleton.len() + fragments.iter().map(String::len).sum::<usize>();
        let mut out = String::with_capacity(capacity);
        for (i, part) in parts.iter().enumerate() {
            out.push_str(part);
            if i < fragments.len() {
                out.push_str(&fragments[i]);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_in_declaration_order() {
        let template = PlaceholderTemplate::new("<a>{}</a><b>{}</b>".to_string());
        assert_eq!(template.placeholder_count(), 2);
        let result = template
            .substitute(&["first".to_string(), "second".to_string()])
            .unwrap();
        assert_eq!(result, "<a>first</a><b>second</b>");
    }

    #[test]
    fn fragments_reproduce_verbatim() {
        let template = PlaceholderTemplate::new("<p>{}</p>".to_string());
        let payload = "<img src=\"a.png\"/> &amp; {} literal".to_string();
        let result = template.substitute(std::slice::from_ref(&payload)).unwrap();
        assert_eq!(result, format!("<p>{payload}</p>"));
    }

    #[test]
    fn too_few_fragments_rejected() {
        let template = PlaceholderTemplate::new("{}{}".to_string());
        let err = template.substitute(&["only".to_string()]).unwrap_err();
        assert!(matches!(err, Error::Statement(_)));
    }

    #[test]
    fn too_many_fragments_rejected() {
        let template = PlaceholderTemplate::new("{}".to_string());
        let err = template
            .substitute(&["a".to_string(), "b".to_string()])
            .unwrap_err();
        assert!(matches!(err, Error::Statement(_)));
    }

    #[test]
    fn empty_skeleton_with_no_fragments() {
        let template = PlaceholderTemplate::new("static".to_string());
        assert_eq!(template.substitute(&[]).unwrap(), "static");
    }
}
