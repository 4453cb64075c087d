//! Positional placeholder substitution for dialog output text.
//!
//! Output templates authored in the dialog workspace carry markers like
//! `{0}`/`{1}` that the enrichment handlers fill in. Substitution is total:
//! an index with no bound value keeps its literal placeholder, so a handler
//! that fetched fewer values than the template expects still produces a
//! well-formed line.

use std::fmt;
use std::sync::OnceLock;

use regex::{Captures, Regex};

#[derive(Clone, Debug, PartialEq)]
pub enum TemplateParam {
    Number(f64),
    Text(String),
}

impl fmt::Display for TemplateParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // f64 Display drops trailing zeros, matching the upstream
            // string-to-float round-trip ("8000" renders as 8000).
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<f64> for TemplateParam {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<String> for TemplateParam {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for TemplateParam {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<u64> for TemplateParam {
    fn from(value: u64) -> Self {
        Self::Number(value as f64)
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{(\d+)\}").expect("placeholder pattern is valid"))
}

/// Joins template lines with a single space and fills every bound `{n}`
/// marker. An empty template or empty param list returns the input unchanged.
pub fn substitute(lines: &[String], params: &[TemplateParam]) -> Vec<String> {
    if lines.is_empty() || params.is_empty() {
        return lines.to_vec();
    }

    let joined = lines.join(" ");
    let filled = placeholder_pattern().replace_all(&joined, |captures: &Captures<'_>| {
        let index = captures[1].parse::<usize>().ok();
        match index.and_then(|index| params.get(index)) {
            Some(param) => param.to_string(),
            None => captures[0].to_string(),
        }
    });

    vec![filled.into_owned()]
}
