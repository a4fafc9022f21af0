//! Analysis text parser: splits free-text analysis into prose and fenced code,
//! and pulls the Grift Rating out of a segment.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Label used for a fence with no language tag.
pub const DEFAULT_CODE_LANGUAGE: &str = "code";

/// One renderable piece of an analysis string, in source order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    Prose { text: String },
    CodeBlock { language: String, code: String },
}

impl Segment {
    pub fn prose(text: impl Into<String>) -> Self {
        Segment::Prose { text: text.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// high above 7, medium above 4, low otherwise.
    pub fn from_value(value: f64) -> Self {
        if value > 7.0 {
            Severity::High
        } else if value > 4.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rating {
    /// 0–10, where 10 is a complete tech charlatan.
    pub value: f64,
    pub percentage: f64,
    pub severity: Severity,
}

impl Rating {
    pub fn new(value: f64) -> Self {
        let value = value.clamp(0.0, 10.0);
        Self {
            value,
            percentage: value * 10.0,
            severity: Severity::from_value(value),
        }
    }
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"```[ \t]*([\w+#.\-]*)[ \t]*\r?\n(?s:(.*?))```").expect("fence pattern is valid")
    })
}

fn rating_regex() -> &'static Regex {
    static RATING: OnceLock<Regex> = OnceLock::new();
    RATING.get_or_init(|| {
        Regex::new(r"(?i)(?:###\s*)?Grift Rating:?\s*(\d+(?:\.\d+)?)\s*/\s*10\b")
            .expect("rating pattern is valid")
    })
}

/// Splits `text` into prose and code-block segments.
///
/// Whitespace-only prose between fences is dropped. An unterminated fence is
/// left in the prose. Input that yields no segment at all comes back as a
/// single prose segment holding the raw text.
pub fn parse(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last_end = 0;

    for caps in fence_regex().captures_iter(text) {
        let (Some(whole), Some(body)) = (caps.get(0), caps.get(2)) else {
            continue;
        };

        push_prose(&mut segments, &text[last_end..whole.start()]);

        let language = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        segments.push(Segment::CodeBlock {
            language: if language.is_empty() {
                DEFAULT_CODE_LANGUAGE.to_string()
            } else {
                language.to_string()
            },
            code: trim_blank_lines(body.as_str()).to_string(),
        });

        last_end = whole.end();
    }

    push_prose(&mut segments, &text[last_end..]);

    if segments.is_empty() {
        segments.push(Segment::prose(text));
    }
    segments
}

/// Finds a `Grift Rating: N/10` line anywhere in `text`.
///
/// Callers apply this to the final analysis string of a project only.
pub fn extract_rating(text: &str) -> Option<Rating> {
    let caps = rating_regex().captures(text)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    Some(Rating::new(value))
}

fn push_prose(segments: &mut Vec<Segment>, span: &str) {
    if !span.trim().is_empty() {
        segments.push(Segment::prose(span));
    }
}

/// Drops leading blank lines and trailing whitespace, keeping first-line indentation.
fn trim_blank_lines(code: &str) -> &str {
    let mut start = 0;
    for line in code.split_inclusive('\n') {
        if !line.trim().is_empty() {
            break;
        }
        start += line.len();
    }
    code[start..].trim_end()
}
