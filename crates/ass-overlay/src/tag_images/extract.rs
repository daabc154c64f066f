//! Locating `\img(...)` references in raw script text
//!
//! This is not a script parser. It recognizes the image tag
//! (optionally prefixed by a layer digit, as in `\1img` .. `\4img`) and
//! pulls out its first argument, leaving everything else to the engine.

use ahash::AHashSet;

use crate::paths::strip_quotes;
use crate::utils::text::{starts_with_ignore_case, trim_blanks};

/// Which part of a script is searched for image references
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TagScanMode {
    /// Only `Dialogue:` lines inside `[Events]` (or before any section)
    #[default]
    EventsOnly,
    /// Every byte of the script
    WholeScript,
}

impl TagScanMode {
    /// Run the extractor selected by this mode
    pub fn collect(self, script: &[u8]) -> Vec<String> {
        match self {
            Self::EventsOnly => collect_img_paths_in_events(script),
            Self::WholeScript => collect_img_paths(script),
        }
    }
}

/// Ordered, duplicate-free paths referenced anywhere in `script`
pub fn collect_img_paths(script: &[u8]) -> Vec<String> {
    let mut collector = PathCollector::default();
    collector.scan(script);
    collector.paths
}

/// Ordered, duplicate-free paths referenced by event lines of `script`
///
/// Section headers are matched case-insensitively and may carry blanks
/// inside the brackets. Lines before the first header count as events so
/// that bare dialogue fragments still resolve.
pub fn collect_img_paths_in_events(script: &[u8]) -> Vec<String> {
    let mut collector = PathCollector::default();
    let mut saw_section = false;
    let mut in_events = true;

    for raw_line in script.split(|&b| b == b'\n') {
        let line = raw_line.strip_suffix(b"\r").unwrap_or(raw_line);
        let line = trim_blanks(line);
        if line.is_empty() {
            continue;
        }

        if let Some(name) = section_name(line) {
            saw_section = true;
            in_events = name.eq_ignore_ascii_case(b"events");
            continue;
        }

        if saw_section && !in_events {
            continue;
        }
        if starts_with_ignore_case(line, b"dialogue:") {
            collector.scan(line);
        }
    }

    collector.paths
}

fn section_name(line: &[u8]) -> Option<&[u8]> {
    let inner = line.strip_prefix(b"[")?.strip_suffix(b"]")?;
    Some(trim_blanks(inner))
}

#[derive(Default)]
struct PathCollector {
    paths: Vec<String>,
    seen: AHashSet<String>,
}

impl PathCollector {
    fn scan(&mut self, span: &[u8]) {
        for (start, _) in span.iter().enumerate().filter(|&(_, &b)| b == b'\\') {
            if let Some(argument) = img_argument(&span[start + 1..]) {
                self.push(argument);
            }
        }
    }

    fn push(&mut self, argument: &[u8]) {
        let text = String::from_utf8_lossy(argument);
        let path = strip_quotes(&text);
        if path.is_empty() || self.seen.contains(path) {
            return;
        }
        self.seen.insert(path.to_owned());
        self.paths.push(path.to_owned());
    }
}

/// Argument of an image tag whose name starts at `tag` (just past the `\`)
fn img_argument(tag: &[u8]) -> Option<&[u8]> {
    let rest = match tag.first() {
        Some(b'1'..=b'4') => &tag[1..],
        _ => tag,
    };
    let rest = rest.strip_prefix(b"img")?;
    let rest = skip_blanks(rest).strip_prefix(b"(")?;
    let rest = skip_blanks(rest);

    let argument = match *rest.first()? {
        quote @ (b'"' | b'\'') => {
            let body = &rest[1..];
            let end = terminator(body, |b| b == quote)?;
            &body[..end]
        }
        _ => {
            let end = terminator(rest, |b| b == b',' || b == b')')?;
            &rest[..end]
        }
    };

    (!argument.is_empty()).then_some(argument)
}

/// Offset of the first byte matching `is_end`, which must come before the
/// end of the line
fn terminator(bytes: &[u8], is_end: impl Fn(u8) -> bool) -> Option<usize> {
    let end = bytes
        .iter()
        .position(|&b| is_end(b) || b == b'\n' || b == b'\r')?;
    is_end(bytes[end]).then_some(end)
}

fn skip_blanks(mut bytes: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = bytes {
        bytes = rest;
    }
    bytes
}
