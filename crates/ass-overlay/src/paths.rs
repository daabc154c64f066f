//! Path normalization for externally referenced tag images
//!
//! Image references inside a script are free-form text: they may be quoted,
//! padded with whitespace, relative to the script file, or absolute. This
//! module turns such a reference into the ordered list of filesystem
//! locations worth trying.

use std::path::{Component, Path, PathBuf};

use smallvec::SmallVec;

/// Candidate locations for one reference, most specific first
pub type Candidates = SmallVec<[PathBuf; 2]>;

/// Trim whitespace and remove matching surrounding `"` or `'` quotes
///
/// Quotes are only removed in matching pairs. Unlike a single-pair strip,
/// this repeats until no matching pair remains (`"'a.png'"` becomes
/// `a.png`), so applying it twice never changes the result.
pub fn strip_quotes(path: &str) -> &str {
    let mut current = path.trim();
    loop {
        let bytes = current.as_bytes();
        let quoted = bytes.len() >= 2
            && matches!(
                (bytes[0], bytes[bytes.len() - 1]),
                (b'"', b'"') | (b'\'', b'\'')
            );
        if !quoted {
            return current;
        }
        current = current[1..current.len() - 1].trim();
    }
}

/// Wrap a path in double quotes, the alternate key form engines may look up
pub fn add_double_quotes(path: &str) -> String {
    let mut quoted = String::with_capacity(path.len() + 2);
    quoted.push('"');
    quoted.push_str(path);
    quoted.push('"');
    quoted
}

/// Whether a reference names an absolute filesystem location
pub fn is_absolute(path: &str) -> bool {
    !path.is_empty() && Path::new(path).is_absolute()
}

/// Ordered, duplicate-free locations to try for `path`
///
/// A relative reference is first resolved against `base_dir` (the directory
/// of the loaded script) so script-relative files win over the process
/// working directory. The raw reference is always the last candidate.
pub fn candidates(path: &str, base_dir: Option<&Path>) -> Candidates {
    let mut out = Candidates::new();
    if path.is_empty() {
        return out;
    }

    let raw = PathBuf::from(path);
    if let Some(base) = base_dir.filter(|base| !base.as_os_str().is_empty()) {
        if !raw.is_absolute() {
            push_unique(&mut out, normalize_lexically(&base.join(&raw)));
        }
    }
    push_unique(&mut out, raw);
    out
}

fn push_unique(out: &mut Candidates, candidate: PathBuf) {
    if !candidate.as_os_str().is_empty() && !out.contains(&candidate) {
        out.push(candidate);
    }
}

/// Collapse `.` and `..` components without touching the filesystem
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push(Component::ParentDir);
                }
            }
            other => out.push(other),
        }
    }
    out
}
