//! Ordering of distribution version strings.

use std::cmp::Ordering;

use semver::Version;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Number(u64),
    Text(&'a str),
}

impl Ord for Segment<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Segment::Number(a), Segment::Number(b)) => a.cmp(b),
            (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
            (Segment::Number(_), Segment::Text(_)) => Ordering::Greater,
            (Segment::Text(_), Segment::Number(_)) => Ordering::Less,
        }
    }
}

impl PartialOrd for Segment<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare two version strings.
///
/// Two valid semantic versions compare by SemVer precedence. Anything else
/// (`40`, `24.04`, `3.2a`) is split into numeric and alphabetic runs that
/// compare pairwise, numbers above text; a version that is a prefix of the
/// other sorts first.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    if let (Ok(a), Ok(b)) = (Version::parse(a), Version::parse(b)) {
        return a.cmp(&b);
    }
    segments(a).cmp(segments(b))
}

fn segments(version: &str) -> impl Iterator<Item = Segment<'_>> {
    version
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .flat_map(runs)
}

fn runs(part: &str) -> impl Iterator<Item = Segment<'_>> {
    let mut rest = part;
    std::iter::from_fn(move || {
        let numeric = rest.chars().next()?.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != numeric)
            .unwrap_or(rest.len());
        let (run, tail) = rest.split_at(end);
        rest = tail;
        Some(match run.parse() {
            Ok(n) if numeric => Segment::Number(n),
            _ => Segment::Text(run),
        })
    })
}
