//! Region names and `/`-separated region paths.
//!
//! A path is a sequence of segments separated by `/`. `.` stays put,
//! `..` moves to the parent, and empty segments are ignored, so `a//b/`
//! equals `a/b`. A leading `/` starts from the root of the tree. A path
//! that names a missing child, or climbs above a root, resolves to
//! nothing.

use crate::error::RegionError;

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// Path of a merge root relative to itself.
pub const CURRENT: &str = ".";

/// One step of a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment<'a> {
    /// `.`
    Current,
    /// `..`
    Parent,
    /// A child name.
    Child(&'a str),
}

/// A path split into its starting point and steps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedPath<'a> {
    /// Whether resolution starts from the root.
    pub absolute: bool,
    /// Steps in order, empty segments dropped.
    pub segments: Vec<Segment<'a>>,
}

/// Split `path` into segments.
pub fn parse(path: &str) -> ParsedPath<'_> {
    let segments = path
        .split(SEPARATOR)
        .filter(|s| !s.is_empty())
        .map(|s| match s {
            "." => Segment::Current,
            ".." => Segment::Parent,
            name => Segment::Child(name),
        })
        .collect();
    ParsedPath {
        absolute: path.starts_with(SEPARATOR),
        segments,
    }
}

/// Check that `name` can label a region.
pub fn validate_name(name: &str) -> Result<(), RegionError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(SEPARATOR) {
        return Err(RegionError::InvalidName { name: name.into() });
    }
    Ok(())
}

/// Append `name` to a relative path, where [`CURRENT`] is the empty path.
pub fn join(base: &str, name: &str) -> String {
    if base == CURRENT {
        name.to_string()
    } else {
        format!("{base}{SEPARATOR}{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_drops_empty_segments() {
        let parsed = parse("/body//./skin/../");
        assert!(parsed.absolute);
        assert_eq!(
            parsed.segments,
            vec![
                Segment::Child("body"),
                Segment::Current,
                Segment::Child("skin"),
                Segment::Parent
            ]
        );
        assert!(parse("").segments.is_empty());
        assert!(!parse("body").absolute);
    }

    #[test]
    fn names_exclude_separators_and_dots() {
        assert!(validate_name("skin").is_ok());
        assert!(validate_name("...").is_ok());
        for bad in ["", ".", "..", "a/b", "/"] {
            assert!(validate_name(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn join_from_current() {
        assert_eq!(join(CURRENT, "body"), "body");
        assert_eq!(join("body", "skin"), "body/skin");
    }
}
