//! Parsing of path addresses.
//!
//! ```text
//! address   := ['.'] segment ('.' segment)*
//! segment   := ident qualifier* | qualifier+
//! qualifier := '[' text ']'
//! ```
//!
//! A leading `.` marks an absolute address. Qualifiers are kept as raw text:
//! whether `[2]` is a list index or a child named `2` depends on what the
//! preceding segment resolved to.

use std::fmt::Display;

use crate::error::PathError;

/// A parsed address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    raw: String,
    absolute: bool,
    segments: Vec<Segment>,
}

/// One dot-separated step of an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// `None` for a bare `[Name]` segment.
    pub name: Option<String>,
    pub qualifiers: Vec<String>,
}

impl Segment {
    fn display_text(&self) -> String {
        let mut text = self.name.clone().unwrap_or_default();
        for qualifier in &self.qualifiers {
            text.push('[');
            text.push_str(qualifier);
            text.push(']');
        }
        text
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_text())
    }
}

impl Address {
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let invalid = |reason: &str| PathError::InvalidAddress {
            address: raw.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(invalid("address is empty"));
        }
        let (absolute, body) = match trimmed.strip_prefix('.') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let mut segments = Vec::new();
        for part in split_segments(body).map_err(|reason| invalid(reason))? {
            segments.push(parse_segment(part).map_err(|reason| invalid(reason))?);
        }

        Ok(Self {
            raw: raw.to_string(),
            absolute,
            segments,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Splits on dots that are not inside brackets.
fn split_segments(body: &str) -> Result<Vec<&str>, &'static str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.checked_sub(1).ok_or("unbalanced ']'")?,
            '.' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err("unclosed '['");
    }
    parts.push(&body[start..]);
    Ok(parts)
}

fn parse_segment(part: &str) -> Result<Segment, &'static str> {
    let part = part.trim();
    if part.is_empty() {
        return Err("empty segment");
    }

    let (name, mut rest) = match part.find('[') {
        Some(open) => (&part[..open], &part[open..]),
        None => (part, ""),
    };
    if name.contains(']') {
        return Err("unbalanced ']'");
    }

    let mut qualifiers = Vec::new();
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[').ok_or("text after qualifier")?;
        let close = inner.find(']').ok_or("unclosed '['")?;
        let qualifier = inner[..close].trim();
        if qualifier.is_empty() {
            return Err("empty qualifier");
        }
        if qualifier.contains('[') {
            return Err("nested qualifier");
        }
        qualifiers.push(qualifier.to_string());
        rest = inner[close + 1..].trim_start();
    }

    let name = name.trim();
    Ok(Segment {
        name: (!name.is_empty()).then(|| name.to_string()),
        qualifiers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn relative_address_with_qualifier() {
        let address = Address::parse("A.B[C]").unwrap();
        assert!(!address.is_absolute());
        assert_eq!(address.segments().len(), 2);
        assert_eq!(address.segments()[1].name.as_deref(), Some("B"));
        assert_eq!(address.segments()[1].qualifiers, vec!["C".to_string()]);
    }

    #[test]
    fn absolute_address_keeps_root_segment() {
        let address = Address::parse(".Simulations.Base.Clock").unwrap();
        assert!(address.is_absolute());
        let names: Vec<_> = address
            .segments()
            .iter()
            .map(|s| s.name.clone().unwrap())
            .collect();
        assert_eq!(names, ["Simulations", "Base", "Clock"]);
    }

    #[test]
    fn bare_qualifier_segment_has_no_name() {
        let address = Address::parse("[Clock].Start").unwrap();
        assert_eq!(address.segments()[0].name, None);
        assert_eq!(address.segments()[0].qualifiers, vec!["Clock".to_string()]);
    }

    #[test]
    fn dots_inside_brackets_do_not_split() {
        let address = Address::parse("Report[a.b]").unwrap();
        assert_eq!(address.segments().len(), 1);
        assert_eq!(address.segments()[0].qualifiers, vec!["a.b".to_string()]);
    }

    #[test]
    fn chained_qualifiers() {
        let address = Address::parse("Values[2][0]").unwrap();
        assert_eq!(
            address.segments()[0].qualifiers,
            vec!["2".to_string(), "0".to_string()]
        );
        assert_eq!(address.segments()[0].to_string(), "Values[2][0]");
    }

    #[test_case(""; "empty")]
    #[test_case("   "; "blank")]
    #[test_case("A..B"; "empty segment")]
    #[test_case("A."; "trailing dot")]
    #[test_case("A[B"; "unclosed bracket")]
    #[test_case("A]B"; "stray close")]
    #[test_case("A[]"; "empty qualifier")]
    #[test_case("A[B]x"; "text after qualifier")]
    fn malformed_addresses_are_rejected(raw: &str) {
        assert!(matches!(
            Address::parse(raw),
            Err(PathError::InvalidAddress { .. })
        ));
    }
}
