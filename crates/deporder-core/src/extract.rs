//! Relation extraction from source content.
//!
//! Sources declare their ordering in a header block of comment lines:
//!
//! ```text
//! # after: base
//! # before: teardown
//! echo "body starts here"
//! ```
//!
//! Lines ahead of the first declaration are skipped (shebangs, license
//! banners). The first non-declaration line after the block ends the scan,
//! so the body is never read. Content need not be UTF-8.

use std::io::{self, BufRead};

use regex::Regex;

use crate::relation::{Direction, Node, Relation};

/// Turns one content stream into an ordered, possibly empty, list of
/// relations. Implementations hold no shared mutable state; the gather
/// pipeline calls one instance from many threads at once.
pub trait RelationExtractor: Send + Sync {
    /// # Errors
    ///
    /// Returns the underlying I/O error if the stream cannot be read.
    fn extract(&self, reader: &mut dyn BufRead) -> io::Result<Vec<Relation>>;
}

/// Matches `<marker> before: <target>` / `<marker> after: <target>` header
/// lines.
#[derive(Debug, Clone)]
pub struct HeaderExtractor {
    pattern: Regex,
}

impl HeaderExtractor {
    pub const DEFAULT_MARKER: &'static str = "#";

    /// Build an extractor for a comment marker such as `#` or `//`.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting pattern fails to compile. The
    /// marker is escaped, so this only happens for absurdly long markers.
    pub fn new(marker: &str) -> Result<Self, regex::Error> {
        let pattern = format!(
            r"^\s*{}\s*(before|after):\s+(.+?)\s*$",
            regex::escape(marker)
        );
        Ok(Self {
            pattern: Regex::new(&pattern)?,
        })
    }

    fn parse_line(&self, line: &str) -> Option<Relation> {
        let caps = self.pattern.captures(line)?;
        let direction: Direction = caps.get(1)?.as_str().parse().ok()?;
        let target = caps.get(2)?.as_str();
        Some(Relation {
            direction,
            target: Node::from(target),
        })
    }
}

impl RelationExtractor for HeaderExtractor {
    fn extract(&self, reader: &mut dyn BufRead) -> io::Result<Vec<Relation>> {
        let mut relations = Vec::new();
        let mut line = Vec::new();

        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            // Bodies are arbitrary bytes; invalid sequences become U+FFFD.
            match self.parse_line(&String::from_utf8_lossy(&line)) {
                Some(relation) => relations.push(relation),
                None if !relations.is_empty() => break,
                None => {}
            }
        }

        Ok(relations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Vec<Relation> {
        let extractor = HeaderExtractor::new(HeaderExtractor::DEFAULT_MARKER).expect("pattern");
        extractor
            .extract(&mut text.as_bytes())
            .expect("in-memory read")
    }

    #[test]
    fn empty_content_has_no_relations() {
        assert!(extract("").is_empty());
    }

    #[test]
    fn body_without_header_has_no_relations() {
        assert!(extract("echo hi\nexit 0\n").is_empty());
    }

    #[test]
    fn reads_header_block() {
        let relations = extract("# after: base\n#before: z\necho hi\n");
        assert_eq!(relations, [Relation::after("base"), Relation::before("z")]);
    }

    #[test]
    fn skips_lines_before_first_declaration() {
        let relations = extract("#!/bin/sh\n\n  # before: later  \n");
        assert_eq!(relations, [Relation::before("later")]);
    }

    #[test]
    fn stops_at_first_line_after_block() {
        let relations = extract("# after: a\necho\n# after: b\n");
        assert_eq!(relations, [Relation::after("a")]);
    }

    #[test]
    fn requires_space_after_colon() {
        assert!(extract("# before:x\n").is_empty());
    }

    #[test]
    fn target_keeps_inner_spaces() {
        let relations = extract("# before: two words\n");
        assert_eq!(relations, [Relation::before("two words")]);
    }

    #[test]
    fn non_utf8_bytes_do_not_fail_the_read() {
        let extractor = HeaderExtractor::new(HeaderExtractor::DEFAULT_MARKER).expect("pattern");

        let relations = extractor
            .extract(&mut &b"# after: base\n# caf\xe9\necho\n"[..])
            .expect("lossy read");
        assert_eq!(relations, [Relation::after("base")]);

        let relations = extractor
            .extract(&mut &b"echo caf\xe9\n\xff\xfe\n"[..])
            .expect("lossy read");
        assert!(relations.is_empty());
    }

    #[test]
    fn custom_marker_is_escaped() {
        let extractor = HeaderExtractor::new("//").expect("pattern");
        let relations = extractor
            .extract(&mut "// after: core\nfn main() {}\n".as_bytes())
            .expect("read");
        assert_eq!(relations, [Relation::after("core")]);

        let extractor = HeaderExtractor::new("--").expect("pattern");
        assert!(
            extractor
                .extract(&mut "# after: core\n".as_bytes())
                .expect("read")
                .is_empty()
        );
    }
}
