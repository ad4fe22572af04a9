//! Directory listings: parsing and display
// (c) 2025 fxfer developers

use std::fmt::{self, Display};

use anyhow::{Context as _, Result, bail};
use human_repr::HumanCount as _;

/// What sort of thing a listing entry is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum::Display, strum::EnumString)]
pub enum EntryKind {
    /// A directory
    #[strum(serialize = "[D]")]
    Directory,
    /// A regular file
    #[strum(serialize = "[F]")]
    File,
}

/// One line of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// File or directory
    pub kind: EntryKind,
    /// Size in bytes, as reported by the lister
    pub size: u64,
    /// Name, without any leading directory
    pub name: String,
}

impl Entry {
    /// Converts to the wire record form, `type:size:name`, without the trailing newline
    #[must_use]
    pub fn to_record(&self) -> String {
        format!("{}:{}:{}", self.kind, self.size, self.name)
    }
}

impl Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:>8} {}",
            self.kind,
            self.size.human_count_bytes().to_string(),
            self.name
        )
    }
}

/// Parses listing text: newline-terminated `type:size:name` records.
///
/// Parsing stops at the first empty record.
/// The result is sorted by kind (directories first), then by descending size.
pub fn parse(text: &str) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for record in text.split('\n') {
        if record.is_empty() {
            break;
        }
        let mut fields = record.splitn(3, ':');
        let (Some(kind), Some(size), Some(name)) = (fields.next(), fields.next(), fields.next())
        else {
            bail!("malformed listing record {record:?}");
        };
        let kind: EntryKind = kind
            .parse()
            .with_context(|| format!("unknown entry type {kind:?}"))?;
        if size.is_empty() || !size.bytes().all(|b| b.is_ascii_digit()) {
            bail!("file size {size:?} is not a number");
        }
        let size = size.parse().with_context(|| format!("file size {size:?}"))?;
        entries.push(Entry {
            kind,
            size,
            name: name.to_owned(),
        });
    }
    entries.sort_by(|a, b| a.kind.cmp(&b.kind).then(b.size.cmp(&a.size)));
    Ok(entries)
}

/// Parses a listing payload, which must be UTF-8
pub fn parse_bytes(payload: &[u8]) -> Result<Vec<Entry>> {
    parse(std::str::from_utf8(payload).context("listing is not valid UTF-8")?)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod test {
    use super::{Entry, EntryKind, parse, parse_bytes};
    use assertables::assert_contains;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn sorted_by_kind_then_size() {
        let entries = parse("[F]:10:small\n[D]:4096:dir\n[F]:5000:big\n").unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["dir", "big", "small"]);
        assert_eq!(entries[0].kind, EntryKind::Directory);
    }

    #[test]
    fn stops_at_first_empty_record() {
        let entries = parse("[F]:1:a\n\n[F]:2:b\n").unwrap();
        assert_eq!(entries.len(), 1);
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn name_may_contain_colons() {
        let entries = parse("[F]:3:a:b\n").unwrap();
        assert_eq!(entries[0].name, "a:b");
    }

    #[test]
    fn bad_size() {
        let err = parse("[F]:12x:a\n").unwrap_err();
        assert_contains!(err.to_string(), "not a number");
        assert!(parse("[F]:-1:a\n").is_err());
    }

    #[test]
    fn bad_records() {
        assert!(parse("[F]:12\n").is_err());
        assert!(parse("[X]:12:a\n").is_err());
        assert!(parse_bytes(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn record_form() {
        let e = Entry {
            kind: EntryKind::File,
            size: 17,
            name: "notes.txt".into(),
        };
        assert_eq!(e.to_record(), "[F]:17:notes.txt");
        assert_eq!(parse(&format!("{}\n", e.to_record())).unwrap(), vec![e.clone()]);
        let shown = e.to_string();
        assert!(shown.starts_with("[F] "));
        assert!(shown.ends_with(" notes.txt"));
    }

    #[rstest]
    #[case(17, "17B")]
    #[case(1536, "1.5KiB")]
    #[case(3 * 1024 * 1024, "3MiB")]
    fn sizes_use_binary_units(#[case] size: u64, #[case] expected: &str) {
        let e = Entry {
            kind: EntryKind::File,
            size,
            name: "f".into(),
        };
        let shown = e.to_string();
        assert_eq!(shown.split_whitespace().nth(1), Some(expected), "{shown}");
    }
}
