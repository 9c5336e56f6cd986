use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use billsim_core::app_config::PathLayout;
use billsim_core::identifier::{parse_billnumber_version, BILL_NUMBER_PART_REGEX};
use regex::Regex;

/// A discovered bill XML file paired with the identifier `enumerate` derived
/// for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillPath {
    pub billnumber_version: String,
    pub file_path: PathBuf,
    pub file_name: String,
}

fn flat_dir_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r".*?[1-9][0-9]*/bills/[a-z]+[0-9]+$").expect("static regex is valid")
    })
}

fn flat_file_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(&format!(r"^BILLS-{BILL_NUMBER_PART_REGEX}\.xml$")).expect("static regex is valid")
    })
}

fn nested_dir_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(
            r"data/(?P<congress>[1-9][0-9]*)/(?P<doctype>[a-z]+)/(?P<stage>[a-z]{1,8})/(?P<billnumber>[a-z]{1,8}[1-9][0-9]*)/?(text-versions/)?(?P<version>[a-z]+)$",
        )
        .expect("static regex is valid")
    })
}

/// Same capture groups as [`nested_dir_regex`], but not anchored at the end,
/// so it matches within a full file path (e.g. `.../text-versions/ih/document.xml`).
fn nested_path_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(
            r"data/(?P<congress>[1-9][0-9]*)/(?P<doctype>[a-z]+)/(?P<stage>[a-z]{1,8})/(?P<billnumber>[a-z]{1,8}[1-9][0-9]*)/?(text-versions/)?(?P<version>[a-z]+)",
        )
        .expect("static regex is valid")
    })
}

/// Maps between canonical `billnumber_version` identifiers and on-disk XML
/// locations, for either the `flat` or `nested` layout.
pub struct PathResolver {
    root: PathBuf,
    layout: PathLayout,
}

impl PathResolver {
    #[must_use]
    pub fn new(root: PathBuf, layout: PathLayout) -> Self {
        Self { root, layout }
    }

    /// Computes the absolute path for a `billnumber_version` identifier.
    /// Performs no I/O and never fails; malformed identifiers yield a path
    /// rooted at `root` with an empty tail, which the caller will find does
    /// not exist.
    #[must_use]
    pub fn path_for(&self, billnumber_version: &str) -> PathBuf {
        let Some(parts) = parse_billnumber_version(billnumber_version) else {
            return self.root.clone();
        };
        let (congress, stage, number, version) =
            (&parts.congress, &parts.stage, &parts.number, &parts.version);
        match self.layout {
            PathLayout::Flat => self.root.join(congress).join("bills").join(format!(
                "{stage}{number}"
            )).join(format!("BILLS-{congress}{stage}{number}{version}.xml")),
            PathLayout::Nested => self
                .root
                .join(congress)
                .join("bills")
                .join(stage)
                .join(format!("{stage}{number}"))
                .join("text-versions")
                .join(version)
                .join("document.xml"),
        }
    }

    /// Recovers a `billnumber_version` identifier from a path via regex
    /// search. Returns an empty string rather than raising on no match.
    #[must_use]
    pub fn parse(&self, path: &Path) -> String {
        let path_str = path.to_string_lossy();
        match self.layout {
            PathLayout::Flat => Regex::new(BILL_NUMBER_PART_REGEX)
                .expect("static regex is valid")
                .find(&path_str)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            PathLayout::Nested => nested_path_regex()
                .captures(&path_str)
                .map(|c| {
                    format!(
                        "{}{}{}",
                        &c["congress"], &c["billnumber"], &c["version"]
                    )
                })
                .unwrap_or_default(),
        }
    }

    /// Whether `dir` is the immediate parent directory of a bill XML file
    /// under this layout.
    #[must_use]
    pub fn is_file_parent(&self, dir: &Path) -> bool {
        let dir_str = dir.to_string_lossy();
        match self.layout {
            PathLayout::Flat => flat_dir_regex().is_match(&dir_str),
            PathLayout::Nested => nested_dir_regex().is_match(&dir_str),
        }
    }

    /// Whether `name` is a bill XML file name under this layout.
    #[must_use]
    pub fn file_matches(&self, name: &str) -> bool {
        match self.layout {
            PathLayout::Flat => flat_file_regex().is_match(name),
            PathLayout::Nested => name == "document.xml",
        }
    }

    /// Walks `root`, yielding a `BillPath` for every file whose parent
    /// directory satisfies `is_file_parent` and whose name satisfies
    /// `file_matches`.
    #[must_use]
    pub fn enumerate(&self) -> Vec<BillPath> {
        let mut accumulator = Vec::new();
        self.walk(&self.root, &mut accumulator);
        accumulator
    }

    fn walk(&self, dir: &Path, accumulator: &mut Vec<BillPath>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        let mut subdirs = Vec::new();
        let mut files = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                subdirs.push(path);
            } else {
                files.push(path);
            }
        }

        if self.is_file_parent(dir) {
            for file_path in &files {
                let file_name = file_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                if self.file_matches(&file_name) {
                    let billnumber_version = self.parse(file_path);
                    accumulator.push(BillPath {
                        billnumber_version,
                        file_path: file_path.clone(),
                        file_name,
                    });
                }
            }
        }

        for subdir in subdirs {
            self.walk(&subdir, accumulator);
        }
    }
}
