use serde::{Deserialize, Serialize};

use crate::models::requirement::Requirement;

/// What a single manifest line holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LineKind {
    Blank,
    /// Comment text without the leading `#`
    Comment(String),
    Requirement(Requirement),
    /// `-r path` / `--requirement path`
    Include(String),
    /// `-c path` / `--constraint path`
    Constraint(String),
    /// Any other installer option, kept verbatim
    Option(String),
    /// A line that could not be understood
    Invalid { raw: String, reason: String },
}

/// A logical manifest line (continuations already joined)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestLine {
    /// 1-based number of the first physical line
    pub number: usize,
    pub kind: LineKind,
    /// Trailing ` # text` after the line content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A parsed requirements manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Where the manifest came from (a path, or `<stdin>`)
    pub source: String,
    pub lines: Vec<ManifestLine>,
    /// Manifests pulled in through `-r`, in include order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<Manifest>,
}

/// Requirements sharing one comment header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    pub title: Option<&'a str>,
    pub requirements: Vec<&'a Requirement>,
}

/// A requirement together with the manifest it was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcedRequirement<'a> {
    pub source: &'a str,
    pub requirement: &'a Requirement,
}

impl Manifest {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            lines: Vec::new(),
            includes: Vec::new(),
        }
    }

    /// Requirements of this file only, in order
    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.lines.iter().filter_map(|line| match &line.kind {
            LineKind::Requirement(req) => Some(req),
            _ => None,
        })
    }

    /// Paths named by `-r` lines, in order
    pub fn include_paths(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|line| match &line.kind {
            LineKind::Include(path) => Some(path.as_str()),
            _ => None,
        })
    }

    /// Requirements of this file and loaded includes, with included
    /// requirements spliced in at their `-r` line
    pub fn all_requirements(&self) -> Vec<SourcedRequirement<'_>> {
        let mut out = Vec::new();
        self.collect_requirements(&mut out);
        out
    }

    fn collect_requirements<'a>(&'a self, out: &mut Vec<SourcedRequirement<'a>>) {
        let mut includes = self.includes.iter();
        for line in &self.lines {
            match &line.kind {
                LineKind::Requirement(requirement) => out.push(SourcedRequirement {
                    source: &self.source,
                    requirement,
                }),
                LineKind::Include(_) => {
                    if let Some(included) = includes.next() {
                        included.collect_requirements(out);
                    }
                }
                _ => {}
            }
        }
    }

    /// Ordered package identifiers as written; comment, blank, option and
    /// invalid lines excluded
    pub fn package_names(&self) -> Vec<String> {
        self.all_requirements()
            .into_iter()
            .map(|r| r.requirement.name.raw.clone())
            .collect()
    }

    /// Lines that failed to parse, with their numbers
    pub fn invalid_lines(&self) -> impl Iterator<Item = (usize, &str, &str)> {
        self.lines.iter().filter_map(|line| match &line.kind {
            LineKind::Invalid { raw, reason } => Some((line.number, raw.as_str(), reason.as_str())),
            _ => None,
        })
    }

    /// Invalid lines of this file and loaded includes, each with the source
    /// it was read from
    pub fn all_invalid_lines(&self) -> Vec<(&str, usize, &str, &str)> {
        let mut out: Vec<_> = self
            .invalid_lines()
            .map(|(number, raw, reason)| (self.source.as_str(), number, raw, reason))
            .collect();
        for included in &self.includes {
            out.extend(included.all_invalid_lines());
        }
        out
    }

    /// Group this file's requirements by their comment header, in order of
    /// first appearance
    pub fn sections(&self) -> Vec<Section<'_>> {
        let mut sections: Vec<Section<'_>> = Vec::new();
        for requirement in self.requirements() {
            let title = requirement.section.as_deref();
            match sections.last_mut() {
                Some(last) if last.title == title => last.requirements.push(requirement),
                _ => sections.push(Section {
                    title,
                    requirements: vec![requirement],
                }),
            }
        }
        sections
    }

    pub fn is_empty(&self) -> bool {
        self.all_requirements().is_empty()
    }
}
