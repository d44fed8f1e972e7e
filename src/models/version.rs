use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::utils::validation::validate_version_text;

/// Pre-release phase of a version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PreKind {
    Alpha,
    Beta,
    ReleaseCandidate,
}

impl PreKind {
    fn label(self) -> &'static str {
        match self {
            PreKind::Alpha => "a",
            PreKind::Beta => "b",
            PreKind::ReleaseCandidate => "rc",
        }
    }
}

/// A PEP 440 version
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Version {
    pub epoch: u64,
    pub release: Vec<u64>,
    pub pre: Option<(PreKind, u64)>,
    pub post: Option<u64>,
    pub dev: Option<u64>,
    pub local: Option<String>,
    /// Text the version was parsed from, trimmed; `===` compares against it
    #[serde(default)]
    pub original: String,
}

/// Version parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("Invalid version '{0}'")]
    InvalidVersion(String),

    #[error("Invalid version specifier '{0}'")]
    InvalidSpecifier(String),
}

const PRE_LABELS: &[(&str, PreKind)] = &[
    ("alpha", PreKind::Alpha),
    ("a", PreKind::Alpha),
    ("beta", PreKind::Beta),
    ("b", PreKind::Beta),
    ("preview", PreKind::ReleaseCandidate),
    ("pre", PreKind::ReleaseCandidate),
    ("rc", PreKind::ReleaseCandidate),
    ("c", PreKind::ReleaseCandidate),
];

const POST_LABELS: &[&str] = &["post", "rev", "r"];

fn strip_separator(s: &str) -> &str {
    s.strip_prefix(['-', '_', '.']).unwrap_or(s)
}

fn take_number(s: &str) -> (Option<u64>, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return (None, s);
    }
    (s[..end].parse().ok(), &s[end..])
}

/// Number following a pre/post/dev label, defaulting to 0 when absent
fn take_label_number(s: &str) -> (u64, &str) {
    let after_sep = strip_separator(s);
    match take_number(after_sep) {
        (Some(n), rest) => (n, rest),
        (None, _) => (0, s),
    }
}

impl Version {
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    pub fn is_postrelease(&self) -> bool {
        self.post.is_some()
    }

    /// Copy of this version without the local segment
    pub fn public(&self) -> Self {
        Self {
            local: None,
            ..self.clone()
        }
    }

    /// Arbitrary equality: the text as written, ignoring case only
    fn matches_literally(&self, text: &str) -> bool {
        let written = if self.original.is_empty() {
            self.to_string()
        } else {
            self.original.clone()
        };
        written.eq_ignore_ascii_case(text)
    }

    /// Release segment at `index`, treating missing segments as zero
    fn release_at(&self, index: usize) -> u64 {
        self.release.get(index).copied().unwrap_or(0)
    }

    fn cmp_release(&self, other: &Self) -> Ordering {
        let len = self.release.len().max(other.release.len());
        (0..len)
            .map(|i| self.release_at(i).cmp(&other.release_at(i)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Whether this version's release starts with `prefix` (zero padded)
    pub fn release_starts_with(&self, prefix: &[u64]) -> bool {
        prefix
            .iter()
            .enumerate()
            .all(|(i, segment)| self.release_at(i) == *segment)
    }

    fn pre_key(&self) -> (i8, Option<(PreKind, u64)>) {
        match (self.pre, self.post, self.dev) {
            // 1.0.dev0 sorts before 1.0a0
            (None, None, Some(_)) => (-1, None),
            (Some(pre), _, _) => (0, Some(pre)),
            _ => (1, None),
        }
    }

    fn post_key(&self) -> (i8, u64) {
        self.post.map_or((-1, 0), |n| (0, n))
    }

    fn dev_key(&self) -> (i8, u64) {
        self.dev.map_or((1, 0), |n| (0, n))
    }

    fn cmp_local(&self, other: &Self) -> Ordering {
        match (&self.local, &other.local) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => {
                let mut left = a.split('.');
                let mut right = b.split('.');
                loop {
                    match (left.next(), right.next()) {
                        (None, None) => return Ordering::Equal,
                        (None, Some(_)) => return Ordering::Less,
                        (Some(_), None) => return Ordering::Greater,
                        (Some(x), Some(y)) => {
                            let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                                (Ok(x), Ok(y)) => x.cmp(&y),
                                // numeric segments sort above alphanumeric ones
                                (Ok(_), Err(_)) => Ordering::Greater,
                                (Err(_), Ok(_)) => Ordering::Less,
                                (Err(_), Err(_)) => x.cmp(y),
                            };
                            if ord.is_ne() {
                                return ord;
                            }
                        }
                    }
                }
            }
        }
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || VersionError::InvalidVersion(input.to_string());
        let lowered = input.trim().to_ascii_lowercase();
        let text = lowered.strip_prefix('v').unwrap_or(&lowered);

        let (public, local) = match text.split_once('+') {
            Some((public, local)) => {
                if local.is_empty()
                    || !local
                        .split(['.', '-', '_'])
                        .all(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_ascii_alphanumeric()))
                {
                    return Err(invalid());
                }
                (public, Some(local.replace(['-', '_'], ".")))
            }
            None => (text, None),
        };

        let (epoch, mut rest) = match public.split_once('!') {
            Some((epoch, rest)) => (epoch.parse().map_err(|_| invalid())?, rest),
            None => (0, public),
        };

        let mut release = Vec::new();
        loop {
            let (segment, after) = take_number(rest);
            release.push(segment.ok_or_else(invalid)?);
            rest = after;
            match rest.strip_prefix('.') {
                Some(next) if next.starts_with(|c: char| c.is_ascii_digit()) => rest = next,
                _ => break,
            }
        }

        let mut pre = None;
        let candidate = strip_separator(rest);
        if let Some((label, kind)) = PRE_LABELS.iter().find(|(label, _)| candidate.starts_with(label)) {
            let (n, after) = take_label_number(&candidate[label.len()..]);
            pre = Some((*kind, n));
            rest = after;
        }

        let mut post = None;
        if let Some(implicit) = rest.strip_prefix('-') {
            if let (Some(n), after) = take_number(implicit) {
                post = Some(n);
                rest = after;
            }
        }
        if post.is_none() {
            let candidate = strip_separator(rest);
            if let Some(label) = POST_LABELS.iter().find(|label| candidate.starts_with(*label)) {
                let (n, after) = take_label_number(&candidate[label.len()..]);
                post = Some(n);
                rest = after;
            }
        }

        let mut dev = None;
        let candidate = strip_separator(rest);
        if let Some(after_label) = candidate.strip_prefix("dev") {
            let (n, after) = take_label_number(after_label);
            dev = Some(n);
            rest = after;
        }

        if !rest.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
            original: input.trim().to_string(),
        })
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| self.cmp_release(other))
            .then_with(|| self.pre_key().cmp(&other.pre_key()))
            .then_with(|| self.post_key().cmp(&other.post_key()))
            .then_with(|| self.dev_key().cmp(&other.dev_key()))
            .then_with(|| self.cmp_local(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(ToString::to_string).collect();
        write!(f, "{}", release.join("."))?;
        if let Some((kind, n)) = self.pre {
            write!(f, "{}{n}", kind.label())?;
        }
        if let Some(n) = self.post {
            write!(f, ".post{n}")?;
        }
        if let Some(n) = self.dev {
            write!(f, ".dev{n}")?;
        }
        if let Some(local) = &self.local {
            write!(f, "+{local}")?;
        }
        Ok(())
    }
}

/// Comparison operator of a version specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "===")]
    ArbitraryEqual,
    #[serde(rename = "~=")]
    Compatible,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = "<=")]
    LessEqual,
    #[serde(rename = ">=")]
    GreaterEqual,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = ">")]
    Greater,
}

impl Operator {
    /// Operators ordered so that longer tokens are tried first
    pub const ALL: [Self; 8] = [
        Self::ArbitraryEqual,
        Self::Compatible,
        Self::Equal,
        Self::NotEqual,
        Self::LessEqual,
        Self::GreaterEqual,
        Self::Less,
        Self::Greater,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ArbitraryEqual => "===",
            Self::Compatible => "~=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::Less => "<",
            Self::Greater => ">",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single clause such as `>=1.2` or `==2.*`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionSpecifier {
    pub operator: Operator,
    pub version: String,
}

impl VersionSpecifier {
    /// Whether this clause pins an exact version (`==1.2.3` or `===...`)
    pub fn is_exact(&self) -> bool {
        match self.operator {
            Operator::ArbitraryEqual => true,
            Operator::Equal => !self.is_wildcard(),
            _ => false,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.version.ends_with(".*")
    }

    /// Whether the version named by this clause is itself a pre-release
    pub fn names_prerelease(&self) -> bool {
        self.version
            .trim_end_matches(".*")
            .parse::<Version>()
            .is_ok_and(|v| v.is_prerelease())
    }

    /// Check whether `candidate` satisfies this clause
    pub fn contains(&self, candidate: &Version) -> bool {
        match self.operator {
            Operator::ArbitraryEqual => candidate.matches_literally(&self.version),
            _ if self.is_wildcard() => self.matches_prefix(candidate),
            _ => self.compare(candidate),
        }
    }

    fn matches_prefix(&self, candidate: &Version) -> bool {
        let Ok(prefix) = self.version.trim_end_matches(".*").parse::<Version>() else {
            return false;
        };
        let matches = candidate.epoch == prefix.epoch && candidate.release_starts_with(&prefix.release);
        match self.operator {
            Operator::Equal => matches,
            Operator::NotEqual => !matches,
            _ => false,
        }
    }

    fn compare(&self, candidate: &Version) -> bool {
        let Ok(spec) = self.version.parse::<Version>() else {
            return false;
        };
        // local segments only take part in == / != when the clause names one
        let candidate = if spec.local.is_none() {
            candidate.public()
        } else {
            candidate.clone()
        };
        let same_release = candidate.epoch == spec.epoch && candidate.cmp_release(&spec).is_eq();

        match self.operator {
            Operator::Equal => candidate == spec,
            Operator::NotEqual => candidate != spec,
            Operator::LessEqual => candidate <= spec,
            Operator::GreaterEqual => candidate >= spec,
            Operator::Less => {
                candidate < spec && !(candidate.is_prerelease() && !spec.is_prerelease() && same_release)
            }
            Operator::Greater => {
                candidate > spec && !(candidate.is_postrelease() && !spec.is_postrelease() && same_release)
            }
            Operator::Compatible => {
                let prefix_len = spec.release.len().saturating_sub(1);
                candidate >= spec
                    && candidate.epoch == spec.epoch
                    && candidate.release_starts_with(&spec.release[..prefix_len])
            }
            Operator::ArbitraryEqual => candidate.matches_literally(&self.version),
        }
    }
}

impl FromStr for VersionSpecifier {
    type Err = VersionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let text = input.trim();
        let invalid = || VersionError::InvalidSpecifier(text.to_string());

        let operator = Operator::ALL
            .into_iter()
            .find(|op| text.starts_with(op.as_str()))
            .ok_or_else(invalid)?;
        let version = text[operator.as_str().len()..].trim();
        if version.is_empty() || version.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        match operator {
            Operator::ArbitraryEqual => validate_version_text(version).map_err(|_| invalid())?,
            Operator::Equal | Operator::NotEqual if version.ends_with(".*") => {
                version.trim_end_matches(".*").parse::<Version>().map_err(|_| invalid())?;
            }
            Operator::Compatible => {
                let parsed = version.parse::<Version>().map_err(|_| invalid())?;
                if parsed.release.len() < 2 || parsed.local.is_some() {
                    return Err(invalid());
                }
            }
            _ => {
                version.parse::<Version>().map_err(|_| invalid())?;
            }
        }

        Ok(Self {
            operator,
            version: version.to_string(),
        })
    }
}

impl fmt::Display for VersionSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.version)
    }
}

/// Whether `candidate` satisfies every clause
pub fn satisfies_all(specifiers: &[VersionSpecifier], candidate: &Version) -> bool {
    specifiers.iter().all(|spec| spec.contains(candidate))
}

/// Pick the highest version from `available` that satisfies `specifiers`.
///
/// Pre-releases are only considered when a clause names one, or when no
/// final release satisfies the clauses.
pub fn select_best<'a>(specifiers: &[VersionSpecifier], available: &'a [Version]) -> Option<&'a Version> {
    let allow_pre = specifiers.iter().any(VersionSpecifier::names_prerelease);
    let matching = available.iter().filter(|v| satisfies_all(specifiers, v));

    let best_final = matching
        .clone()
        .filter(|v| allow_pre || !v.is_prerelease())
        .max();
    best_final.or_else(|| matching.max())
}
