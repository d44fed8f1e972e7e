// Requirements manifest parsing

use crate::models::manifest::{LineKind, Manifest, ManifestLine};
use crate::models::requirement::Requirement;
use crate::models::version::VersionSpecifier;
use crate::utils::validation::{validate_extra_name, validate_package_name};

/// Parser for pip-style requirements manifests
pub struct ManifestParser;

impl ManifestParser {
    /// Parse manifest text into an ordered list of lines.
    ///
    /// Content errors never abort parsing: a line that cannot be understood
    /// becomes `LineKind::Invalid` and parsing continues with the next one.
    pub fn parse(source: &str, text: &str) -> Manifest {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut manifest = Manifest::new(source);
        let mut section: Option<String> = None;

        for (number, content) in logical_lines(text) {
            let trimmed = content.trim();
            let mut comment = None;
            let kind = if trimmed.is_empty() {
                LineKind::Blank
            } else if let Some(comment) = trimmed.strip_prefix('#') {
                let comment = comment.trim().to_string();
                if !comment.is_empty() {
                    section = Some(comment.clone());
                }
                LineKind::Comment(comment)
            } else {
                let (body, trailing) = split_inline_comment(trimmed);
                comment = trailing.map(str::to_string);
                if body.starts_with('-') {
                    Self::parse_option(body)
                } else {
                    match Self::parse_requirement(body, number) {
                        Ok(mut requirement) => {
                            requirement.section.clone_from(&section);
                            LineKind::Requirement(requirement)
                        }
                        Err(reason) => LineKind::Invalid {
                            raw: body.to_string(),
                            reason,
                        },
                    }
                }
            };
            manifest.lines.push(ManifestLine { number, kind, comment });
        }

        manifest
    }

    /// Parse a single PEP 508 requirement such as
    /// `requests[socks]>=2.0,<3; python_version >= "3.8"`
    pub fn parse_requirement(text: &str, line: usize) -> Result<Requirement, String> {
        let text = text.trim();
        let name_end = text
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
            .unwrap_or(text.len());
        let name = &text[..name_end];
        if name.is_empty() {
            return Err(format!("expected a package name at '{text}'"));
        }
        validate_package_name(name).map_err(|_| format!("'{name}' is not a valid package identifier"))?;

        let mut requirement = Requirement::new(name, line);
        let mut rest = text[name_end..].trim_start();

        if let Some(after_bracket) = rest.strip_prefix('[') {
            let close = after_bracket
                .find(']')
                .ok_or_else(|| format!("unterminated extras list in '{text}'"))?;
            for extra in after_bracket[..close].split(',').map(str::trim) {
                if extra.is_empty() {
                    continue;
                }
                validate_extra_name(extra).map_err(|_| format!("'{extra}' is not a valid extra name"))?;
                requirement.extras.push(extra.to_string());
            }
            rest = after_bracket[close + 1..].trim_start();
        }

        if let Some(after_at) = rest.strip_prefix('@') {
            let after_at = after_at.trim_start();
            let url_end = after_at.find(char::is_whitespace).unwrap_or(after_at.len());
            let url = &after_at[..url_end];
            if url.is_empty() {
                return Err(format!("missing URL after '@' in '{text}'"));
            }
            requirement.url = Some(url.to_string());
            let trailing = after_at[url_end..].trim();
            if !trailing.is_empty() {
                let marker = trailing
                    .strip_prefix(';')
                    .ok_or_else(|| format!("unexpected text '{trailing}' after URL"))?;
                requirement.marker = Some(parse_marker(marker)?);
            }
            return Ok(requirement);
        }

        let (spec_part, marker) = match rest.split_once(';') {
            Some((spec, marker)) => (spec.trim(), Some(parse_marker(marker)?)),
            None => (rest.trim(), None),
        };
        requirement.marker = marker;

        let spec_part = match spec_part.strip_prefix('(') {
            Some(inner) => inner
                .strip_suffix(')')
                .ok_or_else(|| format!("unbalanced parenthesis in '{text}'"))?
                .trim(),
            None => spec_part,
        };

        if !spec_part.is_empty() {
            for clause in spec_part.split(',') {
                let specifier: VersionSpecifier = clause.parse().map_err(|_| {
                    if clause.trim().starts_with(|c: char| c.is_ascii_alphanumeric()) {
                        format!("unexpected text '{}' after package name '{name}'", clause.trim())
                    } else {
                        format!("invalid version specifier '{}'", clause.trim())
                    }
                })?;
                requirement.specifiers.push(specifier);
            }
        }

        Ok(requirement)
    }

    fn parse_option(body: &str) -> LineKind {
        let (flag, value) = match body.char_indices().find(|&(_, c)| c.is_whitespace() || c == '=') {
            Some((idx, sep)) => (&body[..idx], body[idx + sep.len_utf8()..].trim()),
            None => (body, ""),
        };

        let (flag, value) = match flag {
            f if f.len() > 2 && !f.starts_with("--") && (f.starts_with("-r") || f.starts_with("-c")) => {
                (&f[..2], f[2..].trim())
            }
            f => (f, value),
        };

        match flag {
            "-r" | "--requirement" | "-c" | "--constraint" if value.is_empty() => LineKind::Invalid {
                raw: body.to_string(),
                reason: format!("option '{flag}' requires a file path"),
            },
            "-r" | "--requirement" => LineKind::Include(value.to_string()),
            "-c" | "--constraint" => LineKind::Constraint(value.to_string()),
            _ => LineKind::Option(body.to_string()),
        }
    }
}

fn parse_marker(marker: &str) -> Result<String, String> {
    let marker = marker.trim();
    if marker.is_empty() {
        Err("empty environment marker after ';'".to_string())
    } else {
        Ok(marker.to_string())
    }
}

/// Split off a trailing ` # comment`; a `#` not preceded by whitespace is
/// kept so URL fragments survive
fn split_inline_comment(line: &str) -> (&str, Option<&str>) {
    let bytes = line.as_bytes();
    for (idx, _) in line.match_indices('#') {
        if idx == 0 || bytes[idx - 1].is_ascii_whitespace() {
            return (line[..idx].trim_end(), Some(line[idx + 1..].trim()));
        }
    }
    (line, None)
}

/// Physical lines joined across trailing backslashes, numbered by the first
/// physical line of each logical line
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, raw) in text.lines().enumerate() {
        let number = idx + 1;
        if raw.trim_start().starts_with('#') {
            // a comment line ends an open continuation
            if let Some(open) = pending.take() {
                out.push(open);
            }
            out.push((number, raw.to_string()));
            continue;
        }

        let (start, mut buffer) = pending.take().unwrap_or((number, String::new()));
        if let Some(continued) = raw.trim_end().strip_suffix('\\') {
            buffer.push_str(continued);
            pending = Some((start, buffer));
        } else {
            buffer.push_str(raw);
            out.push((start, buffer));
        }
    }

    if let Some(last) = pending {
        out.push(last);
    }
    out
}
