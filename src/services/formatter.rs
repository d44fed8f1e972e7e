// Canonical rendering of manifests

use crate::models::manifest::{LineKind, Manifest};

/// Render `manifest` in canonical form.
///
/// Requirements are re-rendered without redundant whitespace, comments are
/// written as `# text`, inline comments follow their line after two spaces,
/// runs of blank lines collapse to one and leading or
/// trailing blank lines are dropped. Formatting already formatted text
/// returns it unchanged.
pub fn format(manifest: &Manifest) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(manifest.lines.len());
    let mut previous_blank = true;

    for line in &manifest.lines {
        let mut rendered = match &line.kind {
            LineKind::Blank => {
                if previous_blank {
                    continue;
                }
                previous_blank = true;
                lines.push(String::new());
                continue;
            }
            LineKind::Comment(text) if text.is_empty() => "#".to_string(),
            LineKind::Comment(text) => format!("# {text}"),
            LineKind::Requirement(requirement) => requirement.to_string(),
            LineKind::Include(path) => format!("-r {path}"),
            LineKind::Constraint(path) => format!("-c {path}"),
            LineKind::Option(raw) | LineKind::Invalid { raw, .. } => raw.clone(),
        };
        match line.comment.as_deref() {
            Some("") => rendered.push_str("  #"),
            Some(text) => {
                rendered.push_str("  # ");
                rendered.push_str(text);
            }
            None => {}
        }
        previous_blank = false;
        lines.push(rendered);
    }

    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }

    if lines.is_empty() {
        return String::new();
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
