//! Descriptor summary extraction.

/// Pull a short description out of descriptor markdown: YAML frontmatter
/// `description`/`summary` first, else the first non-heading, non-fence,
/// non-blank body line.
pub fn extract_summary(content: &str) -> Option<String> {
    frontmatter_summary(content).or_else(|| first_body_line(content))
}

fn frontmatter_summary(content: &str) -> Option<String> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(frontmatter(content)?).ok()?;
    for field in ["description", "summary"] {
        if let Some(value) = yaml.get(field).and_then(serde_yaml::Value::as_str) {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

fn first_body_line(content: &str) -> Option<String> {
    let body = body_after_frontmatter(content);
    let mut in_fence = false;
    for line in body.lines() {
        let line = line.trim();
        if line.starts_with("```") || line.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence || line.is_empty() || line.starts_with('#') {
            continue;
        }
        return Some(line.to_string());
    }
    None
}

/// The YAML between the leading `---` markers, if any.
fn frontmatter(content: &str) -> Option<&str> {
    split_frontmatter(content).map(|(yaml, _)| yaml)
}

fn body_after_frontmatter(content: &str) -> &str {
    split_frontmatter(content)
        .map(|(_, body)| body)
        .unwrap_or(content)
}

fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let trimmed = content.trim_start();
    if !trimmed.starts_with("---") {
        return None;
    }
    let mut parts = trimmed.splitn(3, "---");
    parts.next()?;
    let yaml = parts.next()?;
    let body = parts.next()?;
    Some((yaml, body))
}
