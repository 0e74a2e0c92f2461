use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

const REMINDER_PREFIX: &str = "ping for lunch";

#[derive(Debug, Deserialize, Default)]
struct NamesFile {
    #[serde(default)]
    names: Vec<String>,
}

/// Read the `names` list from a YAML file.
pub async fn load_names(path: &Path) -> Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Error while reading names file: {}", path.display()))?;
    parse_names(&content)
        .with_context(|| format!("Error while parsing names file: {}", path.display()))
}

fn parse_names(content: &str) -> Result<Vec<String>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let file: NamesFile = serde_yaml::from_str(content)?;
    Ok(file.names)
}

/// Build `"ping for lunch @a @b"` from the name list.
pub fn reminder_text(names: &[String]) -> String {
    let mut text = String::from(REMINDER_PREFIX);
    for name in names {
        let name = name.trim();
        let name = name.strip_prefix('@').unwrap_or(name);
        if name.is_empty() {
            continue;
        }
        text.push_str(" @");
        text.push_str(name);
    }
    text
}
