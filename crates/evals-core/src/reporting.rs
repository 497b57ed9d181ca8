use anyhow::{Context, Result};
use std::path::Path;

use crate::domain::score::Score;

/// Write the score collection as pretty JSON.
pub fn write_scores_json(path: &Path, scores: &[Score]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
    }
    let content = serde_json::to_string_pretty(scores).context("serialize scores")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Render a model x category table. Rows and columns keep first-appearance
/// order; missing cells (failed tasks) show `-`.
pub fn render_score_table(scores: &[Score]) -> String {
    let mut models: Vec<&str> = Vec::new();
    let mut categories: Vec<&str> = Vec::new();
    for s in scores {
        if !models.contains(&s.label.as_str()) {
            models.push(&s.label);
        }
        if !categories.contains(&s.category.as_str()) {
            categories.push(&s.category);
        }
    }

    let cell = |model: &str, category: &str| {
        scores
            .iter()
            .find(|s| s.label == model && s.category == category)
            .map(|s| s.value)
    };

    let mut out = String::new();
    out.push_str("| Model |");
    for c in &categories {
        out.push_str(&format!(" {} |", c));
    }
    out.push_str(" Average |\n|");
    out.push_str(&" --- |".repeat(categories.len() + 2));
    out.push('\n');

    for m in &models {
        out.push_str(&format!("| {} |", m));
        let mut values = Vec::new();
        for c in &categories {
            match cell(m, c) {
                Some(v) => {
                    values.push(v);
                    out.push_str(&format!(" {:.2} |", v));
                }
                None => out.push_str(" - |"),
            }
        }
        if values.is_empty() {
            out.push_str(" - |\n");
        } else {
            let avg = values.iter().sum::<f64>() / values.len() as f64;
            out.push_str(&format!(" {:.2} |\n", avg));
        }
    }
    out
}
