//! Validate command implementation - check the config without calling AWS

use ac_core::Selector;
use anyhow::Result;

use crate::cli::{GlobalArgs, ValidateArgs};
use crate::commands::common;

/// Execute the validate command
pub(crate) async fn execute(args: &ValidateArgs, global: &GlobalArgs) -> Result<()> {
    let (path, config) = common::load_config(global)?;
    let selectors = config.selectors()?;
    let naming = config.naming()?;

    if args.show_selectors {
        for selector in &selectors {
            println!("{}", describe(selector));
        }
    }
    println!(
        "{} is valid: {} selector(s), alarm prefix '{}'",
        path.display(),
        selectors.len(),
        naming.prefix()
    );
    Ok(())
}

fn describe(selector: &Selector) -> String {
    let mut line = format!("{} ({})", selector.id, selector.resource_type);
    if let Some(pattern) = &selector.name_pattern_source {
        line.push_str(&format!(" name~'{}'", pattern));
    }
    for (key, value) in &selector.tags {
        line.push_str(&format!(" tag:{}={}", key, value));
    }
    let metrics: Vec<&str> = selector.metric_names().collect();
    line.push_str(&format!(" -> {}", metrics.join(", ")));
    line
}
