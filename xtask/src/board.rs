use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use hal_native::{BoardTable, Registry};

pub fn run(path: Option<&Path>) -> Result<()> {
    println!();
    let table = match path {
        Some(path) => {
            println!(
                "{}",
                format!("📋 Validating board table {}...", path.display())
                    .cyan()
                    .bold()
            );
            BoardTable::from_path(path)
                .with_context(|| format!("Failed to load {}", path.display()))?
        }
        None => {
            println!("{}", "📋 Default board".cyan().bold());
            BoardTable::default_board()
        }
    };
    println!();

    let registry = Registry::from_board(&table)
        .map_err(|e| anyhow::anyhow!("Board rejected by the registry: {}", e.as_str()))?;

    for name in registry.names() {
        let Some(desc) = registry.descriptor(name.as_str()) else {
            continue;
        };
        let eager = if registry.is_constructed(name.as_str()) {
            " (always on)".dimmed().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<16} {:<12} #{}{}",
            name.as_str().bold(),
            desc.kind.as_str(),
            desc.index,
            eager
        );
    }
    println!();

    let limits = registry.limits();
    println!(
        "{}",
        format!(
            "✓ {} devices (limits: {} per kind, {} total)",
            registry.len(),
            limits.max_per_kind,
            limits.max_devices
        )
        .green()
    );
    println!();

    Ok(())
}
