use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

/// One rustdoc pass over a workspace crate.
struct DocPass {
    label: &'static str,
    package: &'static str,
    features: Option<&'static str>,
}

/// `hal` is documented with and without `defmt` so both cfg_attr branches of
/// the derived formats stay buildable; `hal-native` last, so its output is
/// the one `--open` shows.
const PASSES: &[DocPass] = &[
    DocPass {
        label: "hal",
        package: "hal",
        features: None,
    },
    DocPass {
        label: "hal (defmt)",
        package: "hal",
        features: Some("defmt"),
    },
    DocPass {
        label: "hal-native",
        package: "hal-native",
        features: None,
    },
];

fn document(pass: &DocPass, open: bool) -> Result<()> {
    println!("{}", format!("  Documenting {}...", pass.label).cyan());
    let start = Instant::now();

    let mut cmd = Command::new("cargo");
    cmd.env("RUSTDOCFLAGS", "-D rustdoc::broken_intra_doc_links")
        .args(["doc", "--no-deps", "-p", pass.package]);
    if let Some(features) = pass.features {
        cmd.args(["--features", features]);
    }
    if open {
        cmd.arg("--open");
    }

    let output = cmd
        .output()
        .with_context(|| format!("Failed to document {}", pass.label))?;

    if !output.status.success() {
        eprintln!("{}", format!("  ✗ {} docs failed", pass.label).red().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
        anyhow::bail!("Documentation build failed for {}", pass.label);
    }

    println!(
        "{}",
        format!(
            "  ✓ {} documented in {:.2}s",
            pass.label,
            start.elapsed().as_secs_f64()
        )
        .green()
    );
    Ok(())
}

pub fn run(open: bool) -> Result<()> {
    println!();
    println!("{}", "📚 Building documentation...".cyan().bold());
    println!();

    let start = Instant::now();
    let last = PASSES.len().saturating_sub(1);
    for (i, pass) in PASSES.iter().enumerate() {
        document(pass, open && i == last)?;
    }

    println!();
    println!(
        "{}",
        format!(
            "✓ Documentation built in {:.2}s",
            start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );

    if !open {
        println!(
            "   {}",
            "Traits: target/doc/hal/index.html, simulator: target/doc/hal_native/index.html"
                .dimmed()
        );
    }
    println!();

    Ok(())
}
