//! Replay command implementation.
//!
//! Applies a recorded action script to a document. The document is only saved
//! when every action was accepted.

use std::path::Path;

use anyhow::{Context as _, Result};
use qnet_editor::{parse_script, replay, EditorConfig};

use super::network::Context;

pub fn execute(ctx: &Context, config: &EditorConfig, script: &Path, dry_run: bool) -> Result<()> {
    let contents = std::fs::read_to_string(script)
        .with_context(|| format!("Failed to read script {}", script.display()))?;
    let actions = parse_script(&contents)
        .with_context(|| format!("Invalid script {}", script.display()))?;

    let mut session = ctx.open(config)?;
    let report = replay(&mut session, &actions);

    if !report.is_clean() {
        for step in &report.rejected {
            eprintln!("❌ step {}: {}", step.index + 1, step.error);
        }
        anyhow::bail!(
            "{} of {} actions rejected; {} left unchanged",
            report.rejected.len(),
            actions.len(),
            ctx.path.display()
        );
    }

    if dry_run {
        if !ctx.quiet {
            println!(
                "Dry run: {} actions accepted, {} nodes and {} edges",
                report.applied,
                session.model().node_count(),
                session.model().edge_count()
            );
        }
        return Ok(());
    }

    ctx.save(&session)?;
    if !ctx.quiet {
        println!(
            "✅ Replayed {} actions: {} nodes, {} edges",
            report.applied,
            session.model().node_count(),
            session.model().edge_count()
        );
    }
    Ok(())
}
