//! Script block command handler

use anyhow::{Context, Result};
use std::path::Path;
use w3data::ScriptText;

/// Print the conditional block at `offset`, and the function holding it
pub fn handle(script_path: &Path, offset: usize) -> Result<()> {
    let script = ScriptText::load(script_path)
        .with_context(|| format!("Failed to read script from {}", script_path.display()))?;

    let block = script
        .conditional_block(offset)
        .with_context(|| format!("No block at offset {} of {}", offset, script_path.display()))?;

    if let Some(function) = enclosing_function(&script, offset) {
        println!("// in function {}", function);
    }
    println!("{}", block);
    Ok(())
}

fn enclosing_function(script: &ScriptText, offset: usize) -> Option<String> {
    script
        .function_bodies()
        .into_iter()
        .find(|body| (body.start..body.start + body.text.len()).contains(&offset))
        .map(|body| body.name.to_string())
}
