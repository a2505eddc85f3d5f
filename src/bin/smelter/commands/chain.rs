//! `smelter chain` command

use anyhow::Result;

use smelter::resolver::resolve_flags;
use smelter::transform::compose_chain;

use crate::cli::ChainArgs;
use crate::commands::{diagnose, load_profile, load_spec};

pub fn execute(args: ChainArgs) -> Result<()> {
    let spec = load_spec(&args.package)?;
    let profile = load_profile(args.profile.as_ref())?;

    let enabled = resolve_flags(&spec, &profile);
    let chain = compose_chain(&spec, &enabled).map_err(diagnose)?;

    println!("{}", serde_json::to_string_pretty(&chain)?);
    Ok(())
}
