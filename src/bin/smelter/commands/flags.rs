//! `smelter flags` command

use anyhow::Result;

use smelter::resolver::resolve_flags;

use crate::cli::FlagsArgs;
use crate::commands::{load_profile, load_spec};

pub fn execute(args: FlagsArgs) -> Result<()> {
    let spec = load_spec(&args.package)?;
    let profile = load_profile(args.profile.as_ref())?;

    for flag in resolve_flags(&spec, &profile) {
        println!("{}", flag);
    }

    Ok(())
}
