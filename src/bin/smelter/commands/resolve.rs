//! `smelter resolve` command

use anyhow::Result;

use smelter::resolver::Resolver;

use crate::cli::ResolveArgs;
use crate::commands::{diagnose, load_profile, load_spec, parse_configuration};

pub fn execute(args: ResolveArgs) -> Result<()> {
    let spec = load_spec(&args.package)?;
    let profile = load_profile(args.profile.as_ref())?;
    let mut configuration = parse_configuration(&args.set)?;

    let resolver = Resolver::with_builtin_transitions();
    for name in &args.transition {
        configuration = resolver
            .registry()
            .apply(name, &configuration)
            .map_err(|e| diagnose(e.into()))?;
    }

    let resolved = resolver
        .resolve(&spec, &configuration, &profile)
        .map_err(diagnose)?;

    println!("{}", serde_json::to_string_pretty(&*resolved)?);
    Ok(())
}
