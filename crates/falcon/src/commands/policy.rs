//! Policy command

use super::{architecture_probe, connect_api, load_config};
use crate::cli::{GlobalOptions, PolicyArgs};
use crate::output;
use anyhow::{Context, Result};
use falcon_image::UpdatePolicyResolver;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct PolicyOutcome<'a> {
    policy: &'a str,
    architecture: String,
    version: String,
}

pub async fn run(args: PolicyArgs, global: &GlobalOptions) -> Result<()> {
    let config = load_config(global)?;
    let api = connect_api(&config).await?;
    let architecture = architecture_probe(args.arch.as_deref()).architecture();

    let version = UpdatePolicyResolver::new(&api)
        .resolve_version(&args.name, &architecture)
        .await
        .with_context(|| format!("Failed to resolve update policy '{}'", args.name))?;

    let outcome = PolicyOutcome {
        policy: &args.name,
        architecture: architecture.to_string(),
        version,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        output::success(&format!("Update policy '{}'", outcome.policy));
        output::kv("Architecture", &outcome.architecture);
        output::kv("Sensor version", &outcome.version);
    }
    Ok(())
}
