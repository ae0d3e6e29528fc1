//! Resolve command
//!
//! Plays the reconciler's part for one sensor: the version lock is checked
//! first, then the image is resolved under a deadline. A failure reports the
//! configured requeue delay instead of retrying.

use super::{architecture_probe, connect_api, load_config, registry_client};
use crate::cli::{GlobalOptions, ResolveArgs};
use crate::output;
use anyhow::{anyhow, Result};
use falcon_core::{RuntimeConfig, SensorType};
use falcon_image::{ImageError, ImageRepository, LockInputs, ResolvedImage};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Outcome printed for a resolution
#[derive(Debug, Serialize)]
struct ResolveOutcome {
    sensor: SensorType,
    tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    locked: bool,
}

pub async fn run(args: ResolveArgs, global: &GlobalOptions) -> Result<()> {
    let lock = LockInputs {
        observed_tag: args.observed_tag.as_deref(),
        requested_version: args.version.as_deref(),
        has_update_policy: args.update_policy.as_deref().is_some_and(|p| !p.is_empty()),
        auto_updating: args.auto_update,
    };

    if lock.is_locked() {
        let tag = args.observed_tag.clone().unwrap_or_default();
        info!(sensor = %args.sensor, tag = %tag, "Observed tag still satisfies the request");
        return print_outcome(
            &ResolveOutcome {
                sensor: args.sensor,
                tag,
                image: None,
                locked: true,
            },
            args.json,
        );
    }

    let config = load_config(global)?;
    let deadline = Duration::from_secs(config.network.http_timeout_secs);

    let spinner = (!args.json).then(|| output::spinner(&format!("Resolving {} image", args.sensor)));
    let result = tokio::time::timeout(deadline, resolve(&args, &config)).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let resolved = match result {
        Ok(Ok(resolved)) => resolved,
        Ok(Err(e)) => return Err(requeue(e, &config)),
        Err(_) => {
            let e = anyhow!(
                "Resolution did not finish within {}s",
                config.network.http_timeout_secs
            );
            return Err(requeue(e, &config));
        }
    };

    print_outcome(
        &ResolveOutcome {
            sensor: args.sensor,
            image: Some(resolved.image()),
            tag: resolved.tag,
            locked: false,
        },
        args.json,
    )
}

async fn resolve(args: &ResolveArgs, config: &RuntimeConfig) -> Result<ResolvedImage> {
    let api = connect_api(config).await?;
    let registry = registry_client(config, &api).await?;

    let repository = ImageRepository::new(Arc::new(api), Arc::new(registry), config.falcon.cloud)
        .with_probe(architecture_probe(args.arch.as_deref()));

    debug!(
        sensor = %args.sensor,
        version = args.version.as_deref().unwrap_or(""),
        policy = args.update_policy.as_deref().unwrap_or(""),
        "Resolving sensor image"
    );

    let resolved = repository
        .preferred_image(
            args.sensor,
            args.version.as_deref(),
            args.update_policy.as_deref(),
        )
        .await?;
    Ok(resolved)
}

/// Attach the requeue delay to a failed resolution
fn requeue(err: anyhow::Error, config: &RuntimeConfig) -> anyhow::Error {
    let delay = config.reconcile.requeue_delay_secs;
    let hint = match err.downcast_ref::<ImageError>() {
        Some(e) if e.is_configuration_error() => {
            "check the update policy configured in Falcon"
        }
        _ => "the failure may be transient",
    };
    output::warning(&format!("Requeueing in {}s ({})", delay, hint));
    err.context(format!("Image resolution failed; retry after {}s", delay))
}

fn print_outcome(outcome: &ResolveOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    if outcome.locked {
        output::info(&format!(
            "Keeping {} (observed tag still satisfies the request)",
            outcome.tag
        ));
    } else {
        output::success(&format!("Resolved {} sensor", outcome.sensor));
    }
    output::kv("Tag", &outcome.tag);
    if let Some(image) = &outcome.image {
        output::kv("Image", image);
    }
    Ok(())
}
