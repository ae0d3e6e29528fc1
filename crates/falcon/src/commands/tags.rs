//! Tags command

use super::{connect_api, load_config, registry_client};
use crate::cli::{GlobalOptions, TagsArgs};
use crate::output;
use anyhow::Result;
use falcon_image::{TagPredicate, TagRegistry};
use tracing::debug;

pub async fn run(args: TagsArgs, global: &GlobalOptions) -> Result<()> {
    let config = load_config(global)?;
    let api = connect_api(&config).await?;
    let registry = registry_client(&config, &api).await?;

    let repository = registry.repository(args.sensor);
    let spinner = (!args.json).then(|| output::spinner(&format!("Listing tags in {}", repository)));
    let listed = registry.list_tags(&repository).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let mut tags = listed?;
    debug!(repository = %repository, count = tags.len(), "Listed tags");

    if args.eligible || args.version.is_some() {
        let predicate = TagPredicate::new(args.sensor, config.falcon.cloud, args.version.as_deref());
        tags.retain(|tag| predicate.matches(tag));
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&tags)?);
        return Ok(());
    }

    output::header(&format!("Tags in {}", repository));
    if tags.is_empty() {
        output::warning("No tags found");
        return Ok(());
    }
    for tag in &tags {
        println!("  {}", tag);
    }
    println!();
    output::info(&format!("{} tag(s)", tags.len()));
    Ok(())
}
