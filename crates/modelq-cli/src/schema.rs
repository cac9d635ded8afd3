use crate::cli::SourceArgs;
use crate::config::{self, ProjectConfig};
use crate::loader::{DbSchema, LoaderRegistry};

/// Print the loaded schema as pretty JSON on stdout.
pub async fn run(args: SourceArgs, registry: &LoaderRegistry) -> anyhow::Result<()> {
    let project = ProjectConfig::load_or_default(&args.config)?;
    let source = config::resolve_source(&args, &project)?;

    let schema = registry
        .load(source.dialect, &source.url, &source.schema, &source.tables)
        .await?;
    println!("{}", render(&schema)?);
    Ok(())
}

fn render(schema: &DbSchema) -> anyhow::Result<String> {
    serde_json::to_string_pretty(schema)
        .map_err(|e| anyhow::anyhow!("failed to serialize schema: {e}"))
}
