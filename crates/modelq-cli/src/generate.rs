use crate::cli::GenArgs;
use crate::codegen::{self, CodeConfig, GeneratedTable};
use crate::config::{self, ProjectConfig};
use crate::loader::{DbSchema, LoaderRegistry};
use crate::write::{self, WriteOptions};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};

/// Outcome of generating every table in a schema.
#[derive(Debug, Default)]
pub struct FanOut {
    pub generated: Vec<GeneratedTable>,
    /// `(table, error)` pairs.
    pub failed: Vec<(String, String)>,
}

pub async fn run(args: GenArgs, registry: &LoaderRegistry) -> anyhow::Result<()> {
    let project = ProjectConfig::load_or_default(&args.source.config)?;
    let settings = config::resolve_gen(&args, &project)?;
    let source = &settings.source;

    let schema = registry
        .load(source.dialect, &source.url, &source.schema, &source.tables)
        .await?;
    for t in source.tables.iter().filter(|t| !schema.contains_key(*t)) {
        tracing::warn!(table = %t, "table not found in schema");
    }
    if schema.is_empty() {
        anyhow::bail!("no tables found in schema {}", source.schema);
    }

    let cfg = Arc::new(CodeConfig {
        dialect: source.dialect,
        schema: source.schema.clone(),
        out: settings.out.clone(),
        touch_timestamp: settings.touch_timestamp,
    });

    let outcome = generate_all(schema, cfg.clone(), settings.workers).await;

    let mut files: Vec<codegen::GeneratedFile> =
        outcome.generated.iter().map(|t| t.file.clone()).collect();
    if !outcome.generated.is_empty() {
        files.push(codegen::generate_mod_rs(&outcome.generated, &cfg)?);
    }

    let summary = write::apply_generated_files(
        &files,
        WriteOptions {
            dry_run: args.dry_run,
            check: args.check,
        },
    )?;
    tracing::info!(
        tables = outcome.generated.len(),
        written = summary.written.len(),
        unchanged = summary.unchanged,
        out = %settings.out.display(),
        "generation finished"
    );

    if !outcome.failed.is_empty() {
        let names: Vec<&str> = outcome.failed.iter().map(|(t, _)| t.as_str()).collect();
        anyhow::bail!(
            "code generation failed for {} table(s): {}",
            names.len(),
            names.join(", ")
        );
    }
    Ok(())
}

/// Generate one module per table on at most `workers` concurrent tasks.
///
/// Every table reports back on one channel; the receiver waits for exactly
/// as many results as there are tables and logs one line per table.
pub async fn generate_all(schema: DbSchema, cfg: Arc<CodeConfig>, workers: usize) -> FanOut {
    let total = schema.len();
    let mut pending: BTreeSet<String> = schema.keys().cloned().collect();
    let permits = Arc::new(Semaphore::new(workers.max(1)));
    let (tx, mut rx) = mpsc::channel(total.max(1));

    for (table, columns) in schema {
        let tx = tx.clone();
        let cfg = cfg.clone();
        let permits = permits.clone();
        tokio::spawn(async move {
            let result = match permits.acquire_owned().await {
                Ok(_permit) => codegen::generate_table(&table, &columns, &cfg),
                Err(e) => Err(anyhow::anyhow!("worker pool closed: {e}")),
            };
            let _ = tx.send((table, result)).await;
        });
    }
    drop(tx);

    let mut out = FanOut::default();
    for _ in 0..total {
        let Some((table, result)) = rx.recv().await else {
            break;
        };
        pending.remove(&table);
        match result {
            Ok(generated) => {
                tracing::info!(
                    table = %table,
                    path = %generated.file.path.display(),
                    "code generated"
                );
                out.generated.push(generated);
            }
            Err(e) => {
                tracing::error!(table = %table, error = %e, "code generation failed");
                out.failed.push((table, e.to_string()));
            }
        }
    }

    for table in pending {
        tracing::error!(table = %table, "generation task did not complete");
        out.failed
            .push((table, "generation task did not complete".to_string()));
    }

    out.generated.sort_by(|a, b| a.table.cmp(&b.table));
    out
}
