mod cli;
mod codegen;
mod config;
mod generate;
mod loader;
mod mysql_loader;
mod postgres_loader;
mod schema;
mod type_mapper;
mod write;

pub mod logging;

pub use loader::{ColumnInfo, DbSchema, KeyKind, LoaderRegistry, SchemaLoader};

pub async fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    let registry = LoaderRegistry::with_builtin();
    match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            Ok(())
        }
        cli::Command::Gen(args) => generate::run(args, &registry).await,
        cli::Command::Schema(args) => schema::run(args, &registry).await,
    }
}
