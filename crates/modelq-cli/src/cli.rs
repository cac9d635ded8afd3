use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Gen,
    Schema,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Gen(GenArgs),
    Schema(SourceArgs),
}

/// Where to read the schema from. Flags override `modelq.toml`.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceArgs {
    pub config: PathBuf,
    pub driver: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub tables: Option<Vec<String>>,
}

impl Default for SourceArgs {
    fn default() -> Self {
        Self {
            config: PathBuf::from("modelq.toml"),
            driver: None,
            database: None,
            schema: None,
            tables: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenArgs {
    pub source: SourceArgs,
    pub out: Option<PathBuf>,
    pub touch_timestamp: bool,
    pub workers: Option<usize>,
    pub dry_run: bool,
    pub check: bool,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" => Ok(Command::Help(HelpTopic::Root)),
        "gen" => parse_gen(it.map(|s| s.as_str())),
        "schema" => parse_schema(it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

/// Returns the value for `--name VALUE` or `--name=VALUE`, or `None` when
/// `token` is a different flag.
fn flag_value<'a>(
    name: &str,
    token: &'a str,
    it: &mut impl Iterator<Item = &'a str>,
) -> anyhow::Result<Option<&'a str>> {
    if token == name {
        let Some(v) = it.next() else {
            anyhow::bail!("{name} requires a value");
        };
        return Ok(Some(v));
    }
    Ok(token
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix('=')))
}

/// Consume a source flag. Returns `false` when `token` is not one.
fn parse_source_flag<'a>(
    source: &mut SourceArgs,
    token: &'a str,
    it: &mut impl Iterator<Item = &'a str>,
) -> anyhow::Result<bool> {
    if let Some(v) = flag_value("--config", token, it)? {
        source.config = PathBuf::from(v);
    } else if let Some(v) = flag_value("--driver", token, it)? {
        source.driver = Some(v.to_string());
    } else if let Some(v) = flag_value("--database", token, it)? {
        source.database = Some(v.to_string());
    } else if let Some(v) = flag_value("--schema", token, it)? {
        source.schema = Some(v.to_string());
    } else if let Some(v) = flag_value("--tables", token, it)? {
        let parsed = split_csv(v);
        if parsed.is_empty() {
            anyhow::bail!("--tables must not be empty");
        }
        source.tables = Some(parsed);
    } else {
        return Ok(false);
    }
    Ok(true)
}

fn parse_gen<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut args = GenArgs::default();

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Gen)),
            "--touch-timestamp" => args.touch_timestamp = true,
            "--dry-run" => args.dry_run = true,
            "--check" => args.check = true,
            _ if parse_source_flag(&mut args.source, token, &mut it)? => {}
            _ => {
                if let Some(v) = flag_value("--out", token, &mut it)? {
                    args.out = Some(PathBuf::from(v));
                } else if let Some(v) = flag_value("--workers", token, &mut it)? {
                    let n: usize = v
                        .parse()
                        .map_err(|_| anyhow::anyhow!("--workers expects a number, got {v}"))?;
                    if n == 0 {
                        anyhow::bail!("--workers must be at least 1");
                    }
                    args.workers = Some(n);
                } else {
                    anyhow::bail!("unknown argument: {token}");
                }
            }
        }
    }

    if args.dry_run && args.check {
        anyhow::bail!("--dry-run and --check are mutually exclusive");
    }

    Ok(Command::Gen(args))
}

fn parse_schema<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut source = SourceArgs::default();

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Schema)),
            _ if parse_source_flag(&mut source, token, &mut it)? => {}
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    Ok(Command::Schema(source))
}

fn split_csv(v: &str) -> Vec<String> {
    v.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
modelq - generate typed data-access models from a database schema

USAGE:
  modelq <COMMAND> [OPTIONS]

COMMANDS:
  gen           Generate one Rust module per table
  schema        Print the loaded table schema as JSON

Run `modelq <command> --help` for more."
            );
        }
        HelpTopic::Gen => {
            println!(
                "\
USAGE:
  modelq gen [OPTIONS]

SOURCE OPTIONS:
  --config <FILE>       Config file path (default: modelq.toml)
  --driver <NAME>       mysql | postgres (default: postgres)
  --database <URL>      postgres:// or mysql:// URL, overrides database.url
  --schema <NAME>       Schema / database name (postgres default: public)
  --tables <a,b,...>    Only these tables (default: all)

GEN OPTIONS:
  --out <DIR>           Output directory (default: models)
  --touch-timestamp     Write timestamp columns the database fills itself
  --workers <N>         Tables generated concurrently (default: 4)
  --dry-run             Print files that would change
  --check               Exit non-zero if output would change
  -h, --help            Print help"
            );
        }
        HelpTopic::Schema => {
            println!(
                "\
USAGE:
  modelq schema [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: modelq.toml)
  --driver <NAME>       mysql | postgres (default: postgres)
  --database <URL>      postgres:// or mysql:// URL, overrides database.url
  --schema <NAME>       Schema / database name (postgres default: public)
  --tables <a,b,...>    Only these tables (default: all)
  -h, --help            Print help"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("modelq")
            .chain(list.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn no_args_prints_root_help() {
        let cmd = parse_args(&args(&[])).unwrap();
        assert!(matches!(cmd, Command::Help(HelpTopic::Root)));
    }

    #[test]
    fn parse_gen_with_all_flags() {
        let cmd = parse_args(&args(&[
            "gen",
            "--driver",
            "postgres",
            "--database=postgres://localhost/app",
            "--schema",
            "billing",
            "--tables",
            "user, invoice,,",
            "--out",
            "src/models",
            "--touch-timestamp",
            "--workers=8",
            "--dry-run",
        ]))
        .unwrap();
        let Command::Gen(gen_args) = cmd else {
            panic!("expected gen");
        };

        assert_eq!(gen_args.source.config, PathBuf::from("modelq.toml"));
        assert_eq!(gen_args.source.driver.as_deref(), Some("postgres"));
        assert_eq!(
            gen_args.source.database.as_deref(),
            Some("postgres://localhost/app")
        );
        assert_eq!(gen_args.source.schema.as_deref(), Some("billing"));
        assert_eq!(
            gen_args.source.tables,
            Some(vec!["user".to_string(), "invoice".to_string()])
        );
        assert_eq!(gen_args.out, Some(PathBuf::from("src/models")));
        assert!(gen_args.touch_timestamp);
        assert_eq!(gen_args.workers, Some(8));
        assert!(gen_args.dry_run);
        assert!(!gen_args.check);
    }

    #[test]
    fn parse_schema_command() {
        let cmd = parse_args(&args(&["schema", "--config", "db/modelq.toml"])).unwrap();
        let Command::Schema(source) = cmd else {
            panic!("expected schema");
        };
        assert_eq!(source.config, PathBuf::from("db/modelq.toml"));
        assert!(source.tables.is_none());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_args(&args(&["migrate"])).is_err());
        assert!(parse_args(&args(&["gen", "--bogus"])).is_err());
        assert!(parse_args(&args(&["gen", "--database"])).is_err());
        assert!(parse_args(&args(&["gen", "--tables", ","])).is_err());
        assert!(parse_args(&args(&["gen", "--workers", "0"])).is_err());
        assert!(parse_args(&args(&["gen", "--dry-run", "--check"])).is_err());
        assert!(parse_args(&args(&["schema", "--out", "x"])).is_err());
    }

    #[test]
    fn help_flags() {
        let cmd = parse_args(&args(&["gen", "-h"])).unwrap();
        assert!(matches!(cmd, Command::Help(HelpTopic::Gen)));
        let cmd = parse_args(&args(&["schema", "--help"])).unwrap();
        assert!(matches!(cmd, Command::Help(HelpTopic::Schema)));
    }
}
