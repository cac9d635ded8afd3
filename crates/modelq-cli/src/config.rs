use crate::cli::{GenArgs, SourceArgs};
use modelq::Dialect;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG: &str = "modelq.toml";
pub const DEFAULT_OUT: &str = "models";
pub const DEFAULT_WORKERS: usize = 4;

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub config_dir: PathBuf,
    pub file: ConfigFile,
}

impl ProjectConfig {
    pub fn load(config_path: &Path) -> anyhow::Result<Self> {
        let config_dir = config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let raw = std::fs::read_to_string(config_path).map_err(|e| {
            anyhow::anyhow!("failed to read config file {}: {e}", config_path.display())
        })?;

        let mut file: ConfigFile = toml::from_str(&raw).map_err(|e| {
            anyhow::anyhow!("failed to parse config file {}: {e}", config_path.display())
        })?;

        file.expand_env()?;

        Ok(Self { config_dir, file })
    }

    /// Load `config_path`, or fall back to an empty config when the default
    /// file is simply absent.
    pub fn load_or_default(config_path: &Path) -> anyhow::Result<Self> {
        if !config_path.exists() && config_path == Path::new(DEFAULT_CONFIG) {
            return Ok(Self {
                config_dir: PathBuf::from("."),
                file: ConfigFile::default(),
            });
        }
        Self::load(config_path)
    }

    pub fn resolve_path(&self, p: impl AsRef<Path>) -> PathBuf {
        let p = p.as_ref();
        if p.is_absolute() || self.config_dir.as_os_str().is_empty() {
            p.to_path_buf()
        } else {
            self.config_dir.join(p)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub codegen: CodegenConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    pub driver: Option<String>,
    pub url: Option<String>,
    pub schema: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodegenConfig {
    pub out: Option<String>,
    #[serde(default)]
    pub tables: Vec<String>,
    #[serde(default)]
    pub touch_timestamp: bool,
    pub workers: Option<usize>,
}

impl ConfigFile {
    fn expand_env(&mut self) -> anyhow::Result<()> {
        for field in [
            &mut self.database.driver,
            &mut self.database.url,
            &mut self.database.schema,
            &mut self.codegen.out,
        ]
        .into_iter()
        .flatten()
        {
            *field = expand_env_vars(field)?;
        }
        for t in &mut self.codegen.tables {
            *t = expand_env_vars(t)?;
        }
        Ok(())
    }
}

/// Where and what to load, after merging flags over the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSettings {
    pub dialect: Dialect,
    pub url: String,
    pub schema: String,
    /// Empty means every table in the schema.
    pub tables: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenSettings {
    pub source: SourceSettings,
    pub out: PathBuf,
    pub touch_timestamp: bool,
    pub workers: usize,
}

pub fn resolve_source(args: &SourceArgs, project: &ProjectConfig) -> anyhow::Result<SourceSettings> {
    let db = &project.file.database;

    let driver = args
        .driver
        .as_deref()
        .or(db.driver.as_deref())
        .unwrap_or("postgres");
    let dialect: Dialect = driver.parse()?;

    let url = args
        .database
        .clone()
        .or_else(|| db.url.clone())
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("no database url: pass --database or set database.url"))?;

    let schema = match args.schema.clone().or_else(|| db.schema.clone()) {
        Some(s) => s,
        None if dialect == Dialect::Postgres => "public".to_string(),
        None => anyhow::bail!("--schema is required for {dialect}"),
    };

    let tables = args
        .tables
        .clone()
        .unwrap_or_else(|| project.file.codegen.tables.clone());

    Ok(SourceSettings {
        dialect,
        url,
        schema,
        tables,
    })
}

pub fn resolve_gen(args: &GenArgs, project: &ProjectConfig) -> anyhow::Result<GenSettings> {
    let source = resolve_source(&args.source, project)?;
    let codegen = &project.file.codegen;

    let out = match (&args.out, &codegen.out) {
        (Some(out), _) => out.clone(),
        (None, Some(out)) => project.resolve_path(out),
        (None, None) => project.resolve_path(DEFAULT_OUT),
    };

    let workers = args.workers.or(codegen.workers).unwrap_or(DEFAULT_WORKERS);
    if workers == 0 {
        anyhow::bail!("codegen.workers must be at least 1");
    }

    Ok(GenSettings {
        source,
        out,
        touch_timestamp: args.touch_timestamp || codegen.touch_timestamp,
        workers,
    })
}

fn expand_env_vars(input: &str) -> anyhow::Result<String> {
    expand_with(input, |key| std::env::var(key).ok())
}

/// Replace every `${NAME}` with `lookup(NAME)`.
fn expand_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut key = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                anyhow::bail!("unterminated env var reference: ${{{key}}}");
            }
            if key.is_empty() {
                anyhow::bail!("invalid env var reference: ${{}}");
            }

            let v = lookup(&key)
                .ok_or_else(|| anyhow::anyhow!("missing env var for config expansion: {key}"))?;
            out.push_str(&v);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(raw: &str) -> ProjectConfig {
        ProjectConfig {
            config_dir: PathBuf::from("db"),
            file: toml::from_str(raw).unwrap(),
        }
    }

    #[test]
    fn expand_with_substitutes_and_rejects_bad_refs() {
        let lookup = |k: &str| (k == "PGHOST").then(|| "db.local".to_string());

        assert_eq!(
            expand_with("postgres://${PGHOST}/app", lookup).unwrap(),
            "postgres://db.local/app"
        );
        assert_eq!(expand_with("plain $ text", lookup).unwrap(), "plain $ text");
        assert!(expand_with("${PGHOST", lookup).is_err());
        assert!(expand_with("${}", lookup).is_err());
        assert!(expand_with("${NOPE}", lookup).is_err());
    }

    #[test]
    fn flags_override_config_file() {
        let p = project(
            r#"
[database]
driver = "postgres"
url = "postgres://file/app"
schema = "billing"

[codegen]
out = "src/models"
tables = ["invoice"]
workers = 2
"#,
        );

        let args = GenArgs {
            source: SourceArgs {
                database: Some("postgres://flag/app".to_string()),
                tables: Some(vec!["user".to_string()]),
                ..SourceArgs::default()
            },
            touch_timestamp: true,
            ..GenArgs::default()
        };

        let s = resolve_gen(&args, &p).unwrap();
        assert_eq!(s.source.dialect, Dialect::Postgres);
        assert_eq!(s.source.url, "postgres://flag/app");
        assert_eq!(s.source.schema, "billing");
        assert_eq!(s.source.tables, vec!["user".to_string()]);
        assert_eq!(s.out, PathBuf::from("db/src/models"));
        assert_eq!(s.workers, 2);
        assert!(s.touch_timestamp);
    }

    #[test]
    fn defaults_apply_when_unset() {
        let p = project("[database]\nurl = \"postgres://x/app\"\n");
        let s = resolve_gen(&GenArgs::default(), &p).unwrap();
        assert_eq!(s.source.schema, "public");
        assert!(s.source.tables.is_empty());
        assert_eq!(s.out, PathBuf::from("db/models"));
        assert_eq!(s.workers, DEFAULT_WORKERS);
        assert!(!s.touch_timestamp);
    }

    #[test]
    fn resolve_rejects_missing_or_unknown_settings() {
        let empty = project("");
        assert!(resolve_source(&SourceArgs::default(), &empty).is_err());

        let mysql = project("[database]\ndriver = \"mysql\"\nurl = \"root@/app\"\n");
        assert!(resolve_source(&SourceArgs::default(), &mysql).is_err());

        let oracle = project("[database]\ndriver = \"oracle\"\nurl = \"x\"\n");
        assert!(resolve_source(&SourceArgs::default(), &oracle).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let parsed: Result<ConfigFile, _> = toml::from_str("[database]\nhost = \"x\"\n");
        assert!(parsed.is_err());
    }
}
