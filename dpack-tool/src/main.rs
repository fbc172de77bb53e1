use clap::Parser;
use dpack_lib::Config;
use std::{collections::HashMap, env, fs};

use dpack_tool::packaging::{self, Compressor};
use dpack_tool::{fs_utils, naming, shell_exec};

#[derive(Parser, Debug)]
#[command(author, version, about = "dpack deployment packaging tool", long_about = None)]
pub struct Cli {
    /// Output archive path or directory (supports %datetime%/%rand% placeholders)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Dry run (list planned entries and parameters without writing)
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    pub dry: bool,

    /// Abort if total input size exceeds this limit (e.g. 512Mi, 2GB, 1048576)
    #[arg(short, long)]
    pub max_size: Option<String>,

    /// Command to execute before packaging
    #[arg(short, long)]
    pub before: Option<String>,

    /// Command to execute after packaging
    #[arg(short, long)]
    pub after: Option<String>,

    /// Patterns to skip (can be specified multiple times)
    #[arg(short = 's', long)]
    pub skip: Vec<String>,

    /// Store entries uncompressed instead of deflate
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub store: bool,

    /// Generate YAML config to stdout
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub generate_yaml_config: bool,

    /// Files or directories to package
    #[arg()]
    pub paths: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Merge configuration sources by priority: env < file < CLI
    let env_config = read_env()?;
    let mut file_config = Config::default();
    if let Some(path) = cli.config.clone().or(env_config.config.clone()) {
        file_config = read_config_file(&path)?;
    }
    let merged = merge_configs(env_config, file_config, cli_to_config(&cli)?);

    if cli.generate_yaml_config {
        println!("{}", serde_yaml::to_string(&merged)?);
        return Ok(());
    }

    let sources = merged.paths.clone().unwrap_or_default();
    if sources.is_empty() {
        eprintln!(
            "Error: at least one path must be provided (CLI argument, config:paths, or DPACK_PATHS)"
        );
        std::process::exit(3);
    }

    let skip = fs_utils::compile_skip_patterns(merged.skip.as_deref())?;
    let compressor = if merged.store.unwrap_or(false) {
        Compressor::Stored
    } else {
        Compressor::Deflate
    };
    let output = naming::resolve_output_path(merged.output.as_deref().unwrap_or("deploy.zip"))?;

    if merged.dry.unwrap_or(false) {
        println!("--- DRY RUN ---");
        println!("{}", serde_yaml::to_string(&merged)?);
        let (entries, skipped) = packaging::plan_entries(&sources, &skip, false)?;
        let total = fs_utils::total_size(&merged, &entries)?;
        println!("Output: {}", output.display());
        println!("Total files: {} ({skipped} sources skipped)", entries.len());
        println!("Total size: {}", fs_utils::encode_size(total));
        for entry in &entries {
            println!("  {} -> {}", entry.path.display(), entry.name_in_archive);
        }
        return Ok(());
    }

    if let Some(cmd) = &merged.before {
        shell_exec::run_hook("before", cmd)?;
    }

    let summary = packaging::build(&output, &sources, &skip, &merged, compressor)?;
    println!(
        "✅ Successfully created {} ({} entries, {} sources skipped)",
        output.display(),
        summary.added,
        summary.skipped
    );

    if let Some(cmd) = &merged.after {
        shell_exec::run_hook("after", cmd)?;
    }

    Ok(())
}

/// Reads environment variables prefixed with DPACK_
fn read_env() -> anyhow::Result<Config> {
    let mut cfg = Config::default();
    let vars: HashMap<String, String> = env::vars().collect();

    macro_rules! get_env {
        ($key:expr) => {
            vars.get(&format!("DPACK_{}", $key)).cloned()
        };
    }

    cfg.output = get_env!("OUTPUT");
    cfg.config = get_env!("CONFIG");
    cfg.before = get_env!("BEFORE");
    cfg.after = get_env!("AFTER");
    cfg.max_size = get_env!("MAX_SIZE")
        .map(|v| fs_utils::parse_size(&v))
        .transpose()?;
    cfg.dry = get_env!("DRY").map(|v| parse_bool(&v));
    cfg.store = get_env!("STORE").map(|v| parse_bool(&v));
    cfg.paths = get_env!("PATHS").map(|v| split_list(&v));
    cfg.skip = get_env!("SKIP").map(|v| split_list(&v));
    Ok(cfg)
}

fn parse_bool(v: &str) -> bool {
    v == "true" || v == "1" || v.eq_ignore_ascii_case("yes")
}

fn split_list(v: &str) -> Vec<String> {
    v.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Reads YAML or JSON config from file
fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let content = fs::read_to_string(path)?;
    let cfg = if path.to_lowercase().ends_with(".json") {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    Ok(cfg)
}

/// Converts CLI struct into Config
fn cli_to_config(cli: &Cli) -> anyhow::Result<Config> {
    Ok(Config {
        output: cli.output.clone(),
        config: cli.config.clone(),
        dry: cli.dry.then_some(true),
        max_size: cli
            .max_size
            .as_deref()
            .map(fs_utils::parse_size)
            .transpose()?,
        before: cli.before.clone(),
        after: cli.after.clone(),
        paths: if cli.paths.is_empty() {
            None
        } else {
            Some(cli.paths.clone())
        },
        skip: if cli.skip.is_empty() {
            None
        } else {
            Some(cli.skip.clone())
        },
        store: cli.store.then_some(true),
    })
}

/// Merge configs by priority: env < file < cli
fn merge_configs(env: Config, file: Config, cli: Config) -> Config {
    fn pick<T: Clone>(env: Option<T>, file: Option<T>, cli: Option<T>) -> Option<T> {
        cli.or(file).or(env)
    }

    Config {
        output: pick(env.output, file.output, cli.output),
        config: pick(env.config, file.config, cli.config),
        dry: pick(env.dry, file.dry, cli.dry),
        max_size: pick(env.max_size, file.max_size, cli.max_size),
        before: pick(env.before, file.before, cli.before),
        after: pick(env.after, file.after, cli.after),
        paths: pick(env.paths, file.paths, cli.paths),
        skip: pick(env.skip, file.skip, cli.skip),
        store: pick(env.store, file.store, cli.store),
    }
}
