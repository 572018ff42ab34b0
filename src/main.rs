//! konfig CLI
//!
//! Resolves a layered YAML configuration the same way an application using
//! the library would, and prints values, the whole tree, or override names.

use anyhow::{Context, Result};
use clap::Parser;
use konfig::cli::{Cli, Command, DumpFormat, ModeArg};
use konfig::logging::{self, LogTarget};
use konfig::provider::{self, ConfigProvider, ProviderMode, YamlProvider};
use konfig::{Resolver, codec, settings::split_dotted};
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let target: LogTarget = cli.log.parse()?;
    logging::init(&target, cli.verbose)?;
    cli.validate()?;

    match &cli.command {
        Command::EnvName { path } => {
            let prefix = cli.prefix.clone().unwrap_or_else(konfig::env_prefix);
            println!("{}", codec::path_to_env_name(&split_dotted(path), &prefix));
        }
        Command::Get { path } => {
            let settings = build_resolver(&cli)?.resolve()?;
            let value = settings.lookup(path)?;
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        Command::Dump { format } => {
            let settings = build_resolver(&cli)?.resolve()?;
            match format {
                DumpFormat::Json => println!("{}", serde_json::to_string_pretty(&settings)?),
                DumpFormat::Yaml => print!("{}", serde_yaml::to_string(&settings)?),
            }
        }
        Command::Env => {
            let resolver = build_resolver(&cli)?;
            let settings = resolver.resolve()?;
            for (name, value) in settings.env_names(&resolver.env_prefix()) {
                println!("{name}={value}");
            }
        }
        Command::Sources => {
            let resolution = build_resolver(&cli)?.resolve_detailed()?;
            for source in &resolution.sources {
                println!("file {}", source.display());
            }
            for entry in &resolution.overrides {
                println!("env  {} -> {}", entry.env_name, entry.path.join("."));
            }
        }
    }

    Ok(())
}

/// Pick the provider for the CLI flags and apply per-run options.
fn build_resolver(cli: &Cli) -> Result<Resolver> {
    let provider: Box<dyn ConfigProvider> = match cli.mode {
        ModeArg::Yaml if !cli.files.is_empty() => {
            Box::new(YamlProvider::with_files(&cli.workdir, cli.files.clone())?)
        }
        ModeArg::Yaml => provider::provider(ProviderMode::Yaml, Some(&cli.workdir))?,
        ModeArg::Directory => provider::provider(ProviderMode::Directory, Some(&cli.workdir))?,
    };

    let mut resolver = provider
        .resolver()
        .with_context(|| format!("cannot load config from {}", cli.workdir.display()))?;
    if let Some(prefix) = &cli.prefix {
        resolver = resolver.with_env_prefix(prefix.clone());
    }
    if cli.no_templates {
        resolver = resolver.without_templates();
    }
    debug!(files = ?resolver.files(), prefix = %resolver.env_prefix(), "Resolving configuration");
    Ok(resolver)
}
