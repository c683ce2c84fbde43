//! CLI: model files → (accessor code | per-field explanation)
use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::codegen::Codegen;
use crate::config::Config;
use crate::field::{AnnotationKind, RestorePolicy};
use crate::model::Model;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate save/restore statements for the persisted fields of a declaration model
#[derive(Parser, Debug)]
#[command(name = "stowage")]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// emit the save/restore bodies of every class
    Generate(GenerateOut),
    /// print the strategy chosen for every field as JSON
    Explain(ExplainOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more model files. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// JSON configuration file (defaults apply when omitted)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// which annotated fields to process
    #[arg(long, value_enum, default_value_t = KindArg::Retained)]
    kind: KindArg,

    /// global restore policy, overrides the configuration file
    #[arg(long, value_enum)]
    restore_policy: Option<RestorePolicyArg>,

    /// tracing filter used when RUST_LOG is unset (e.g. `debug`, `stowage=trace`)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct ExplainOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum KindArg {
    Retained,
    Argument,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum RestorePolicyArg {
    Default,
    Overwrite,
    IfNull,
    IfNotNull,
}

impl From<KindArg> for AnnotationKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Retained => AnnotationKind::Retained,
            KindArg::Argument => AnnotationKind::Argument,
        }
    }
}

impl From<RestorePolicyArg> for RestorePolicy {
    fn from(value: RestorePolicyArg) -> Self {
        match value {
            RestorePolicyArg::Default => RestorePolicy::Default,
            RestorePolicyArg::Overwrite => RestorePolicy::Overwrite,
            RestorePolicyArg::IfNull => RestorePolicy::IfNull,
            RestorePolicyArg::IfNotNull => RestorePolicy::IfNotNull,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Config file, then flag overrides. Installs logging as a side effect so
    /// the model load is already traced.
    fn load(&self) -> Result<(Config, Model)> {
        let mut config = match self.config.as_ref() {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(policy) = self.restore_policy {
            config.restore_policy = policy.into();
        }
        if let Some(level) = self.log_level.as_ref() {
            config.log_level = level.clone();
        }
        init_tracing(&config.log_level);

        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        info!(files = source_paths.len(), "loading model");
        let model = Model::load(&source_paths)?;
        Ok((config, model))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Generate(target) => {
                let (config, model) = target.input_settings.load()?;
                let kind = target.input_settings.kind.into();
                let cg = Codegen::new(&model, &config);

                let mut generated = Vec::new();
                let mut failures = 0usize;
                for result in cg.generate_all(kind) {
                    match result {
                        Ok(accessor) => generated.push(accessor),
                        Err(error) => {
                            failures += 1;
                            eprintln!("{} {error}: {}", "✗".red(), error.source.to_string().red());
                        }
                    }
                }
                let src = Codegen::render(&generated);
                write_output(target.out.as_deref(), &src)?;
                if failures > 0 {
                    bail!("{failures} class(es) failed to generate");
                }
                Ok(())
            }
            Command::Explain(target) => {
                let (config, model) = target.input_settings.load()?;
                let cg = Codegen::new(&model, &config);
                let report = cg.explain(target.input_settings.kind.into());
                let src = serde_json::to_string_pretty(&report)?;
                write_output(target.out.as_deref(), &src)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // a second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn write_output(out: Option<&Path>, src: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, src).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{src}");
            Ok(())
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_paths_pass_through() {
        let paths = resolve_file_path_patterns(["a.json", "dir/b.json"]).unwrap();
        assert_eq!(paths, [PathBuf::from("a.json"), PathBuf::from("dir/b.json")]);
    }

    #[test]
    fn empty_glob_is_an_error() {
        let err = resolve_file_path_patterns(["/nonexistent-stowage-dir/*.json"]).unwrap_err();
        assert!(err.to_string().contains("matched no files"));
    }

    #[test]
    fn arguments_parse() {
        let cli = CommandLineInterface::try_parse_from([
            "stowage", "generate", "--input", "a.json", "b.json", "--kind", "argument", "--restore-policy", "if-null",
        ])
        .unwrap();
        let Command::Generate(target) = cli.cmd else { panic!("expected generate") };
        assert_eq!(target.input_settings.input, ["a.json", "b.json"]);
        assert_eq!(AnnotationKind::from(target.input_settings.kind), AnnotationKind::Argument);
        assert_eq!(target.input_settings.restore_policy, Some(RestorePolicyArg::IfNull));
    }
}
