mod clear;
mod lint;
mod reporter;
mod watch;

use clap::{Args, Parser, Subcommand};
use lintwatch_core::config::RunnerConfig;
use lintwatch_core::engine::EngineCommand;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "lintwatch",
    version,
    about = "Incremental lint runner that only re-checks files that changed",
    long_about = "Lintwatch walks a source tree, runs an external linter on files that are new, \
                  modified, or failed last time, and remembers which files came back clean so \
                  the next run can skip them. In watch mode it re-runs on every save."
)]
pub struct Cli {
    /// Also print logs to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lint every file that changed since the last clean run
    Lint(RunArgs),
    /// Lint once, then re-lint whenever files change
    #[command(
        long_about = "Runs an initial lint, then watches the source tree. Saving a file triggers \
                      a new run; changes made while a run is in progress are folded into one \
                      follow-up run. Stop with Ctrl+C."
    )]
    Watch {
        #[command(flatten)]
        run: RunArgs,

        /// Quiet period after a change before linting starts
        #[arg(long, value_name = "MS", default_value_t = 200)]
        debounce_ms: u64,
    },
    /// Delete the lint cache so every file is checked again
    Clear {
        /// Source root whose default cache should be removed. Defaults to current directory.
        #[arg(value_name = "SOURCE_PATH")]
        path: Option<PathBuf>,

        /// Explicit cache file to remove
        #[arg(long, value_name = "FILE")]
        cache: Option<PathBuf>,
    },
}

#[derive(Args, Clone)]
pub struct RunArgs {
    /// Source root to lint. Defaults to current directory.
    #[arg(value_name = "SOURCE_PATH")]
    pub path: Option<PathBuf>,

    /// Cache file location (default: <SOURCE_PATH>/.cache/lint.json, or $LINTWATCH_CACHE)
    #[arg(long, value_name = "FILE")]
    pub cache: Option<PathBuf>,

    /// Extra gitignore-style pattern to skip; repeatable
    #[arg(long, value_name = "GLOB")]
    pub ignore: Vec<String>,

    /// Drop the built-in ignore list (*.json, *.html, *.css, .DS_Store, node_modules/)
    #[arg(long)]
    pub no_default_ignore: bool,

    /// Maximum number of files linted at once
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Linter command; `{path}` is replaced by the file path, content goes to stdin
    #[arg(long, value_name = "COMMAND")]
    pub engine: Option<String>,

    /// Also lint hidden files and files excluded by .gitignore
    #[arg(long)]
    pub all_files: bool,

    /// Print warnings as well as errors
    #[arg(long)]
    pub warnings: bool,
}

impl RunArgs {
    pub fn to_config(&self) -> Result<RunnerConfig, Box<dyn std::error::Error>> {
        let root = match &self.path {
            Some(path) => path.clone(),
            None => std::env::current_dir()?,
        };
        let mut config = RunnerConfig::new(root);

        if let Some(cache) = &self.cache {
            config = config.with_cache_path(cache);
        }

        let mut ignore = if self.no_default_ignore {
            Vec::new()
        } else {
            config.ignore.clone()
        };
        ignore.extend(self.ignore.iter().cloned());
        config = config.with_ignore(ignore);

        config = config.with_standard_filters(!self.all_files);

        if let Some(jobs) = self.jobs {
            config = config.with_concurrency(jobs);
        }

        if let Some(engine) = &self.engine {
            let words = shlex::split(engine).ok_or("unbalanced quotes in --engine")?;
            let command = EngineCommand::from_words(words).ok_or("--engine must not be empty")?;
            config = config.with_engine(command);
        }

        Ok(config)
    }
}

/// Returns whether the run ended clean.
pub fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _guard = lintwatch_core::logging::init_logging("cli", cli.verbose);

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Lint(args) => rt.block_on(lint::run(args)),
        Commands::Watch { run, debounce_ms } => {
            rt.block_on(watch::run(run, Duration::from_millis(debounce_ms)))
        }
        Commands::Clear { path, cache } => clear::run(path, cache),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("lintwatch").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_lint_args_build_config() {
        let cli = parse(&[
            "lint",
            "/tmp",
            "--cache",
            "/var/cache/lint.json",
            "--ignore",
            "dist/",
            "--jobs",
            "3",
            "--engine",
            "npx eslint --format json --stdin --stdin-filename '{path}'",
        ]);
        let Commands::Lint(args) = cli.command else {
            panic!("expected lint command");
        };
        let config = args.to_config().unwrap();

        assert_eq!(config.cache_path, PathBuf::from("/var/cache/lint.json"));
        assert!(config.ignore.contains(&"dist/".to_string()));
        assert!(config.ignore.contains(&"*.json".to_string()));
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.engine.program, "npx");
        assert_eq!(config.engine.args.last().map(String::as_str), Some("{path}"));
    }

    #[test]
    fn test_no_default_ignore() {
        let cli = parse(&["lint", "/tmp", "--no-default-ignore", "--ignore", "*.min.js"]);
        let Commands::Lint(args) = cli.command else {
            panic!("expected lint command");
        };
        assert_eq!(args.to_config().unwrap().ignore, vec!["*.min.js".to_string()]);
    }

    #[test]
    fn test_all_files_turns_off_standard_filters() {
        let cli = parse(&["lint", "/tmp", "--all-files"]);
        let Commands::Lint(args) = cli.command else {
            panic!("expected lint command");
        };
        assert!(!args.to_config().unwrap().standard_filters);

        let cli = parse(&["lint", "/tmp"]);
        let Commands::Lint(args) = cli.command else {
            panic!("expected lint command");
        };
        assert!(args.to_config().unwrap().standard_filters);
    }

    #[test]
    fn test_watch_debounce_flag() {
        let cli = parse(&["-v", "watch", "--debounce-ms", "50"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Watch { debounce_ms, run } => {
                assert_eq!(debounce_ms, 50);
                assert!(run.path.is_none());
            }
            _ => panic!("expected watch command"),
        }
    }
}
