//! Autocr CLI - command-line interface for the autocr static code reviewer.

mod config;
mod locale;
mod logging;
mod output;
mod stdin;

use std::io::Read;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use autocr_core::reporter::{OutputMode, render_notification};
use autocr_core::scan::{ScanRequest, run_scan};

#[derive(Parser, Debug)]
#[command(
    name = "autocr",
    version,
    about = "Static code reviewer for JavaScript/TypeScript",
    long_about = "Autocr scans JavaScript/TypeScript sources for structural and\n\
                  performance problems: deep relative imports, import cycles,\n\
                  swallowed errors, and hot-path pitfalls."
)]
pub struct Cli {
    /// Files or directories to scan
    #[arg(value_name = "PATHS")]
    pub paths: Vec<PathBuf>,

    /// Read additional paths from stdin (newline- or NUL-separated)
    #[arg(long)]
    pub stdin: bool,

    /// Configuration file (defaults to the nearest autocr.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Ignore file (defaults to .autocrignore in the working directory)
    #[arg(long, value_name = "FILE")]
    pub ignore_file: Option<PathBuf>,

    /// tsconfig.json used for alias resolution, overriding discovery
    #[arg(long, value_name = "FILE")]
    pub tsconfig: Option<PathBuf>,

    /// Report language (zh, en)
    #[arg(long, value_name = "LANG")]
    pub lang: Option<String>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init();
    configure_colors(&cli);

    let output = match cli.format.as_str() {
        "json" => OutputMode::Json,
        "text" => OutputMode::Text,
        other => anyhow::bail!("invalid format '{other}'. Valid values: text, json"),
    };

    let cwd = std::env::current_dir()?;
    let config_result = config::load(cli.config.as_deref(), &cwd);
    let ignore = config::resolve_ignore(cli.ignore_file.as_deref(), &cwd, &config_result.config);

    let mut paths = cli.paths.clone();
    if cli.stdin {
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes)?;
        paths.extend(stdin::parse_paths(&bytes).into_iter().map(PathBuf::from));
    }

    if output == OutputMode::Text {
        let mut stderr = std::io::stderr().lock();
        for warning in &config_result.warnings {
            let _ = render_notification(warning, &mut stderr);
        }
    }

    let mut request = ScanRequest::new(paths, cwd);
    request.rule_settings = config_result.config.rules.clone();
    request.ignore = ignore;
    request.locale = locale::detect(cli.lang.as_deref());
    request.output = output;
    request.tsconfig_path = cli.tsconfig.clone();

    let summary = run_scan(&request);

    if output == OutputMode::Json {
        println!("{}", output::json::render(&summary, &config_result.warnings));
    }

    std::process::exit(summary.exit_code());
}

fn configure_colors(cli: &Cli) {
    if cli.no_color || std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_positional_paths() {
        let cli = Cli::try_parse_from(["autocr", "src", "lib/a.ts"]).unwrap();
        assert_eq!(cli.paths.len(), 2);
        assert_eq!(cli.format, "text");
        assert!(!cli.stdin);
    }

    #[test]
    fn cli_parses_format_and_lang() {
        let cli =
            Cli::try_parse_from(["autocr", "src", "--format", "json", "--lang", "en"]).unwrap();
        assert_eq!(cli.format, "json");
        assert_eq!(cli.lang.as_deref(), Some("en"));
    }

    #[test]
    fn cli_parses_config_and_ignore_file() {
        let cli = Cli::try_parse_from([
            "autocr",
            "src",
            "--config",
            "autocr.toml",
            "--ignore-file",
            ".autocrignore",
            "--tsconfig",
            "tsconfig.json",
        ])
        .unwrap();
        assert!(cli.config.is_some());
        assert!(cli.ignore_file.is_some());
        assert!(cli.tsconfig.is_some());
    }

    #[test]
    fn cli_parses_stdin_flag_without_paths() {
        let cli = Cli::try_parse_from(["autocr", "--stdin"]).unwrap();
        assert!(cli.stdin);
        assert!(cli.paths.is_empty());
    }

    #[test]
    fn cli_help_mentions_key_options() {
        let mut command = Cli::command();
        let help = command.render_help().to_string();
        assert!(help.contains("--format"));
        assert!(help.contains("--lang"));
        assert!(help.contains("--stdin"));
    }
}
