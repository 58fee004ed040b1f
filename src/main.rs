mod cli;

use cat_toolkit::config::Config;
use cat_toolkit::discovery::{self, DiscoveryResult};
use cat_toolkit::external::ClaudePluginValidator;
use cat_toolkit::finding::ValidatorReport;
use cat_toolkit::fixer::marketplace::MarketplaceSyncer;
use cat_toolkit::fixer::ComponentFixer;
use cat_toolkit::output::{self, text, OutputFormat};
use cat_toolkit::validators::{run_validation, ValidationContext};
use clap::Parser;
use cli::Cli;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    let root_dir = resolve_root(cli.root_dir.as_deref()).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(2);
    });

    let mut config = Config::load(cli.config.as_deref()).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(2);
    });
    if cli.no_external {
        config.external.enabled = false;
    }

    let format = cli.output_format();
    if format != OutputFormat::Text {
        colored::control::set_override(false);
    }
    let passed = if cli.fix {
        run_fix(&root_dir, &config, format, cli.dry_run)
    } else {
        let discovery = discovery::discover(&root_dir);
        let report = validate(&discovery, &config);
        print_report(&discovery, &report, format);
        report.all_passed()
    };

    std::process::exit(if passed { 0 } else { 1 });
}

fn init_tracing(cli: &Cli) {
    if cli.quiet {
        return;
    }

    let filter = match cli.verbose {
        0 => "warn,cat_toolkit=info",
        1 => "info,cat_toolkit=debug",
        _ => "debug,cat_toolkit=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

/// Finds the repository root: an explicit `--root-dir`, else the current
/// directory or its closest ancestor holding a `plugins/` directory.
fn resolve_root(explicit: Option<&Path>) -> Result<PathBuf, String> {
    if let Some(path) = explicit {
        if !path.is_dir() {
            return Err(format!("root directory does not exist: {}", path.display()));
        }
        return path
            .canonicalize()
            .map_err(|e| format!("cannot resolve {}: {e}", path.display()));
    }

    let cwd = std::env::current_dir().map_err(|e| format!("cannot read current directory: {e}"))?;
    if cwd.file_name().is_some_and(|n| n == "plugins") {
        return Ok(cwd);
    }
    cwd.ancestors()
        .find(|dir| dir.join("plugins").is_dir())
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            format!(
                "no plugins/ directory found in {} or any parent (use --root-dir)",
                cwd.display()
            )
        })
}

fn validate(discovery: &DiscoveryResult, config: &Config) -> ValidatorReport {
    let external = ClaudePluginValidator::from_config(&config.external);
    let ctx = ValidationContext::new(discovery, config, &external);
    run_validation(&ctx)
}

fn print_report(discovery: &DiscoveryResult, report: &ValidatorReport, format: OutputFormat) {
    if format == OutputFormat::Text {
        print!("{}", text::format_inventory(discovery));
    }
    let formatted = output::format_report(report, format);
    if format == OutputFormat::Text {
        print!("{formatted}");
    } else {
        println!("{formatted}");
    }
}

/// Fix, sync the marketplace, then validate the result. Returns `true`
/// when no step reported an error.
fn run_fix(root_dir: &Path, config: &Config, format: OutputFormat, dry_run: bool) -> bool {
    let plugins_dir = discovery::resolve_plugins_dir(root_dir);

    let mut fixer = ComponentFixer::new(&plugins_dir, dry_run);
    fixer.fix_all();
    let fix_summary = text::format_fix_summary(fixer.results(), dry_run);

    let marketplace = root_dir.join(".claude-plugin").join("marketplace.json");
    let sync = marketplace.is_file().then(|| {
        MarketplaceSyncer::new(&plugins_dir, &marketplace, dry_run).sync_all()
    });
    let sync_summary = sync
        .as_ref()
        .map(|report| text::format_sync_summary(report, dry_run));

    if format == OutputFormat::Text {
        print!("{fix_summary}");
        if let Some(summary) = &sync_summary {
            print!("{summary}");
        }
    } else {
        for line in fix_summary.lines().filter(|l| !l.trim().is_empty()) {
            tracing::info!("{}", line.trim_end());
        }
        for line in sync_summary.iter().flat_map(|s| s.lines()) {
            if !line.trim().is_empty() {
                tracing::info!("{}", line.trim_end());
            }
        }
    }

    tracing::info!("Re-running validation after fixes...");
    let discovery = discovery::discover(root_dir);
    let report = validate(&discovery, config);
    print_report(&discovery, &report, format);

    let sync_ok = sync.as_ref().map_or(true, |r| r.errors.is_empty());
    fixer.error_count() == 0 && sync_ok && report.all_passed()
}
