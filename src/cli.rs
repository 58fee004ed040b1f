use cat_toolkit::output::OutputFormat;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cat-toolkit",
    version,
    about = "Validate and auto-fix Claude Code plugin components",
    long_about = "Discovers the skills, agents, commands and hooks of every plugin under \
                  plugins/, runs the validation passes and prints a report. With --fix, \
                  repairs frontmatter, skill directory names and marketplace drift first."
)]
pub struct Cli {
    /// Directory containing plugins/ (auto-detected from the current directory if omitted)
    #[arg(long, value_name = "PATH")]
    pub root_dir: Option<PathBuf>,

    /// Print the report as JSON (same as --format json)
    #[arg(long, conflicts_with = "format")]
    pub json: bool,

    /// Output format
    #[arg(long, short, default_value = "text", value_enum)]
    pub format: OutputFormat,

    /// Fix frontmatter, directory names and the marketplace index, then re-validate
    #[arg(long)]
    pub fix: bool,

    /// With --fix: report the changes without writing anything
    #[arg(long, requires = "fix")]
    pub dry_run: bool,

    /// Custom config file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Skip the external `claude plugin validate` pass
    #[arg(long)]
    pub no_external: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Silence progress logging
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}
