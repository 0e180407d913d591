use clap::{Args, Parser, Subcommand};
use sp_api::ValidationGate;

#[derive(Debug, Parser)]
#[command(name = "sceneplay")]
#[command(about = "Play and check branching visual-novel stories")]
pub(crate) struct Cli {
    /// Log engine and validator activity at debug level.
    #[arg(long, global = true)]
    pub(crate) verbose: bool,
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    /// Play a story in the terminal.
    Play(PlayArgs),
    /// Validate story files without playing them.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
pub(crate) struct PlayArgs {
    #[arg(long = "story")]
    pub(crate) story: String,
    /// Which findings block playback: off, errors or warnings.
    #[arg(long = "gate", default_value = "errors")]
    pub(crate) gate: ValidationGate,
}

#[derive(Debug, Args)]
pub(crate) struct CheckArgs {
    /// A story file or a directory searched for story files.
    #[arg(long = "path")]
    pub(crate) path: String,
    #[arg(long = "deny-warnings")]
    pub(crate) deny_warnings: bool,
    #[arg(long = "json")]
    pub(crate) json: bool,
}
