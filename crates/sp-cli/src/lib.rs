use std::ffi::OsString;
use std::path::Path;

use clap::Parser;
use log::LevelFilter;
use sp_api::{create_engine_from_story, CreateEngineOptions};
use sp_core::SceneplayError;
use sp_loader::load_story_from_path;

mod check;
mod cli_args;
mod error_map;
mod line_player;
mod line_sink;

pub(crate) use cli_args::{CheckArgs, Cli, Mode, PlayArgs};
pub(crate) use error_map::{emit_error, map_cli_io, map_cli_json, map_cli_source_scan};
pub(crate) use line_sink::LineSink;

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    init_logging(cli.verbose);
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

/// `RUST_LOG` wins over the default `warn` filter; `--verbose` wins over both.
fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    let _ = builder.format_timestamp(None).try_init();
}

fn run(cli: Cli) -> Result<i32, SceneplayError> {
    match cli.command {
        Mode::Play(args) => run_play(args),
        Mode::Check(args) => check::run_check(args),
    }
}

fn run_play(args: PlayArgs) -> Result<i32, SceneplayError> {
    let story = load_story_from_path(Path::new(&args.story))?;
    let mut engine = create_engine_from_story(
        story,
        LineSink::new(),
        CreateEngineOptions {
            gate: args.gate,
            ..CreateEngineOptions::default()
        },
    )?;
    line_player::run_line_mode(&mut engine)
}
