use std::io::{self, BufRead, Write};

use log::debug;
use sp_core::SceneplayError;
use sp_runtime::{EngineStatus, StoryEngine};

use crate::line_sink::LineSink;
use crate::map_cli_io;

const HELP_LINE: &str = "commands: <enter> advance, <number> choose, :help :restart :quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineCommandAction {
    NotHandled,
    Continue,
    Quit,
}

pub(crate) fn run_line_mode(engine: &mut StoryEngine<LineSink>) -> Result<i32, SceneplayError> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut writer = io::stdout();
    run_line_mode_with_io(engine, &mut reader, &mut writer)
}

pub(crate) fn run_line_mode_with_io(
    engine: &mut StoryEngine<LineSink>,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<i32, SceneplayError> {
    writeln!(writer, "{}", HELP_LINE).map_err(map_cli_io)?;

    loop {
        flush_sink(engine, writer)?;
        match engine.status() {
            EngineStatus::Ended => return Ok(0),
            EngineStatus::Halted => {
                writeln!(
                    writer,
                    "[story stopped in {}]",
                    engine.current_node().unwrap_or("<none>")
                )
                .map_err(map_cli_io)?;
                return Ok(0);
            }
            EngineStatus::AwaitingAdvance => {
                let Some(raw) = prompt_input_from("> ", reader, writer)? else {
                    return Ok(0);
                };
                match handle_line_cmd(raw.trim(), engine, writer)? {
                    LineCommandAction::Continue => continue,
                    LineCommandAction::Quit => return Ok(0),
                    LineCommandAction::NotHandled => engine.advance()?,
                }
            }
            EngineStatus::AwaitingChoice => {
                let Some(raw) = prompt_input_from("> ", reader, writer)? else {
                    return Ok(0);
                };
                let raw = raw.trim();
                match handle_line_cmd(raw, engine, writer)? {
                    LineCommandAction::Continue => continue,
                    LineCommandAction::Quit => return Ok(0),
                    LineCommandAction::NotHandled => {}
                }
                let Ok(index) = raw.parse::<usize>() else {
                    writeln!(writer, "enter an option number").map_err(map_cli_io)?;
                    continue;
                };
                match engine.choose(index) {
                    Ok(()) => {}
                    Err(error) if error.code == "ENGINE_CHOICE_INDEX" => {
                        writeln!(writer, "no option {}", index).map_err(map_cli_io)?;
                    }
                    Err(error) => return Err(error),
                }
            }
            status @ (EngineStatus::Idle | EngineStatus::Running) => {
                return Err(SceneplayError::new(
                    "CLI_ENGINE_STATE",
                    format!("Engine is not at a player boundary (status: {:?}).", status),
                ))
            }
        }
    }
}

fn flush_sink(engine: &mut StoryEngine<LineSink>, writer: &mut dyn Write) -> Result<(), SceneplayError> {
    for line in engine.sink_mut().drain() {
        writeln!(writer, "{}", line).map_err(map_cli_io)?;
    }
    Ok(())
}

pub(crate) fn handle_line_cmd(
    raw: &str,
    engine: &mut StoryEngine<LineSink>,
    writer: &mut dyn Write,
) -> Result<LineCommandAction, SceneplayError> {
    match raw {
        ":help" => {
            writeln!(writer, "{}", HELP_LINE).map_err(map_cli_io)?;
            Ok(LineCommandAction::Continue)
        }
        ":restart" => {
            engine.sink_mut().drain();
            engine.restart()?;
            debug!("restarted from \"{}\"", engine.story().start);
            writeln!(writer, "restarted").map_err(map_cli_io)?;
            Ok(LineCommandAction::Continue)
        }
        ":quit" => {
            writeln!(writer, "bye").map_err(map_cli_io)?;
            Ok(LineCommandAction::Quit)
        }
        _ => Ok(LineCommandAction::NotHandled),
    }
}

/// `None` once the input is exhausted.
pub(crate) fn prompt_input_from(
    prefix: &str,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<Option<String>, SceneplayError> {
    write!(writer, "{}", prefix).map_err(map_cli_io)?;
    writer.flush().map_err(map_cli_io)?;
    let mut input = String::new();
    if reader.read_line(&mut input).map_err(map_cli_io)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim_end_matches(&['\r', '\n'][..]).to_string()))
}
