//! Line commands read from stdin during `trajview replay`.

use trajview_core::TrajectoryRef;
use trajview_replay::{Command, Direction};

pub const HELP: &str = "\
commands:
  n, next          show the next message
  p, prev          take the last message back
  a, all           show every remaining message
  play, <space>    start auto-play
  pause            stop auto-play
  model <m>        select a model
  task <t>         load a task of the selected model
  open <m>_<t>     load a trajectory
  q, quit          exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    Help,
    Quit,
}

/// Parse one line. Empty lines are ignored.
pub fn parse_line(line: &str) -> Result<Option<Input>, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        // A bare space plays, as the space bar does in the web player.
        return Ok((!line.is_empty()).then_some(Input::Command(Command::Play)));
    }
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "n" | "next" => Command::Step(Direction::Forward),
        "p" | "prev" => Command::Step(Direction::Back),
        "a" | "all" => Command::ShowAll,
        "play" => Command::Play,
        "pause" => Command::Pause,
        "model" => Command::SelectModel(argument(word, rest)?),
        "task" => Command::SelectTask(argument(word, rest)?),
        "open" => {
            let id = argument(word, rest)?;
            let trajectory = TrajectoryRef::parse(trajview_core::route::strip_extension(&id))
                .ok_or_else(|| format!("expected <model>_<task>, got '{id}'"))?;
            Command::Select {
                model: trajectory.model,
                task: trajectory.task,
            }
        }
        "h" | "help" | "?" => return Ok(Some(Input::Help)),
        "q" | "quit" | "exit" => return Ok(Some(Input::Quit)),
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(Input::Command(command)))
}

fn argument(word: &str, rest: &str) -> Result<String, String> {
    if rest.is_empty() {
        Err(format!("'{word}' needs an argument"))
    } else {
        Ok(rest.to_string())
    }
}
