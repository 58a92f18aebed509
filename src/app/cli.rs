use std::io::{self, BufRead, IsTerminal, Write};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal,
};
use log::error;

use crate::models::request::{Request, RequestKind};
use crate::worker::channel::ControllerClient;

#[derive(Debug, PartialEq, Eq)]
pub enum ShellCommand {
    Send(Request),
    Help,
    Quit,
    Empty,
}

pub fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let mut args = line.split_whitespace();
    let Some(command) = args.next() else {
        return Ok(ShellCommand::Empty);
    };

    match command {
        "p" | "list" => Ok(ShellCommand::Send(Request::list_tasks())),
        "k" | "kill" => {
            let id_str = args.next().ok_or("Task ID must be specified.")?;
            let id = id_str
                .parse::<i32>()
                .map_err(|_| "Invalid task ID format.".to_string())?;
            Ok(ShellCommand::Send(Request::kill_task(id)))
        }
        "e" | "exec" => {
            let path = args.next().ok_or("Executable to run must be specified.")?;
            Ok(ShellCommand::Send(Request::spawn_task(path)))
        }
        "h" | "help" => Ok(ShellCommand::Help),
        "q" | "exit" => Ok(ShellCommand::Quit),
        cmd => Err(format!("Unknown command: {}. Type 'help' for a list.", cmd)),
    }
}

pub fn run_shell(mut client: ControllerClient) -> io::Result<()> {
    println!("Scheduler shell started. Enter a command or 'exit' to quit.");
    let interactive = io::stdin().is_terminal();
    let mut history: Vec<String> = Vec::new();

    loop {
        let line = if interactive {
            read_line(&history)?
        } else {
            read_piped_line()?
        };
        let Some(input) = line else {
            break;
        };
        if !input.trim().is_empty() {
            history.push(input.clone());
        }

        let command = match parse_command(&input) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        let request = match command {
            ShellCommand::Send(request) => request,
            ShellCommand::Help => {
                print_help();
                continue;
            }
            ShellCommand::Quit => {
                println!("Exiting the shell...");
                break;
            }
            ShellCommand::Empty => continue,
        };

        match client.send(&request) {
            Ok(code) => report(&request, code),
            Err(e) => {
                error!("{}", e);
                println!("Lost contact with the scheduler.");
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, e));
            }
        }
    }
    Ok(())
}

fn report(request: &Request, code: i32) {
    match (request.kind, code) {
        (RequestKind::KillTask, 0) => println!("Sent kill signal for task {}", request.task_arg),
        (RequestKind::KillTask, _) => println!("Task {} not found", request.task_arg),
        (RequestKind::SpawnTask, 0) => println!("Spawned {}", request.exec_arg.display()),
        (_, 0) => {}
        (_, code) => println!("Scheduler returned {}", code),
    }
}

fn print_help() {
    println!("  p | list          list scheduled tasks");
    println!("  k | kill <id>     kill task <id>");
    println!("  e | exec <path>   launch <path> as a new task");
    println!("  q | exit          leave the shell");
}

// Commands from a pipe or file, echoed so the transcript reads like a session.
fn read_piped_line() -> io::Result<Option<String>> {
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let line = line.trim_end().to_string();
    println!(">>> {}", line);
    Ok(Some(line))
}

/// Leaves raw mode when dropped, including on early error returns.
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(RawMode)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            error!("Failed to leave raw mode: {}", e);
        }
    }
}

/// `None` on Ctrl-C/Ctrl-D.
fn read_line(history: &[String]) -> io::Result<Option<String>> {
    let mut input = String::new();
    let mut history_index = history.len();

    let raw_mode = RawMode::enable()?;
    print!("\r>>> ");
    io::stdout().flush()?;

    let result = loop {
        let Event::Key(key_event) = event::read()? else {
            continue;
        };
        match key_event.code {
            KeyCode::Enter => break Some(input),
            KeyCode::Char('c' | 'd') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
                break None;
            }
            KeyCode::Up => {
                history_index = history_index.saturating_sub(1);
                if let Some(command) = history.get(history_index) {
                    input = command.clone();
                    redraw(&input)?;
                }
            }
            KeyCode::Down => {
                if history_index < history.len() {
                    history_index += 1;
                }
                input = history.get(history_index).cloned().unwrap_or_default();
                redraw(&input)?;
            }
            KeyCode::Char(c) => {
                input.push(c);
                print!("{}", c);
                io::stdout().flush()?;
            }
            KeyCode::Backspace => {
                input.pop();
                redraw(&input)?;
            }
            _ => {}
        }
    };

    drop(raw_mode);
    println!();
    Ok(result)
}

fn redraw(input: &str) -> io::Result<()> {
    execute!(
        io::stdout(),
        cursor::MoveToColumn(0),
        terminal::Clear(terminal::ClearType::CurrentLine)
    )?;
    print!(">>> {}", input);
    io::stdout().flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_forms() {
        assert_eq!(parse_command("p"), Ok(ShellCommand::Send(Request::list_tasks())));
        assert_eq!(parse_command("list"), parse_command("p"));
        assert_eq!(parse_command("kill 3"), Ok(ShellCommand::Send(Request::kill_task(3))));
        assert_eq!(
            parse_command("  e   ./prog "),
            Ok(ShellCommand::Send(Request::spawn_task("./prog")))
        );
        assert_eq!(parse_command("q"), Ok(ShellCommand::Quit));
        assert_eq!(parse_command("   "), Ok(ShellCommand::Empty));
    }

    #[test]
    fn raw_mode_is_left_when_the_guard_drops() {
        // No terminal attached, nothing to toggle.
        let Ok(guard) = RawMode::enable() else {
            return;
        };
        assert!(terminal::is_raw_mode_enabled().unwrap());
        drop(guard);
        assert!(!terminal::is_raw_mode_enabled().unwrap());
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!(parse_command("k").is_err());
        assert!(parse_command("k two").is_err());
        assert!(parse_command("exec").is_err());
        assert!(parse_command("frobnicate").is_err());
    }
}
