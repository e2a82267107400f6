//! cairn - run, check and explore Cairn programs
//!
//! Usage:
//!   cairn                   # Start the REPL
//!   cairn run prog.cairn    # Check and run a file
//!   cairn check prog.cairn  # Print the stack effect of a file
//!
//! REPL commands:
//!   :quit, :q               # Exit
//!   :stack                  # Show the stack and its types
//!   :clear                  # Empty the stack
//!   :type <code>            # Show the stack effect of code without running it
//!   :help                   # Show help

mod config;
mod session;

use cairn_runtime::{Interpreter, PrintHandler, Value};
use cairnc::builtins::{builtin_doc, builtin_signature};
use cairnc::{Builtin, TypeChecker};
use cairnc::diagnostic::{Spanned, render};
use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use clap_complete::{Shell, generate};
use config::{Config, LogConfig};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use session::Session;
use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Environment variable holding log filter directives
const LOG_ENV: &str = "CAIRN_LOG";

#[derive(ClapParser)]
#[command(name = "cairn")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Cairn - a concatenative language with inferred stack effects", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Type check and run a .cairn file
    Run {
        /// Input .cairn source file
        input: PathBuf,

        /// Print the final stack after the program finishes
        #[arg(long)]
        show_stack: bool,
    },

    /// Print the inferred stack effect of a .cairn file
    Check {
        /// Input .cairn source file
        input: PathBuf,
    },

    /// Start an interactive session (the default)
    Repl,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Repl);

    if let Commands::Completions { shell } = command {
        run_completions(shell);
        return;
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    init_logging(&config.log);
    debug!(?config, "configuration loaded");

    let color = config.output.color && io::stderr().is_terminal();
    match command {
        Commands::Run { input, show_stack } => run_file(&input, show_stack, color),
        Commands::Check { input } => check_file(&input, color),
        Commands::Repl => run_repl(&config, color),
        Commands::Completions { .. } => {}
    }
}

/// `CAIRN_LOG` wins over the configured filter
fn init_logging(log: &LogConfig) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(&log.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "cairn", &mut io::stdout());
}

fn read_source(input: &Path) -> String {
    match fs::read_to_string(input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading {}: {}", input.display(), e);
            process::exit(1);
        }
    }
}

fn fail<E>(error: &E, source: &str, input: &Path, color: bool) -> !
where
    E: std::error::Error + Spanned,
{
    eprint!("{}", render(error, source, &input.display().to_string(), color));
    process::exit(1);
}

fn run_file(input: &Path, show_stack: bool, color: bool) {
    let source = read_source(input);
    let checked = match cairnc::check_source(&source) {
        Ok(checked) => checked,
        Err(e) => fail(&e, &source, input, color),
    };
    debug!(file = %input.display(), effect = %checked.effect(), "checked");

    let mut interp = Interpreter::new();
    let mut stack = Vec::new();
    if let Err(e) = interp.run(&checked, &mut stack) {
        fail(&e, &source, input, color);
    }

    if show_stack {
        println!("{}", format_stack(&stack));
    }
}

fn check_file(input: &Path, color: bool) {
    let source = read_source(input);
    let program = match cairnc::parse(&source) {
        Ok(program) => program,
        Err(e) => fail(&e, &source, input, color),
    };

    let mut checker = TypeChecker::new();
    let checked = match checker.check(&program) {
        Ok(checked) => checked,
        Err(e) => fail(&e, &source, input, color),
    };

    for name in checker.word_names() {
        if let Some(effect) = checker.word_effect(name) {
            println!("fn {} {}", name, effect.normalized());
        }
    }
    println!("{}", checked.effect());
}

fn format_stack(stack: &[Value]) -> String {
    stack
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// What the REPL loop should do after a line
enum Flow {
    Continue,
    Quit,
}

fn run_repl(config: &Config, color: bool) {
    let mut rl = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("Error initializing readline: {}", e);
            process::exit(1);
        }
    };

    let history_file = config.repl.history_path();
    if let Some(ref path) = history_file {
        let _ = rl.load_history(path);
    }

    println!(
        "Cairn {} REPL. Type :help for commands, :quit to exit.",
        env!("CARGO_PKG_VERSION")
    );

    let mut session = Session::new(PrintHandler::Stdout, color);
    loop {
        match rl.readline(&config.repl.prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if let Flow::Quit = handle_line(&mut session, line, config.repl.show_stack) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    if let Some(ref path) = history_file {
        if let Some(dir) = path.parent() {
            let _ = fs::create_dir_all(dir);
        }
        let _ = rl.save_history(path);
    }
}

fn handle_line(session: &mut Session, line: &str, show_stack: bool) -> Flow {
    match line {
        ":quit" | ":q" => return Flow::Quit,
        ":stack" => {
            println!("stack: {}", session.render_stack());
            println!("types: {}", session.types());
        }
        ":clear" => {
            session.clear();
            println!("Stack cleared.");
        }
        ":help" => print_help(),
        _ => {
            if let Some(code) = line.strip_prefix(":type") {
                match session.type_of(code.trim()) {
                    Ok(effect) => println!("{}", effect),
                    Err(e) => eprint!("{}", e),
                }
            } else if line.starts_with(':') {
                println!(
                    "Unknown command: {}. Type :help for available commands.",
                    line
                );
            } else {
                match session.eval(line) {
                    Ok(_) if show_stack => println!("stack: {}", session.render_stack()),
                    Ok(_) => {}
                    Err(e) => eprint!("{}", e),
                }
            }
        }
    }
    Flow::Continue
}

fn print_help() {
    print!("{}", help_text());
}

fn help_text() -> String {
    let mut text = String::from(
        r#"
Cairn REPL Commands:
  :quit, :q       Exit the REPL
  :stack          Show the stack and its types
  :clear          Empty the stack (defined words are kept)
  :type <code>    Show the stack effect of code without running it
  :help           Show this help

Anything else is checked against the current stack and run.
Define words with: fn name { body }

Built-in operators:
"#,
    );
    for builtin in Builtin::ALL {
        text.push_str(&format!(
            "  {:<8}{}\n          {}\n",
            builtin.name(),
            builtin_doc(builtin),
            builtin_signature(builtin)
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_repl() {
        let cli = Cli::try_parse_from(["cairn"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_global_config_option() {
        let cli = Cli::try_parse_from(["cairn", "run", "--config", "c.toml", "p.cairn"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Run { show_stack: false, .. })
        ));
    }

    #[test]
    fn test_format_stack() {
        let stack = vec![Value::Int(1), Value::from(vec![2_i64, 3])];
        assert_eq!(format_stack(&stack), "1 [2, 3]");
    }

    #[test]
    fn test_help_lists_builtins() {
        let text = help_text();
        assert!(text.contains(":type <code>"));
        assert!(text.contains("fn name { body }"));
        for builtin in Builtin::ALL {
            assert!(text.contains(builtin_doc(builtin)), "{}", builtin);
        }
        assert!(text.contains("  dup     duplicate the top value\n          ( ..a A -- ..a A A )\n"));
    }

    #[test]
    fn test_handle_line_quit() {
        let mut session = Session::new(PrintHandler::Silent, false);
        assert!(matches!(handle_line(&mut session, ":q", false), Flow::Quit));
        assert!(matches!(
            handle_line(&mut session, "1 2 +", false),
            Flow::Continue
        ));
        assert_eq!(session.render_stack(), "3");
    }
}
