//! Command-line front end: run a file, drop into the REPL, print version
//! or statistics.

use std::io::Write as _;
use std::process::ExitCode;
use std::sync::atomic::Ordering;

use luci::{Outcome, Runner, StdPrint};

mod color {
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const RESET: &str = "\x1b[0m";

    pub fn colorize(text: &str, color: &str) -> String {
        format!("{color}{text}{RESET}")
    }
}

fn usage(program: &str) {
    println!("{program}");
    println!("Usage:");
    println!("{program} [-i] [-s] [-v] [file_name]");
    println!("  -i\t\tenter interactive mode after running the provided file_name");
    println!("  -s\t\tprint statistics");
    println!("  -v\t\tprint version");
    println!("  -h\t\tshow this usage");
    println!("  file_name\trun the given file_name, when none given, enter interactive mode");
}

fn print_version() {
    let (major, minor, patch) = luci::version::VERSION;
    println!("Luci {major}.{minor}.{patch} (rust)");
}

fn interactive_mode(runner: &mut Runner) -> i32 {
    let prompt = color::colorize(">> ", color::YELLOW);
    let stdin = std::io::stdin();
    loop {
        print!("{prompt}");
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        match stdin.read_line(&mut line) {
            Ok(0) => return 0,
            Ok(_) => {}
            Err(_) => return -1,
        }
        if line.trim().is_empty() {
            continue;
        }

        let mut writer = StdPrint;
        match runner.run(&line, "", &mut writer) {
            Outcome::Value(rendered) => {
                if !rendered.is_empty() {
                    println!("{rendered}");
                }
            }
            Outcome::ParseErrors(errors) => {
                for error in errors {
                    eprintln!("{}", color::colorize(&error.to_string(), color::RED));
                }
            }
            Outcome::Error(error) => {
                eprintln!("{}", color::colorize(&error.to_string(), color::RED));
            }
            Outcome::Exit(code) => return code,
        }
    }
}

fn print_statistics(elapsed_ms: f64) {
    println!("Object statistics:");
    println!(
        " created: {}, destructed: {}",
        luci::object::OBJECTS_CONSTRUCTED.load(Ordering::Relaxed),
        luci::object::OBJECTS_DESTRUCTED.load(Ordering::Relaxed)
    );
    println!(
        " user objects wrongly destructed: {}",
        luci::object::USER_OBJECTS_WRONGLY_DESTRUCTED.load(Ordering::Relaxed)
    );
    println!("Environment statistics:");
    println!(
        " created: {}, destructed: {}",
        luci::env::ENVIRONMENTS_CONSTRUCTED.load(Ordering::Relaxed),
        luci::env::ENVIRONMENTS_DESTRUCTED.load(Ordering::Relaxed)
    );
    println!("Usertime: {elapsed_ms}ms");
}

fn main() -> ExitCode {
    let arguments: Vec<String> = std::env::args().collect();
    let program = arguments
        .first()
        .cloned()
        .unwrap_or_else(|| "luci".to_string());

    let mut enter_interactive = false;
    let mut show_statistics = false;
    let mut file_to_run = String::new();

    if arguments.len() == 1 {
        enter_interactive = true;
    }
    for argument in &arguments[1..] {
        match argument.as_str() {
            "-i" | "--interactive" => enter_interactive = true,
            "-s" | "--statistics" => show_statistics = true,
            "-h" | "--help" => {
                usage(&program);
                return ExitCode::SUCCESS;
            }
            "-v" | "--version" => {
                print_version();
                return ExitCode::SUCCESS;
            }
            other => file_to_run = other.to_string(),
        }
    }
    if file_to_run.is_empty() && !enter_interactive {
        enter_interactive = true;
    }

    let mut runner = Runner::new(arguments.clone());
    let mut return_value: i32 = 0;
    let mut elapsed_ms = 0.0;

    if !file_to_run.is_empty() {
        match std::fs::read_to_string(&file_to_run) {
            Err(_) => {
                eprintln!("File {file_to_run} cannot be read");
                return_value = 2;
                enter_interactive = false;
            }
            Ok(source) => {
                let mut writer = StdPrint;
                let start = std::time::Instant::now();
                let outcome = runner.run(&source, &file_to_run, &mut writer);
                elapsed_ms = start.elapsed().as_secs_f64() * 1e3;
                match outcome {
                    Outcome::Value(rendered) => {
                        if !rendered.is_empty() {
                            println!("{rendered}");
                        }
                        return_value = 0;
                    }
                    Outcome::ParseErrors(errors) => {
                        for error in errors {
                            eprintln!("{}", color::colorize(&error.to_string(), color::RED));
                        }
                        return_value = 1;
                    }
                    Outcome::Error(error) => {
                        eprintln!("{}", color::colorize(&error.to_string(), color::RED));
                        return_value = 1;
                    }
                    Outcome::Exit(code) => return_value = code,
                }
            }
        }
    }

    if enter_interactive {
        return_value = interactive_mode(&mut runner);
    }

    if show_statistics {
        print_statistics(elapsed_ms);
    }

    ExitCode::from(return_value.rem_euclid(256) as u8)
}
