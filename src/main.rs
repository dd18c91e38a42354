//! AutoMaTA CLI and REPL
//!
//! Usage:
//!   amta <file.amtascript> [--lib DIR] [--debug] [--max_while_loops N]
//!   amta repl
//!   amta help
//!
//! Running a file calls its `!main` function.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use amta::{config, ext, program, Libraries, ProgramParser, Scope, VERSION};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        return;
    }

    let mut lib_folder = PathBuf::from("lib");
    let mut script_file: Option<String> = None;
    let mut repl = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "help" | "--help" | "-h" => {
                print_help();
                return;
            }
            "version" | "--version" | "-v" => {
                println!("AutoMaTA {}", VERSION);
                return;
            }
            "repl" => repl = true,
            "--lib" => {
                i += 1;
                match args.get(i) {
                    Some(dir) => lib_folder = PathBuf::from(dir),
                    None => {
                        eprintln!("{}: --lib requires a folder argument", "error".red());
                        process::exit(1);
                    }
                }
            }
            "--debug" => config::set_debug(true),
            "--max_while_loops" => {
                i += 1;
                match args.get(i).and_then(|n| n.parse::<i64>().ok()) {
                    Some(n) => config::set_max_while_loops(n),
                    None => {
                        eprintln!(
                            "{}: invalid --max_while_loops parameter: {}",
                            "error".red(),
                            args.get(i).map(String::as_str).unwrap_or("")
                        );
                        process::exit(1);
                    }
                }
            }
            file if script_file.is_none() && !file.starts_with("--") => {
                script_file = Some(file.to_string());
            }
            other => {
                eprintln!("{}: unknown argument '{}'", "error".red(), other);
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    let libraries = load_libraries(&lib_folder);

    if repl {
        run_repl(&libraries);
        return;
    }

    match script_file {
        Some(file) => run_file(&file, &libraries),
        None => print_help(),
    }
}

fn print_help() {
    println!("{}", "AutoMaTA Processor".cyan().bold());
    println!("A macro-driven scripting language");
    println!("{} {}\n", "Version".cyan(), VERSION);
    println!("{}", "USAGE:".yellow());
    println!("  amta <file.amtascript>   Run a script (calls !main)");
    println!("  amta repl                Start the interactive REPL");
    println!("  amta help                Show this help message");
    println!("  amta version             Show version\n");
    println!("{}", "OPTIONS:".yellow());
    println!("  --lib DIR                Library folder (default: ./lib)");
    println!("  --debug                  Print interpreter debug messages");
    println!("  --max_while_loops N      Cap while iterations; -1 disables\n");
    println!("{}", "LANGUAGE:".yellow());
    println!("  $x = 5                   Assign a variable");
    println!("  !print                   Call a function");
    println!("  if $x > 0 ... el ... fi  Conditional");
    println!("  while $x > 0 ... ewhil   Bounded loop");
    println!("  MACRO add(a,b) => a + b  Text macro, invoked as ^add(2,3)");
}

/// Every `*.amtascript` file in the folder becomes an importable
/// library named after its file stem.
fn load_libraries(folder: &Path) -> Libraries {
    let mut libraries = Libraries::new();
    let Ok(entries) = fs::read_dir(folder) else {
        return libraries;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("amtascript") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match fs::read_to_string(&path) {
            Ok(source) => libraries.register(stem, source),
            Err(e) => eprintln!(
                "{}: cannot read library '{}': {}",
                "warning".yellow(),
                path.display(),
                e
            ),
        }
    }
    libraries
}

fn run_file(path: &str, libraries: &Libraries) {
    let script = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("{}: cannot read file '{}': {}", "error".red(), path, e);
            process::exit(1);
        }
    };
    config::debug(format!("loaded script:\n{}", script));

    if let Err(e) = amta::run(&script, libraries) {
        eprintln!("{}", e.to_string().red());
        process::exit(1);
    }
}

fn run_repl(libraries: &Libraries) {
    println!(
        "{} {} - {}",
        "AutoMaTA".cyan().bold(),
        VERSION.cyan(),
        "macro-driven scripting".dimmed()
    );
    println!(
        "Type {} to exit, {} for help; blocks run once they close\n",
        "exit".yellow(),
        "help".yellow()
    );

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("{}: cannot start REPL: {}", "error".red(), e);
            process::exit(1);
        }
    };

    // One scope persists across entries, like a running script.
    let mut scope = new_repl_scope();
    let mut pending = String::new();
    let mut depth = 0usize;

    loop {
        let prompt = if depth == 0 { "amta> " } else { "  ... " };
        match rl.readline(&format!("{}", prompt.green().bold())) {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                if depth == 0 {
                    match line.as_str() {
                        "exit" | "quit" => break,
                        "help" => {
                            print_repl_help();
                            continue;
                        }
                        "clear" => {
                            scope = new_repl_scope();
                            println!("{}", "Scope cleared.".dimmed());
                            continue;
                        }
                        "scope" => {
                            println!("{}", scope);
                            continue;
                        }
                        _ => {}
                    }
                }

                if line.starts_with("if") || line.starts_with("while") {
                    depth += 1;
                }
                if line.starts_with("fi") || line.starts_with("ewhil") {
                    depth = depth.saturating_sub(1);
                }
                if line == "@" {
                    depth = depth.saturating_sub(1);
                } else if line.starts_with('@') {
                    depth += 1;
                }
                pending.push_str(&line);
                pending.push('\n');
                if depth > 0 {
                    continue;
                }

                let entry = std::mem::take(&mut pending);
                if let Err(e) = run_repl_entry(&entry, &mut scope, libraries) {
                    eprintln!("{}", e.to_string().red());
                }
            }
            Err(ReadlineError::Interrupted) => {
                pending.clear();
                depth = 0;
                println!("{}", "^C".dimmed());
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {:?}", "error".red(), e);
                break;
            }
        }
    }
}

fn new_repl_scope() -> Scope {
    let mut scope = Scope::new("AutoMaTA REPL");
    // Registration into a fresh scope cannot collide.
    let _ = program::register_stock_natives(&mut scope);
    let _ = ext::arrays::register(&mut scope);
    let _ = ext::strings::register(&mut scope);
    scope
}

/// Run one REPL entry: macro-expand it, then either import its function
/// definitions or execute its statements directly.
fn run_repl_entry(entry: &str, scope: &mut Scope, libraries: &Libraries) -> amta::Result<()> {
    if entry.trim_start().starts_with('@') || entry.trim_start().starts_with('+') {
        let mut parser = ProgramParser::new(entry);
        parser.parse(libraries)?;
        return scope.import_functions(parser.functions);
    }
    let expanded = amta::macros::expand_macros(entry)?;
    for stmt in amta::block::parse_block(&expanded)? {
        stmt.execute(scope)?;
    }
    Ok(())
}

fn print_repl_help() {
    println!("{}", "REPL Commands:".yellow());
    println!("  exit, quit   Exit the REPL");
    println!("  clear        Reset the scope");
    println!("  scope        Dump variables and functions");
    println!("  help         Show this help\n");
    println!("{}", "Examples:".yellow());
    println!("  $x = 5");
    println!("  $msg = \"count: \" ~ s$x");
    println!("  $print_string = $msg");
    println!("  !print");
    println!("  @twice");
    println!("  $n = $n * 2");
    println!("  @");
}
