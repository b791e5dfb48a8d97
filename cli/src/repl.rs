use rustyline::{DefaultEditor, error::ReadlineError};

use fastx_core::{Evaluated, Interp};

fn print_repl_help() {
    eprintln!("Commands: :quit | :exit | :q, :help, :fold on|off");
}

pub(crate) fn should_continue_multiline(buf: &str) -> bool {
    // Simple bracket/brace/paren balance check; continue if unbalanced or trailing '\\'
    let mut paren = 0i32;
    let mut brace = 0i32;
    let mut bracket = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    for ch in buf.chars() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '(' => paren += 1,
            ')' => paren -= 1,
            '{' => brace += 1,
            '}' => brace -= 1,
            '[' => bracket += 1,
            ']' => bracket -= 1,
            _ => {}
        }
    }
    let trailing_backslash = buf.trim_end().ends_with('\\');
    paren > 0 || brace > 0 || bracket > 0 || trailing_backslash
}

/// Handle a `:command`; returns `false` when the REPL should exit.
fn run_command(interp: &mut Interp, cmd: &str) -> bool {
    match cmd {
        ":quit" | ":exit" | ":q" => return false,
        ":help" => print_repl_help(),
        ":fold on" | ":fold off" => {
            let mut options = *interp.comp().options();
            options.fold_constants = cmd == ":fold on";
            interp.set_options(options);
        }
        _ => eprintln!("Unknown command. Type :help for help."),
    }
    true
}

pub fn run(mut interp: Interp) -> anyhow::Result<()> {
    // In-memory line editor with history and arrow key support
    let mut rl = DefaultEditor::new()?;

    print_repl_help();

    loop {
        let mut acc = String::new();
        // Read one or more lines using rustyline until complete
        loop {
            let prompt = if acc.is_empty() { "> " } else { "... " };
            match rl.readline(prompt) {
                Ok(line) => {
                    let trimmed = line.trim_end();

                    // Commands only when starting fresh
                    if acc.is_empty() && trimmed.starts_with(':') {
                        if !run_command(&mut interp, trimmed) {
                            return Ok(());
                        }
                        break;
                    }

                    // Support line continuation via trailing '\\' (strip it)
                    if let Some(stripped) = trimmed.strip_suffix('\\') {
                        acc.push_str(stripped);
                        acc.push('\n');
                        continue;
                    }

                    acc.push_str(trimmed);
                    acc.push('\n');
                    if !should_continue_multiline(&acc) {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl-C: clear current buffer and prompt again
                    acc.clear();
                    eprintln!("^C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl-D: exit if nothing pending; otherwise treat as submit
                    if acc.trim().is_empty() {
                        println!();
                        return Ok(());
                    }
                    break;
                }
                Err(e) => {
                    eprintln!("Readline error: {}", e);
                    continue;
                }
            }
        }

        let src = acc.trim_end();
        if src.trim().is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(src);

        match interp.eval_line(src) {
            Ok(results) => {
                for result in results {
                    if !matches!(result, Evaluated::Bound(_)) {
                        println!("{}", result);
                    }
                }
            }
            Err(e) => eprintln!("Error: {}", e),
        }
    }
}
