use std::fs;
use std::io::{self, Write};
use std::rc::Rc;

use clap::Parser as _;
use owo_colors::OwoColorize;

use wyg::cli::{generate_completions, AppConfig, Args, Commands};
use wyg::diagnostic::DiagnosticRenderer;
use wyg::format::format_value;
use wyg::interpreter::{parse_only, run_in, runtime, Error, Scope};

fn main() {
    let args = Args::parse();

    if let Some(Commands::Complete { shell }) = args.command {
        generate_completions(shell);
        return;
    }

    let config = AppConfig::from_args(&args);

    let exit_code = if let Some(path) = &args.script {
        match fs::read_to_string(path) {
            Ok(source) => {
                let name = path.display().to_string();
                run_source(&source, &name, &config, args.ast)
            }
            Err(e) => {
                eprintln!("error: cannot read {}: {}", path.display(), e);
                1
            }
        }
    } else if let Some(expr) = &args.eval {
        run_source(expr, "eval", &config, args.ast)
    } else {
        repl(&config, args.ast)
    };

    std::process::exit(exit_code);
}

fn run_source(source: &str, name: &str, config: &AppConfig, ast_only: bool) -> i32 {
    if ast_only {
        return match parse_only(source) {
            Ok(ast) => {
                println!("{ast:#?}");
                0
            }
            Err(err) => {
                report(source, name, &err, config);
                1
            }
        };
    }

    let env = match runtime() {
        Ok(env) => env,
        Err(err) => {
            report(source, name, &err, config);
            return 1;
        }
    };

    match run_in(source, &env) {
        Ok(value) => {
            println!("{}", format_value(&value));
            0
        }
        Err(err) => {
            report(source, name, &err, config);
            1
        }
    }
}

fn repl(config: &AppConfig, ast_only: bool) -> i32 {
    let env = match runtime() {
        Ok(env) => env,
        Err(err) => {
            report("", "repl", &err, config);
            return 1;
        }
    };

    banner(config);

    let mut count = 0usize;
    loop {
        count += 1;
        if prompt(config, count).is_err() {
            return 1;
        }

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("error reading input: {e}");
                return 1;
            }
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == ":q" {
            break;
        }

        read_eval_print(line, &env, config, ast_only);
    }

    println!("Goodbye!");
    0
}

fn read_eval_print(line: &str, env: &Rc<Scope>, config: &AppConfig, ast_only: bool) {
    if ast_only {
        match parse_only(line) {
            Ok(ast) => println!("{ast:#?}"),
            Err(err) => report(line, "repl", &err, config),
        }
        return;
    }
    match run_in(line, env) {
        Ok(value) => {
            let rendered = format_value(&value);
            if config.color_enabled {
                println!("{}", rendered.yellow());
            } else {
                println!("{rendered}");
            }
        }
        Err(err) => report(line, "repl", &err, config),
    }
}

fn banner(config: &AppConfig) {
    if config.color_enabled {
        println!(" {}yg  ~  {} to quit", "\\ʎ/".bright_red(), ":q".italic());
    } else {
        println!(" \\ʎ/yg  ~  :q to quit");
    }
}

fn prompt(config: &AppConfig, count: usize) -> io::Result<()> {
    if config.color_enabled {
        print!("({})> ", count.bright_blue());
    } else {
        print!("({count})> ");
    }
    io::stdout().flush()
}

fn report(source: &str, name: &str, err: &Error, config: &AppConfig) {
    let renderer = DiagnosticRenderer::new(source, name, config.color_enabled);
    eprint!("{}", renderer.render(&err.to_diagnostic()));
}
