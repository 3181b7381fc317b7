mod report;

use alarmsms::{Config, assemble, find_phone_numbers, parse_verbose};
use std::io::{self, IsTerminal, Read};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = match parse_args() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("alarmsms=info")))
        .with_writer(io::stderr)
        .init();

    let config = match &cli.config_path {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("error: {err}");
                std::process::exit(2);
            }
        },
        None => Config::default(),
    };

    let run = parse_verbose(&cli.input);
    let requests = match &run.result {
        Ok(parsed) if !cli.targets.is_empty() => {
            assemble(parsed.template.sms_code, &parsed.fields, &cli.targets, config.value_cap)
        }
        _ => Vec::new(),
    };

    report::print_run(&cli.input, &run, &requests, cli.color);

    if run.result.is_err() {
        std::process::exit(1);
    }
}

struct CliArgs {
    input: String,
    targets: Vec<String>,
    config_path: Option<String>,
    color: bool,
}

fn parse_args() -> Result<CliArgs, String> {
    let mut input: Option<String> = None;
    let mut targets = Vec::new();
    let mut config_path = None;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1).peekable();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("alarmsms {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--targets" | "-t" => {
                let value = args.next().ok_or_else(|| "error: --targets expects a value".to_string())?;
                targets = parse_targets(&value)?;
            }
            "--config" | "-c" => {
                let value = args.next().ok_or_else(|| "error: --config expects a value".to_string())?;
                config_path = Some(value);
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    input = Some(rest);
                }
                break;
            }
            _ if arg.starts_with("--targets=") => {
                targets = parse_targets(arg.trim_start_matches("--targets="))?;
            }
            _ if arg.starts_with("--config=") => {
                config_path = Some(arg.trim_start_matches("--config=").to_string());
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                input = Some(std::iter::once(arg).chain(args).collect::<Vec<_>>().join(" "));
                break;
            }
        }
    }

    let input = match input {
        Some(value) => value,
        None => read_stdin_input()?,
    };

    if input.trim().is_empty() {
        return Err(format!("error: no input provided\n\n{}", help_text()));
    }

    Ok(CliArgs { input, targets, config_path, color })
}

fn parse_targets(value: &str) -> Result<Vec<String>, String> {
    let targets = find_phone_numbers(value);
    if targets.is_empty() {
        return Err(format!("error: invalid --targets '{value}' (expected comma-separated mobile numbers)"));
    }
    Ok(targets)
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "alarmsms {version}

Turns a monitoring alarm text into SMS template parameters.

Usage:
  alarmsms [OPTIONS] [--] <text...>
  alarmsms [OPTIONS] < alarm.txt

Options:
  -t, --targets <numbers>    Comma-separated recipients; when given, the
                             assembled provider requests are printed too.
  -c, --config <path>        TOML config (value_cap and template codes).
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  RUST_LOG                   Log filter. Default: alarmsms=info

Exit codes:
  0  Text recognized.
  1  Text not recognized or malformed.
  2  Invalid arguments or missing input.
",
        version = env!("CARGO_PKG_VERSION"),
    )
}
