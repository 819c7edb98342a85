use std::env;
use std::ffi::OsString;
use std::io::{self, IsTerminal};
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{self, Command};

use envkit::{Config, EnvLoader, EnvStore, Error};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

const DEFAULT_FILE: &str = ".env";
const LOG_ENV_VAR: &str = "ENVKIT_LOG";

const HELP: &str = "\
envkit - read configuration from env files with typed fallbacks

Usage:
  envkit [OPTIONS] get KEY [FALLBACK]
  envkit [OPTIONS] get-int KEY FALLBACK
  envkit [OPTIONS] get-bool KEY FALLBACK
  envkit [OPTIONS] check KEY...
  envkit [OPTIONS] run [--] COMMAND [ARGS...]
  envkit --help
  envkit --version

Commands:
  get       Print a value. Without FALLBACK the key is required.
  get-int   Print an integer value, or FALLBACK if unset or invalid.
  get-bool  Print a boolean value, or FALLBACK if unset or invalid.
  check     Exit with status 1 naming the first unset KEY.
  run       Execute COMMAND with the loaded environment.

Options:
  -f, --file <PATHS>      Env file path(s). Repeat or pass comma-separated paths.
                          Defaults to .env.
  -i, --ignore-missing    Skip env files that do not exist.
  -k, --keep-existing     Keep variables already set in the environment.
  -v, --verbose           Print loader diagnostics to stderr.
  -h, --help              Show this help text.

Diagnostics go to stderr; ENVKIT_LOG overrides the filter (e.g. ENVKIT_LOG=info).
";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Cli {
    Help,
    Version,
    Execute(GlobalOptions, Action),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct GlobalOptions {
    files: Vec<PathBuf>,
    required: bool,
    override_existing: bool,
    verbose: bool,
}

impl Default for GlobalOptions {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            required: true,
            override_existing: true,
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Get {
        key: String,
        fallback: Option<String>,
    },
    GetInt {
        key: String,
        fallback: i64,
    },
    GetBool {
        key: String,
        fallback: bool,
    },
    Check {
        keys: Vec<String>,
    },
    Run {
        command: OsString,
        args: Vec<OsString>,
    },
}

fn main() {
    process::exit(run(env::args_os()));
}

fn run(args: impl IntoIterator<Item = OsString>) -> i32 {
    let mut args = args.into_iter();
    let _bin = args.next();

    match parse_cli(args.collect()) {
        Ok(Cli::Help) => {
            print_help();
            0
        }
        Ok(Cli::Version) => {
            print_version();
            0
        }
        Ok(Cli::Execute(options, action)) => {
            init_tracing(options.verbose);
            match execute(options, action) {
                Ok(code) => code,
                Err(err) => {
                    eprintln!("envkit: {err}");
                    1
                }
            }
        }
        Err(err) => {
            eprintln!("envkit: {err}");
            eprintln!("Try `envkit --help`.");
            1
        }
    }
}

fn parse_cli(args: Vec<OsString>) -> Result<Cli, String> {
    let mut options = GlobalOptions::default();
    let mut index = 0usize;
    while index < args.len() {
        let token = args[index].to_string_lossy();
        match token.as_ref() {
            "-h" | "--help" | "help" => return Ok(Cli::Help),
            "-V" | "--version" | "version" => return Ok(Cli::Version),
            "-f" | "--file" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    return Err("missing value for `-f/--file`".to_owned());
                };
                parse_file_text(&value.to_string_lossy(), &mut options.files)?;
                index += 1;
            }
            value if value.starts_with("--file=") => {
                parse_file_text(&value["--file=".len()..], &mut options.files)?;
                index += 1;
            }
            "-i" | "--ignore-missing" => {
                options.required = false;
                index += 1;
            }
            "-k" | "--keep-existing" => {
                options.override_existing = false;
                index += 1;
            }
            "-v" | "--verbose" => {
                options.verbose = true;
                index += 1;
            }
            unknown if unknown.starts_with('-') => {
                return Err(format!("unknown option `{unknown}`"));
            }
            _ => break,
        }
    }

    let Some((command, rest)) = args[index..].split_first() else {
        return Err("missing command".to_owned());
    };

    if options.files.is_empty() {
        options.files.push(PathBuf::from(DEFAULT_FILE));
    }

    let action = parse_action(&command.to_string_lossy(), rest)?;
    Ok(Cli::Execute(options, action))
}

fn parse_action(command: &str, rest: &[OsString]) -> Result<Action, String> {
    let text: Vec<String> = rest
        .iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    match command {
        "get" => match text.as_slice() {
            [key] => Ok(Action::Get {
                key: key.clone(),
                fallback: None,
            }),
            [key, fallback] => Ok(Action::Get {
                key: key.clone(),
                fallback: Some(fallback.clone()),
            }),
            _ => Err("usage: get KEY [FALLBACK]".to_owned()),
        },
        "get-int" => match text.as_slice() {
            [key, fallback] => {
                let fallback = envkit::parse_int(fallback)
                    .ok_or_else(|| format!("fallback `{fallback}` is not an integer"))?;
                Ok(Action::GetInt {
                    key: key.clone(),
                    fallback,
                })
            }
            _ => Err("usage: get-int KEY FALLBACK".to_owned()),
        },
        "get-bool" => match text.as_slice() {
            [key, fallback] => {
                let fallback = envkit::parse_bool(fallback)
                    .ok_or_else(|| format!("fallback `{fallback}` is not a boolean"))?;
                Ok(Action::GetBool {
                    key: key.clone(),
                    fallback,
                })
            }
            _ => Err("usage: get-bool KEY FALLBACK".to_owned()),
        },
        "check" => {
            if text.is_empty() {
                return Err("usage: check KEY...".to_owned());
            }
            Ok(Action::Check { keys: text })
        }
        "run" => {
            let rest = match rest.first() {
                Some(first) if first == "--" => &rest[1..],
                _ => rest,
            };
            let Some((command, args)) = rest.split_first() else {
                return Err("missing command after `run`".to_owned());
            };
            Ok(Action::Run {
                command: command.clone(),
                args: args.to_vec(),
            })
        }
        unknown => Err(format!("unknown command `{unknown}`")),
    }
}

fn parse_file_text(raw: &str, files: &mut Vec<PathBuf>) -> Result<(), String> {
    let mut added = 0usize;
    for segment in raw.split(',') {
        let trimmed = segment.trim();
        if trimmed.is_empty() {
            continue;
        }
        files.push(PathBuf::from(trimmed));
        added += 1;
    }
    if added == 0 {
        return Err("`-f/--file` requires at least one path".to_owned());
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

fn execute(options: GlobalOptions, action: Action) -> Result<i32, String> {
    let config = load_config(&options).map_err(|err| err.to_string())?;

    match action {
        Action::Get { key, fallback } => {
            let value = match fallback {
                Some(fallback) => config.get(&key, &fallback),
                None => config.must_get(&key).unwrap_or_else(|missing| missing.exit()),
            };
            println!("{value}");
            Ok(0)
        }
        Action::GetInt { key, fallback } => {
            println!("{}", config.get_int(&key, fallback));
            Ok(0)
        }
        Action::GetBool { key, fallback } => {
            println!("{}", config.get_bool(&key, fallback));
            Ok(0)
        }
        Action::Check { keys } => {
            for key in &keys {
                if let Err(missing) = config.must_get(key) {
                    missing.exit();
                }
            }
            Ok(0)
        }
        Action::Run { command, args } => execute_command(config.into_store(), command, args),
    }
}

fn load_config(options: &GlobalOptions) -> Result<Config, Error> {
    let mut config = Config::new(EnvStore::snapshot_process());
    let loader = EnvLoader::new()
        .paths(&options.files)
        .required(options.required)
        .override_existing(options.override_existing);
    config.load_with(loader)?;
    Ok(config)
}

fn execute_command(
    store: EnvStore,
    program: OsString,
    args: Vec<OsString>,
) -> Result<i32, String> {
    let mut command = Command::new(&program);
    command.args(&args).env_clear();
    if let Some(vars) = store.as_memory() {
        command.envs(vars);
    }
    spawn(command, &program)
}

#[cfg(unix)]
fn spawn(mut command: Command, program: &OsString) -> Result<i32, String> {
    let err = command.exec();
    Err(format!(
        "failed to execute `{}`: {err}",
        program.to_string_lossy()
    ))
}

#[cfg(not(unix))]
fn spawn(mut command: Command, program: &OsString) -> Result<i32, String> {
    let status = command
        .status()
        .map_err(|err| format!("failed to execute `{}`: {err}", program.to_string_lossy()))?;
    Ok(status.code().unwrap_or(1))
}

fn print_help() {
    println!("{HELP}");
}

fn print_version() {
    println!("envkit {}", env!("CARGO_PKG_VERSION"));
}
