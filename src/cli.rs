// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf};

use crate::core::config::{DEFAULT_CONFIG_FILE, RunOverrides};
use crate::infra::t;

pub mod commands;

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` or `--lang=<VALUE>` argument.
fn pre_parse_language() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--lang") {
        return args.get(pos + 1).cloned();
    }
    args.iter()
        .find_map(|arg| arg.strip_prefix("--lang="))
        .map(str::to_string)
}

pub fn build_cli(locale: &str) -> Command {
    Command::new("coverage-matrix")
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli_about", locale = locale).to_string())
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli_lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("run")
                .about(t!("cmd_run_about", locale = locale).to_string())
                .arg(
                    Arg::new("granularity")
                        .short('g')
                        .long("granularity")
                        .help(t!("arg_granularity", locale = locale).to_string())
                        .value_name("GRANULARITY")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("input")
                        .short('i')
                        .long("input")
                        .help(t!("arg_input", locale = locale).to_string())
                        .value_name("DIRS")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("coverage")
                        .short('c')
                        .long("coverage")
                        .help(t!("arg_coverage", locale = locale).to_string())
                        .value_name("FILE")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("result")
                        .short('r')
                        .long("result")
                        .help(t!("arg_result", locale = locale).to_string())
                        .value_name("FILE")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .help(t!("arg_config", locale = locale, default = DEFAULT_CONFIG_FILE).to_string())
                        .value_name("CONFIG")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("html")
                        .long("html")
                        .help(t!("arg_html", locale = locale).to_string())
                        .value_name("HTML")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("init")
                .about(t!("cmd_init_about", locale = locale).to_string())
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help(t!("arg_non_interactive", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn run_overrides(matches: &ArgMatches) -> RunOverrides {
    RunOverrides {
        granularity: matches.get_one::<String>("granularity").cloned(),
        inputs: matches
            .get_many::<String>("input")
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
        coverage_output: matches.get_one::<String>("coverage").cloned(),
        results_output: matches.get_one::<String>("result").cloned(),
    }
}

pub async fn run() -> Result<()> {
    // Pre-parse language and initialize i18n first.
    let requested = pre_parse_language();
    let language = match &requested {
        Some(lang) => {
            let language = crate::resolve_locale(lang).to_string();
            rust_i18n::set_locale(&language);
            language
        }
        None => crate::init(),
    };

    let matches = build_cli(&language).get_matches();

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            commands::run::execute(commands::run::RunArgs {
                config: run_matches.get_one::<PathBuf>("config").cloned(),
                overrides: run_overrides(run_matches),
                html: run_matches.get_one::<PathBuf>("html").cloned(),
                language: requested.as_ref().map(|_| language.clone()),
            })
            .await?;
        }
        Some(("init", init_matches)) => {
            let non_interactive = init_matches.get_flag("non-interactive");

            // Show language detection message if it was auto-detected
            if requested.is_none() {
                println!(
                    "🌐 {}",
                    t!("system_language_detected", locale = &language, lang = &language)
                );
            }
            commands::init::run_init_wizard(
                &language,
                non_interactive,
                std::path::Path::new(DEFAULT_CONFIG_FILE),
            )?;
        }
        _ => {
            build_cli(&language).print_help()?;
        }
    }
    Ok(())
}
