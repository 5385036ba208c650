// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use fleetdesk_api::{HttpRecordStore, Session};
use fleetdesk_app::catalog;
use fleetdesk_engine::ManagementScreen;
use runtime::Command;
use std::env;
use std::io;
use std::path::PathBuf;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `fleetdesk --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    init_logging(&config);

    let entities_dir = config.entities_dir();
    let configs = catalog::load_all(entities_dir.as_deref()).with_context(|| {
        format!(
            "load entity configurations -- fix the files under [entities].dir in {}",
            options.config_path.display()
        )
    })?;

    if options.list_entities {
        for entity in &configs {
            println!("{:<14} {:?}  {}", entity.entity_name, entity.kind, entity.title);
        }
        return Ok(());
    }

    let store = HttpRecordStore::new(config.base_url(), config.timeout()?).with_context(|| {
        format!(
            "invalid [api] config in {}; fix base_url/timeout values",
            options.config_path.display()
        )
    })?;
    if options.check_only {
        log::info!(
            "config ok: {} entities, api at {}",
            configs.len(),
            store.base_url()
        );
        return Ok(());
    }

    let [entity_name, command_args @ ..] = options.positional.as_slice() else {
        bail!("missing entity -- run `fleetdesk --list-entities` to see the choices");
    };
    let entity = catalog::by_name(&configs, entity_name)?;
    let command = Command::parse(command_args)?;

    let token = config.token();
    if token.is_none() {
        log::warn!(
            "no token in ${}; requests will be rejected until it is set",
            config.token_env()
        );
    }
    let mut session = Session::new(token, config.roles());
    if let Some(expires_at) = config.expires_at()? {
        session = session.with_expiry(expires_at);
    }

    let mut screen = ManagementScreen::open(entity, &store, &session);
    let mut stdout = io::stdout().lock();
    let result = runtime::execute(&mut screen, &command, &mut stdout);
    if session.is_logged_out() {
        eprintln!(
            "session closed -- export a fresh token in ${} and retry",
            config.token_env()
        );
    }
    result
}

/// `RUST_LOG` wins over `[logging] level`.
fn init_logging(config: &Config) {
    let env = env_logger::Env::default().default_filter_or(config.log_level());
    if let Err(error) = env_logger::Builder::from_env(env).try_init() {
        eprintln!("logging disabled: {error}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    list_entities: bool,
    check_only: bool,
    show_help: bool,
    /// `<entity> <command> [args...]`, verbatim.
    positional: Vec<String>,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        list_entities: false,
        check_only: false,
        show_help: false,
        positional: Vec::new(),
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if !options.positional.is_empty() {
            options.positional.push(arg.as_ref().to_owned());
            continue;
        }
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--list-entities" => {
                options.list_entities = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown if unknown.starts_with('-') => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
            positional => options.positional.push(positional.to_owned()),
        }
    }

    Ok(options)
}

fn print_help() {
    println!("fleetdesk <entity> <command> [args...]");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --list-entities          List the configured entities");
    println!("  --check                  Validate config + entity files and exit");
    println!("  --help                   Show this help");
    println!();
    println!("commands:");
    println!("  search <query>                    List matching records");
    println!("  create field=value...             Register a new record");
    println!("  edit <query> <n> field=value...   Update result n of a search");
    println!("  deactivate <id>                   Deactivate a record");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, parse_cli_args};
    use anyhow::Result;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/fleetdesk-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                print_example: false,
                list_entities: false,
                check_only: false,
                show_help: false,
                positional: Vec::new(),
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_config_value() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_print_list_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--print-config-path",
                "--print-example-config",
                "--list-entities",
                "--check",
            ],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.list_entities);
        assert!(options.check_only);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }

    #[test]
    fn arguments_after_the_entity_are_kept_verbatim() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/c.toml", "clientes", "create", "nombre=-Ana-", "-h"],
            default_options_path(),
        )?;
        assert!(!options.show_help);
        assert_eq!(
            options.positional,
            vec!["clientes", "create", "nombre=-Ana-", "-h"]
        );
        Ok(())
    }
}
