use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use colored::control as color_control;
use colored::Colorize;
use mysqldiff::cli::commands::diff::{DiffCommand, DiffCommandHandler};
use mysqldiff::cli::commands::refs::{RefsCommand, RefsCommandHandler};
use mysqldiff::cli::commands::resolve_options;
use mysqldiff::cli::{Cli, Commands};
use mysqldiff::core::config::Options;
use mysqldiff::core::naming;
use std::env;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(error) => {
            eprintln!("{} {:#}", "Error:".red().bold(), error);
            process::exit(1);
        }
    }
}

/// コマンドを実行する
fn run_command(cli: Cli) -> Result<String> {
    // --no-color フラグの処理
    if cli.no_color {
        color_control::set_override(false);
    }

    // --verbose フラグの処理: tracing subscriber を初期化
    // MYSQLDIFF_LOG 環境変数が設定されている場合はそちらを優先する
    let filter = if let Ok(env_filter) = env::var(naming::LOG_ENV_VAR) {
        EnvFilter::new(env_filter)
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    // try_init() を使用して二重登録時のパニックを防止
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();

    if cli.verbose {
        debug!("Verbose mode enabled");
    }

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Diff {
            from,
            to,
            output,
            table_re,
            only_both,
            keep_old_tables,
            list_tables,
            no_old_defs,
            tolerant,
            save_quotes,
        } => {
            let cli_options = Options {
                table_re,
                only_both,
                keep_old_tables,
                list_tables,
                no_old_defs,
                tolerant,
                save_quotes,
                run_time: Some(Utc::now()),
                ..Options::default()
            };
            let options = resolve_options(config_path, cli_options)?;
            let command = DiffCommand {
                from,
                to,
                output,
                options,
            };
            DiffCommandHandler::execute(&command)
        }
        Commands::Refs {
            from,
            table_re,
            list_tables,
            save_quotes,
        } => {
            let cli_options = Options {
                table_re,
                refs: true,
                list_tables,
                save_quotes,
                ..Options::default()
            };
            let options = resolve_options(config_path, cli_options)?;
            let command = RefsCommand { from, options };
            RefsCommandHandler::execute(&command)
        }
    }
}
