use clap::Parser;

use admetrics::cli::Cli;
use admetrics::config;
use admetrics::system::logging::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    config::init_config(cli.config.as_deref());

    // guard 释放时才会刷新缓冲中的日志
    let log_guard = init_logging(&config::get_config().logging)?;

    let result = match cli.command {
        None => admetrics::runtime::modes::run_server().await,
        Some(cmd) => match admetrics::runtime::modes::run_cli(cmd).await {
            Ok(()) => Ok(()),
            Err(e) => {
                eprintln!("{}", e.format_colored());
                drop(log_guard);
                std::process::exit(1);
            }
        },
    };

    drop(log_guard);
    result
}
