use clap::Parser;
use std::env;

use savings_timeline::api::{Cli, run_cli};

#[tokio::main]
async fn main() {
    savings_timeline::init_tracing();

    let raw_args: Vec<String> = env::args().collect();
    match raw_args.get(1).map(|s| s.as_str()) {
        Some("serve") => {
            let port = raw_args
                .get(2)
                .and_then(|s| s.parse::<u16>().ok())
                .unwrap_or(8080);
            if let Err(e) = savings_timeline::api::run_http_server(port).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Some("simulate") => {
            let cli = Cli::parse_from(raw_args.iter().skip(1));
            match run_cli(cli) {
                Ok(output) => println!("{output}"),
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }
        _ => {
            eprintln!("Usage: savings-timeline serve [port]");
            eprintln!("       savings-timeline simulate [--policy conventional|reasoning] [--config file.json] [--compare] [overrides...]");
            std::process::exit(1);
        }
    }
}
