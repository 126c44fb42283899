mod cli;
mod render;

use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();
    if let Err(err) = cli::run(cli).await {
        eprintln!("error: {}", err.user_message());
        std::process::exit(1);
    }
}
