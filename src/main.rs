use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = correlation_id::cli::Cli::parse();
    if let Err(e) = correlation_id::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
