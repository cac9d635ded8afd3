#[tokio::main]
async fn main() {
    modelq_cli::logging::init();
    if let Err(e) = modelq_cli::run(std::env::args().collect()).await {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
