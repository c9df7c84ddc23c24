use crypto_scanner::cli;

#[tokio::main]
async fn main() {
    cli::run().await;
}
