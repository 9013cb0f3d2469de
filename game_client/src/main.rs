use tracing::error;

#[tokio::main]
async fn main() {
    if let Err(err) = game_client::run_with_config().await {
        error!(error = %err, "client exited with error");
        std::process::exit(1);
    }
}
