#[tokio::main]
async fn main() -> anyhow::Result<()> {
    crammode_backend::run().await
}
