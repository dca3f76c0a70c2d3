#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cuotiben_backend::run().await
}
