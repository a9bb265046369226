#[tokio::main]
async fn main() -> anyhow::Result<()> {
    carvest_app::run().await
}
