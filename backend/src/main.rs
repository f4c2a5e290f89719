#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
  velour_lib::run().await
}
