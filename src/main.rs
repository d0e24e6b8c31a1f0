use clinic_records::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    server::run().await
}
