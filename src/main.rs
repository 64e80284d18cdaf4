#[tokio::main]
async fn main() {
    sheetlog::run().await;
}
