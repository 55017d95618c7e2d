#[tokio::main]
async fn main() {
    if let Err(e) = headnav::run().await {
        eprintln!("headnav: {e}");
        std::process::exit(1);
    }
}
