use fluent_bridge::error::BridgeError;

#[tokio::main]
async fn main() -> Result<(), BridgeError> {
    fluent_bridge::app::run().await
}
