//! Suspending client against a live API deployment.
//!
//! Run with:
//!
//! ```text
//! CWAPI_SERVER=CW3 CWAPI_INSTANCE=<name> CWAPI_PASSWORD=<secret> \
//!     RUST_LOG=cwapi=debug cargo run --example async_client --features logging -- <user_id>
//! ```

use std::time::Duration;

use cwapi::{
    //
    protocol::{Request, Response},
    AnyApiClient,
    ClientBuilder,
    ClientConfig,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_ansi(false)
        .init();

    let user_id: i64 = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: async_client <user_id>"))?
        .parse()?;

    let config = ClientConfig::from_env()?;
    let AnyApiClient::Suspending(mut client) = ClientBuilder::new().from_config(config).build()? else {
        anyhow::bail!("set CWAPI_MODE=suspending for this demo");
    };

    client.connect().await?;

    // The client never times out on its own.
    let request = Request::GetStock { user_id };
    match tokio::time::timeout(Duration::from_secs(10), client.ask(&request)).await {
        Ok(Ok(Response::Stock(stock))) => {
            for cell in stock.iter() {
                println!("{} {} {:?}", cell.code, cell.name, cell.quantity);
            }
        }
        Ok(Ok(other)) => println!("{other:?}"),
        Ok(Err(e)) => eprintln!("ask failed: {e}"),
        Err(_) => eprintln!("no reply within 10s"),
    }

    client.disconnect().await?;
    Ok(())
}
