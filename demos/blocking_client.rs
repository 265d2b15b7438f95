//! Blocking client against a live API deployment.
//!
//! Run with:
//!
//! ```text
//! CWAPI_SERVER=International CWAPI_INSTANCE=<name> CWAPI_PASSWORD=<secret> \
//!     cargo run --example blocking_client -- <user_id>
//! ```

use cwapi::{protocol::Request, ClientBuilder, ClientConfig, ModeKind};

fn main() -> anyhow::Result<()> {
    // ---
    env_logger::init();

    let user_id: i64 = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: blocking_client <user_id>"))?
        .parse()?;

    let config = ClientConfig::from_env()?.with_mode(ModeKind::Blocking);
    let mut client = ClientBuilder::new().from_config(config).build_blocking()?;

    let session = client.connected()?;
    for request in [
        Request::GetBasicInfo { user_id },
        Request::GetUserProfile { user_id },
        Request::GetGearInfo { user_id },
    ] {
        println!("{:?}", session.ask(&request)?);
    }
    session.close()?;

    Ok(())
}
