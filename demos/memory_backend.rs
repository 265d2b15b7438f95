//! Drives both client modes against the in-memory broker.
//!
//! Run with: cargo run --example memory_backend --features logging

use std::sync::Arc;

use bytes::Bytes;
use cwapi::{
    //
    protocol::{Request, Response},
    AsyncApiClient,
    BlockingApiClient,
    MemoryBroker,
    Result,
    Server,
    ServerProfile,
};
use serde_json::{json, Value};

/// Stand-in for the game: answers every basic-info request.
fn serve(broker: &MemoryBroker, instance: &str) {
    // ---
    broker.serve_instance(instance, |body| {
        let user_id = serde_json::from_slice::<Value>(body)
            .map(|request| request["payload"]["user_id"].clone())
            .unwrap_or(Value::Null);

        let reply = json!({
            "action": "GetBasicInfo",
            "result": "Ok",
            "payload": {"class": "ranger", "atk": user_id, "def": 10}
        });
        Bytes::from(reply.to_string())
    });
}

fn show(mode: &str, response: &Response) {
    // ---
    if let Response::BasicInfo(info) = response {
        println!("[{mode}] {} atk={} def={}", info.class, info.atk, info.def);
    }
}

fn main() -> Result<()> {
    // ---
    env_logger::init();

    let broker = MemoryBroker::new();
    serve(&broker, "demo");
    let server = Server::Classic(ServerProfile::new("amqp", "localhost", 5672)?);

    // Blocking: plain threads, no runtime needed by the caller.
    let mut client = BlockingApiClient::with_broker(server.clone(), "demo", "secret", Arc::new(broker.clone()))?;
    println!("connecting via {}", client.connection_link());
    client.scoped(|c| {
        show("blocking", &c.ask(&Request::GetBasicInfo { user_id: 1 })?);
        Ok(())
    })?;

    // Suspending: the caller brings the runtime.
    let runtime = tokio::runtime::Runtime::new().map_err(|e| cwapi::Error::ConnectionFailure(e.to_string()))?;
    runtime.block_on(async {
        let mut client = AsyncApiClient::with_broker(server, "demo", "secret", Arc::new(broker.clone()))?;
        client.connect().await?;

        let (a, b) = tokio::join!(
            client.ask(&Request::GetBasicInfo { user_id: 2 }),
            client.ask(&Request::GetBasicInfo { user_id: 3 }),
        );
        show("suspending", &a?);
        show("suspending", &b?);

        client.disconnect().await
    })
}
