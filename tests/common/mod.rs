// tests/common/mod.rs

#![allow(dead_code)]

use bytes::Bytes;
use serde_json::{json, Value};

use cwapi::{MemoryBroker, Server, ServerProfile};

/// Local endpoint used by every test client; the memory broker ignores it.
pub fn local_server() -> Server {
    // ---
    Server::Classic(ServerProfile::new("amqp", "localhost", 5672).expect("valid profile"))
}

/// Answer every request to `instance` the way the game would.
///
/// `GetBasicInfo` echoes the requested user id back as `atk`, so a test can
/// tell which request a reply belongs to. Operations without a canned
/// answer are refused with `"NotImplemented"`.
pub fn serve_game(broker: &MemoryBroker, instance: &str) {
    // ---
    broker.serve_instance(instance, |body| match serde_json::from_slice::<Value>(body) {
        Ok(request) => Bytes::from(reply_to(&request).to_string()),
        Err(_) => Bytes::from_static(b"not a reply"),
    });
}

fn reply_to(request: &Value) -> Value {
    // ---
    let action = request["action"].as_str().unwrap_or_default();
    let payload = &request["payload"];

    match action {
        "GetBasicInfo" => json!({
            "action": action,
            "result": "Ok",
            "payload": {"class": "knight", "atk": payload["user_id"], "def": 7}
        }),
        "GetStock" => json!({
            "action": action,
            "result": "Ok",
            "payload": {
                "stock": {"Thread": 120, "Pelt": 2},
                "codes": {"01": "Thread", "02": "Pelt", "03": "Pelt"}
            }
        }),
        "TradeTerminal" => json!({
            "action": action,
            "result": "Ok",
            "payload": {
                "item_code": payload["item_code"],
                "quantity": payload["quantity"],
                "price": payload["price"]
            }
        }),
        _ => json!({"action": action, "result": "NotImplemented"}),
    }
}

#[cfg(feature = "logging")]
mod imp {
    use std::sync::Once;

    static INIT: Once = Once::new();

    pub fn init() {
        INIT.call_once(|| {
            let _ = env_logger::builder().is_test(true).try_init();
        });
    }
}

#[cfg(not(feature = "logging"))]
mod imp {
    #[inline]
    pub fn init() {}
}

pub fn init_logging() {
    imp::init();
}
