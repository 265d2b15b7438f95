// tests/client_blocking.rs

mod common;

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use bytes::Bytes;

use cwapi::{
    //
    protocol::{Request, Response, TradeReceipt},
    BlockingApiClient,
    BrokerEvent,
    ClientBuilder,
    Error,
    MemoryBroker,
    ModeKind,
    Result,
};

use common::{init_logging, local_server, serve_game};

fn client(broker: &MemoryBroker, instance: &str) -> BlockingApiClient {
    // ---
    BlockingApiClient::with_broker(local_server(), instance, "secret", Arc::new(broker.clone()))
        .expect("valid identity")
}

fn atk_of(response: &Response) -> i32 {
    // ---
    match response {
        Response::BasicInfo(info) => info.atk,
        other => panic!("expected basic info, got {other:?}"),
    }
}

#[test]
fn test_bot1_round_trip() -> Result<()> {
    // ---
    init_logging();

    let broker = MemoryBroker::new();
    serve_game(&broker, "bot1");

    let mut client = client(&broker, "bot1");
    assert_eq!(client.mode(), ModeKind::Blocking);
    assert!(matches!(
        client.ask(&Request::GetBasicInfo { user_id: 1 }),
        Err(Error::NotConnected)
    ));

    client.connect()?;
    let response = client.ask(&Request::GetBasicInfo { user_id: 11 })?;
    assert_eq!(atk_of(&response), 11);

    let receipt = client.ask(&Request::TradeTerminal {
        user_id: 11,
        item_code: "07".into(),
        quantity: 3,
        price: 12,
    })?;
    assert_eq!(
        receipt,
        Response::TradeTerminal(TradeReceipt {
            item_code: "07".into(),
            quantity: 3,
            price: 12
        })
    );

    client.disconnect()?;
    assert!(matches!(
        client.ask(&Request::GetBasicInfo { user_id: 1 }),
        Err(Error::NotConnected)
    ));
    Ok(())
}

#[test]
fn test_decode_failure_releases_guard() -> Result<()> {
    // ---
    let broker = MemoryBroker::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    broker.serve_instance("bot1", move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Bytes::from_static(b"\xff\xfe not json")
        } else {
            Bytes::from_static(br#"{"action":"GetBasicInfo","result":"Ok","payload":{"class":"alchemist","atk":3,"def":4}}"#)
        }
    });

    let mut client = client(&broker, "bot1");
    client.connect()?;

    assert!(matches!(
        client.ask(&Request::GetBasicInfo { user_id: 1 }),
        Err(Error::DecodeFailure(_))
    ));

    // A guard left locked would hang this thread, so wait on it from here.
    let client = Arc::new(client);
    let (tx, rx) = mpsc::channel();
    let worker = Arc::clone(&client);
    thread::spawn(move || {
        let _ = tx.send(worker.ask(&Request::GetBasicInfo { user_id: 1 }));
    });

    let response = rx
        .recv_timeout(Duration::from_secs(1))
        .expect("guard still held after decode failure")?;
    assert_eq!(atk_of(&response), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
fn test_threads_are_serialized() -> Result<()> {
    // ---
    init_logging();

    let broker = MemoryBroker::new();
    serve_game(&broker, "bot1");

    let mut client = client(&broker, "bot1");
    client.connect()?;
    log::info!("spawning workers against {}", client.input_queue_name());

    let client = &client;
    thread::scope(|s| {
        let workers: Vec<_> = (0..8)
            .map(|i| {
                s.spawn(move || {
                    let response = client.ask(&Request::GetBasicInfo { user_id: i })?;
                    assert_eq!(i64::from(atk_of(&response)), i);
                    Ok::<_, Error>(())
                })
            })
            .collect();

        for worker in workers {
            worker.join().expect("worker panicked")?;
        }
        Ok::<_, Error>(())
    })?;

    // No publish may happen between another call's publish and its consume.
    let events = broker.events();
    let mut in_flight = false;
    for event in &events {
        match event {
            BrokerEvent::Published { .. } => {
                assert!(!in_flight, "publish while a call was in flight");
                in_flight = true;
            }
            BrokerEvent::Consumed { .. } => {
                assert!(in_flight, "consume without a publish");
                in_flight = false;
            }
            _ => {}
        }
    }
    assert!(!in_flight);
    Ok(())
}

#[test]
fn test_connected_scope_disconnects_on_drop() -> Result<()> {
    // ---
    let broker = MemoryBroker::new();
    serve_game(&broker, "bot1");
    let mut client = client(&broker, "bot1");

    {
        let scope = client.connected()?;
        assert!(scope.is_connected());
        assert_eq!(atk_of(&scope.ask(&Request::GetBasicInfo { user_id: 4 })?), 4);
    }
    assert!(!client.is_connected());

    let unwound = panic::catch_unwind(AssertUnwindSafe(|| {
        let _scope = client.connected().expect("connect");
        panic!("caller failed mid-session");
    }));
    assert!(unwound.is_err());
    assert!(!client.is_connected());
    assert_eq!(broker.events().last(), Some(&BrokerEvent::ConnectionClosed));

    client.connected()?.close()?;
    assert!(!client.is_connected());
    Ok(())
}

#[test]
fn test_scoped_body_error_wins() -> Result<()> {
    // ---
    let broker = MemoryBroker::new();
    serve_game(&broker, "bot1");
    let mut client = client(&broker, "bot1");

    let atk = client.scoped(|c| c.ask(&Request::GetBasicInfo { user_id: 8 }).map(|r| atk_of(&r)))?;
    assert_eq!(atk, 8);

    let failed: Result<()> = client.scoped(|_| Err(Error::DecodeFailure("bad reply".into())));
    assert!(matches!(failed, Err(Error::DecodeFailure(_))));
    assert!(!client.is_connected());
    Ok(())
}

#[test]
fn test_connection_failure_surfaces() {
    // ---
    let broker = MemoryBroker::new();
    serve_game(&broker, "bot1");
    broker.set_unreachable(true);

    let mut client = client(&broker, "bot1");
    assert!(matches!(client.connect(), Err(Error::ConnectionFailure(_))));
    assert!(!client.is_connected());

    broker.set_unreachable(false);
    assert!(client.connect().is_ok());

    broker.drop_connections();
    assert!(matches!(
        client.ask(&Request::GetBasicInfo { user_id: 1 }),
        Err(Error::ConnectionFailure(_))
    ));
}

#[test]
fn test_builder_makes_blocking_client() -> Result<()> {
    // ---
    let broker = MemoryBroker::new();
    serve_game(&broker, "bot7");

    let mut client = ClientBuilder::new()
        .server(local_server())
        .instance_name("bot7")
        .password("secret")
        .broker(Arc::new(broker.clone()))
        .blocking()
        .build_blocking()?;

    client.connect()?;
    assert_eq!(atk_of(&client.ask(&Request::GetBasicInfo { user_id: 70 })?), 70);
    client.disconnect()
}

#[test]
fn test_secret_stays_out_of_debug_output() {
    // ---
    let broker = MemoryBroker::new();
    let client = BlockingApiClient::with_broker(local_server(), "bot1", "hunter2", Arc::new(broker))
        .expect("valid identity");

    assert!(client.connection_link().expose().contains("hunter2"));
    assert!(!format!("{:?}", client.connection_link()).contains("hunter2"));
    assert!(!client.connection_link().to_string().contains("hunter2"));
    assert!(!format!("{client:?}").contains("hunter2"));
}
