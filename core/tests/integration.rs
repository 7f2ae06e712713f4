//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts its own mock server on a random port so account and
//! order state never leaks between tests, then drives the flow through
//! `CanteenApi` or a raw `ApiConnection` over real HTTP.

use std::io::Write;

use canteen_core::{
    ui_channel, AccountRole, ApiConnection, ApiError, ApiTask, CanteenApi, Credentials, MenuItem,
    Method, NewAccount, NewOrder, OrderLine, Profile,
};
use uuid::Uuid;

/// Boots the mock server on an OS-assigned port and returns its base URL.
fn spawn_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn marta() -> NewAccount {
    NewAccount {
        username: "marta.k".to_string(),
        password: "supersafe1".to_string(),
        role: AccountRole::User,
    }
}

fn marta_credentials() -> Credentials {
    Credentials {
        username: "marta.k".to_string(),
        password: "supersafe1".to_string(),
    }
}

#[test]
fn register_then_fetch_profile() {
    let api = CanteenApi::with_endpoint(&spawn_server());

    let profile = api.register(&marta()).unwrap();
    assert_eq!(profile.username, "marta.k");
    assert_eq!(profile.role, AccountRole::User);

    let fetched = api.profile(&marta_credentials()).unwrap();
    assert_eq!(fetched, profile);
}

#[test]
fn wrong_password_surfaces_server_detail() {
    let api = CanteenApi::with_endpoint(&spawn_server());
    api.register(&marta()).unwrap();

    let bad = Credentials {
        username: "marta.k".to_string(),
        password: "wrongpass1".to_string(),
    };
    let err = api.profile(&bad).unwrap_err();
    match err {
        ApiError::Api(detail) => assert_eq!(detail, "invalid credentials"),
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[test]
fn duplicate_username_surfaces_server_detail() {
    let api = CanteenApi::with_endpoint(&spawn_server());
    api.register(&marta()).unwrap();

    let err = api.register(&marta()).unwrap_err();
    match err {
        ApiError::Api(detail) => assert_eq!(detail, "username already taken"),
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[test]
fn order_flow_prices_server_side() {
    let api = CanteenApi::with_endpoint(&spawn_server());
    api.register(&marta()).unwrap();
    let credentials = marta_credentials();

    let menu = api.menu().unwrap();
    assert!(menu.len() >= 2);

    let order = api
        .place_order(
            &credentials,
            &NewOrder {
                lines: vec![
                    OrderLine {
                        item: menu[0].id,
                        quantity: 2,
                    },
                    OrderLine {
                        item: menu[1].id,
                        quantity: 1,
                    },
                ],
            },
        )
        .unwrap();

    let expected = u64::from(menu[0].price_cents) * 2 + u64::from(menu[1].price_cents);
    assert_eq!(order.total_cents, expected);
    assert_eq!(order.placed_by, "marta.k");

    let orders = api.orders(&credentials).unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0], order);
}

#[test]
fn unknown_menu_item_surfaces_server_detail() {
    let api = CanteenApi::with_endpoint(&spawn_server());
    api.register(&marta()).unwrap();

    let err = api
        .place_order(
            &marta_credentials(),
            &NewOrder {
                lines: vec![OrderLine {
                    item: Uuid::nil(),
                    quantity: 1,
                }],
            },
        )
        .unwrap_err();
    match err {
        ApiError::Api(detail) => assert_eq!(
            detail,
            "unknown menu item 00000000-0000-0000-0000-000000000000"
        ),
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[test]
fn missing_error_body_falls_back_to_generic_message() {
    // axum answers unknown paths with a bodyless 404.
    let url = spawn_server();
    let mut conn = ApiConnection::new(&url, Method::Get, "/nonexistent", 200, None).unwrap();

    let err = conn.connect().unwrap_err();
    match err {
        ApiError::Api(detail) => {
            assert_eq!(detail, "unexpected response code 404 but no error sent")
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[test]
fn unexpected_success_status_is_still_rejected() {
    // GET /menu answers 200; a connection insisting on 201 must fail, and
    // the JSON array body carries no detail field to quote.
    let url = spawn_server();
    let mut conn = ApiConnection::new(&url, Method::Get, "/menu", 201, None).unwrap();

    let err = conn.connect().unwrap_err();
    match err {
        ApiError::Api(detail) => {
            assert_eq!(detail, "unexpected response code 200 but no error sent")
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[test]
fn connect_failure_is_a_network_error() {
    // Bind a port, learn it, drop it; nothing listens there afterwards.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let url = format!("http://127.0.0.1:{port}");
    let mut conn = ApiConnection::new(&url, Method::Get, "/menu", 200, None).unwrap();

    let err = conn.connect().unwrap_err();
    match err {
        ApiError::Network { context, .. } => {
            assert_eq!(context, "could not make GET request to /menu");
        }
        other => panic!("expected Network error, got {other:?}"),
    }
}

#[test]
fn raw_connection_reads_menu() {
    let url = spawn_server();
    let mut conn = ApiConnection::new(&url, Method::Get, "/menu", 200, None).unwrap();

    let reader = conn.response_reader().unwrap();
    let menu: Vec<MenuItem> = serde_json::from_reader(reader).unwrap();
    assert_eq!(menu.len(), 3);
}

#[test]
fn raw_connection_writes_registration_body() {
    let url = spawn_server();
    let mut conn = ApiConnection::new(&url, Method::Post, "/users", 201, None).unwrap();

    let mut writer = conn.request_writer().unwrap();
    serde_json::to_writer(&mut writer, &marta()).unwrap();
    writer.close().unwrap();

    let reader = conn.response_reader().unwrap();
    let profile: Profile = serde_json::from_reader(reader).unwrap();
    assert_eq!(profile.username, "marta.k");
}

#[test]
fn connect_after_success_does_not_resend() {
    let url = spawn_server();
    let mut conn = ApiConnection::new(&url, Method::Post, "/users", 201, None).unwrap();

    let mut writer = conn.request_writer().unwrap();
    serde_json::to_writer(&mut writer, &marta()).unwrap();
    writer.close().unwrap();

    // A second round trip would answer 409 for the duplicate username, so
    // connect succeeding twice proves the request went out exactly once.
    conn.connect().unwrap();
    conn.connect().unwrap();

    let reader = conn.response_reader().unwrap();
    let profile: Profile = serde_json::from_reader(reader).unwrap();
    assert_eq!(profile.username, "marta.k");
}

#[test]
fn failed_connection_replays_the_same_error() {
    // Declare 200 as success for registration, which answers 201: the
    // first connect fails with the generic message. A second dial would
    // re-register and be answered 409 "username already taken", so the
    // replay is only identical if the network was left alone.
    let url = spawn_server();
    let mut conn = ApiConnection::new(&url, Method::Post, "/users", 200, None).unwrap();

    let mut writer = conn.request_writer().unwrap();
    serde_json::to_writer(&mut writer, &marta()).unwrap();
    writer.close().unwrap();

    let first = conn.connect().unwrap_err();
    let second = conn.connect().unwrap_err();
    assert_eq!(
        first.to_string(),
        "unexpected response code 201 but no error sent"
    );
    assert_eq!(second.to_string(), first.to_string());
}

#[test]
fn writer_rejected_after_request_was_sent() {
    let url = spawn_server();
    let mut conn = ApiConnection::new(&url, Method::Post, "/users", 201, None).unwrap();

    let mut writer = conn.request_writer().unwrap();
    writer.write_all(br#"{"username":"abcd","password":"12345678","role":"user"}"#)
        .unwrap();
    writer.close().unwrap();
    conn.connect().unwrap();

    let err = conn.request_writer().unwrap_err();
    assert!(matches!(err, ApiError::Network { .. }));
}

#[test]
fn task_delivers_menu_to_the_ui_queue() {
    let url = spawn_server();
    let (handle, queue) = ui_channel();

    let api = CanteenApi::with_endpoint(&url);
    let (tx, rx) = std::sync::mpsc::channel();
    let task = ApiTask::new(
        move || api.menu(),
        move |menu| {
            tx.send(menu.len()).unwrap();
        },
        |err| panic!("menu fetch failed: {err}"),
    );

    let worker = task.spawn(handle);
    worker.join().unwrap();

    assert!(queue.run_next());
    assert_eq!(rx.recv().unwrap(), 3);
}

#[test]
fn task_failure_reaches_the_failure_callback() {
    let url = spawn_server();
    let (handle, queue) = ui_channel();

    let api = CanteenApi::with_endpoint(&url);
    let (tx, rx) = std::sync::mpsc::channel();
    let task = ApiTask::new(
        // Nobody registered, so the profile call is rejected.
        move || api.profile(&marta_credentials()),
        |profile| panic!("expected failure, got {profile:?}"),
        move |err| {
            tx.send(err.to_string()).unwrap();
        },
    );

    let worker = task.spawn(handle);
    worker.join().unwrap();

    assert!(queue.run_next());
    assert_eq!(rx.recv().unwrap(), "invalid credentials");
}
