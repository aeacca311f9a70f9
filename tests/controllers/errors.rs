//! Handler failures, panics, and result emission.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};
use socket_controllers::{
    Action, ConfigError, Controller, DispatchError, HandlerError, Param, SocketControllers,
};

use crate::support::{recv, server, settle, Log};

#[derive(Default)]
struct Orders;

/// `(stage, message)` for every error the handler received.
type Seen = Arc<Mutex<Vec<(&'static str, String)>>>;

fn stage(error: &DispatchError) -> &'static str {
    match error {
        DispatchError::Resolution { .. } => "resolution",
        DispatchError::Middleware { .. } => "middleware",
        DispatchError::Handler { .. } => "handler",
        DispatchError::Panicked { .. } => "panicked",
        DispatchError::Container(_) => "container",
    }
}

fn orders() -> Controller<Orders> {
    Controller::<Orders>::new("/orders")
        .action(
            Action::on_message("place", "place")
                .param(Param::message_body())
                .emit_on_success("placed")
                .emit_on_fail("place_failed")
                .handle_sync(|_, params| {
                    let qty: i64 = params.body(0)?.unwrap_or_default();
                    if qty <= 0 {
                        return Err(HandlerError::Rejected("nope".into()));
                    }
                    Ok(json!({ "qty": qty }))
                }),
        )
        .action(
            Action::on_message("explode", "explode")
                .emit_on_fail("explode_failed")
                .handle_sync(|_, _| panic!("kaboom")),
        )
        .action(
            Action::on_message("lookup", "lookup")
                .param(Param::custom(|inv| {
                    inv.arg(0)
                        .and_then(Value::as_str)
                        .map(|id| json!(id))
                        .ok_or_else(|| HandlerError::NotFound("order id".into()))
                }))
                .emit_on_success("found")
                .handle_sync(|_, params| Ok(params.value(0)?.cloned().unwrap_or(Value::Null))),
        )
        .action(
            Action::on_message("maybe", "maybe")
                .param(Param::message_body())
                .emit_on_success("maybe_result")
                .skip_emit_on_empty_result()
                .handle_sync(|_, params| Ok(params.body_value(0)?.cloned().unwrap_or(Value::Null))),
        )
}

fn start(seen: &Seen) -> (Arc<socket_controllers::memory::MemoryServer>, SocketControllers) {
    let server = server();
    let errors = seen.clone();
    let app = SocketControllers::builder()
        .transport(server.clone())
        .controller_descriptor(orders())
        .error_handler(move |error, _| errors.lock().push((stage(error), error.to_string())))
        .start()
        .unwrap();
    (server, app)
}

#[tokio::test]
async fn handler_error_emits_fail_event_and_keeps_connection() {
    let seen = Seen::default();
    let (server, _app) = start(&seen);
    let client = server.connect("/orders").unwrap();

    client.emit("place", vec![json!(0)]).unwrap();
    assert_eq!(
        recv(&client, "place_failed").await,
        vec![json!({ "message": "rejected: nope" })]
    );
    settle().await;
    assert_eq!(
        *seen.lock(),
        vec![("handler", "handler Orders::place failed: rejected: nope".to_string())]
    );

    assert!(client.is_connected());
    client.emit("place", vec![json!(3)]).unwrap();
    assert_eq!(recv(&client, "placed").await, vec![json!({ "qty": 3 })]);
}

#[tokio::test]
async fn panics_are_reported_not_propagated() {
    let seen = Seen::default();
    let (server, _app) = start(&seen);
    let client = server.connect("/orders").unwrap();

    client.emit("explode", vec![]).unwrap();
    let failed = recv(&client, "explode_failed").await;
    assert_eq!(
        failed,
        vec![json!({ "message": "handler Orders::explode panicked: kaboom" })]
    );

    client.emit("place", vec![json!(1)]).unwrap();
    assert_eq!(recv(&client, "placed").await, vec![json!({ "qty": 1 })]);
    assert_eq!(seen.lock().len(), 1);
    assert_eq!(seen.lock()[0].0, "panicked");
}

#[tokio::test]
async fn extractor_failures_skip_the_handler() {
    let seen = Seen::default();
    let (server, _app) = start(&seen);
    let client = server.connect("/orders").unwrap();

    client.emit("lookup", vec![json!(42)]).unwrap();
    settle().await;
    assert!(client.try_take("found").is_none());
    assert_eq!(
        *seen.lock(),
        vec![(
            "resolution",
            "failed to resolve parameter 0 of Orders::lookup: not found: order id".to_string()
        )]
    );

    client.emit("lookup", vec![json!("A-1")]).unwrap();
    assert_eq!(recv(&client, "found").await, vec![json!("A-1")]);
}

#[tokio::test]
async fn empty_results_can_suppress_the_success_event() {
    let seen = Seen::default();
    let (server, _app) = start(&seen);
    let client = server.connect("/orders").unwrap();

    client.emit("maybe", vec![]).unwrap();
    client.emit("maybe", vec![json!(false)]).unwrap();
    assert_eq!(recv(&client, "maybe_result").await, vec![json!(false)]);
    settle().await;
    assert!(client.try_take("maybe_result").is_none());
    assert!(seen.lock().is_empty());
}

struct Fragile {
    log: Log,
}

#[tokio::test]
async fn connect_phase_panics_do_not_stall_the_connection() {
    let log = Log::new();
    let seen = Seen::default();
    let errors = seen.clone();
    let factory_log = log.clone();
    let server = server();
    let app = SocketControllers::builder()
        .transport(server.clone())
        .error_handler(move |error, _| errors.lock().push((stage(error), error.to_string())))
        .controller_descriptor(
            Controller::with_factory("/fragile", move || Fragile {
                log: factory_log.clone(),
            })
            .action(
                Action::on_connect("greet")
                    .param(Param::custom(|inv| Ok(inv.args()[0].clone())))
                    .handle_sync(|this: Arc<Fragile>, _| {
                        this.log.push("greet");
                        Ok(Value::Null)
                    }),
            )
            .action(Action::on_message("ping", "ping").handle_sync(|this: Arc<Fragile>, _| {
                this.log.push("ping");
                Ok(Value::Null)
            }))
            .action(Action::on_disconnect("bye").handle_sync(|this: Arc<Fragile>, _| {
                this.log.push("bye");
                Ok(Value::Null)
            })),
        )
        .start()
        .unwrap();

    let client = server.connect("/fragile").unwrap();
    client.emit("ping", vec![]).unwrap();
    client.disconnect();

    assert_eq!(log.wait_len(2).await, vec!["ping", "bye"]);
    settle().await;
    assert_eq!(app.connection_count(), 0);
    assert_eq!(seen.lock().len(), 1);
    assert_eq!(seen.lock()[0].0, "panicked");
}

#[tokio::test]
async fn middleware_panics_are_reported() {
    let seen = Seen::default();
    let errors = seen.clone();
    let server = server();
    let _app = SocketControllers::builder()
        .transport(server.clone())
        .middleware(socket_controllers::middleware::before("fussy", |inv| {
            if inv.event() == "place" && inv.args().is_empty() {
                panic!("no arguments");
            }
            Ok(socket_controllers::Flow::Continue)
        }))
        .error_handler(move |error, _| errors.lock().push((stage(error), error.to_string())))
        .controller_descriptor(orders())
        .start()
        .unwrap();

    let client = server.connect("/orders").unwrap();
    client.emit("place", vec![]).unwrap();
    assert_eq!(
        recv(&client, "place_failed").await,
        vec![json!({ "message": "handler Orders::place panicked: no arguments" })]
    );
    client.emit("place", vec![json!(2)]).unwrap();
    assert_eq!(recv(&client, "placed").await, vec![json!({ "qty": 2 })]);
    assert_eq!(seen.lock()[0].0, "panicked");
}

#[derive(Default)]
struct ById;

#[derive(Default)]
struct ByRoomId;

#[tokio::test]
async fn renamed_parameters_cannot_share_an_event() {
    let server = server();
    let err = SocketControllers::builder()
        .transport(server.clone())
        .controller_descriptor(
            Controller::<ById>::new("/rooms/:id")
                .action(Action::on_message("join", "join").handle_sync(|_, _| Ok(Value::Null))),
        )
        .controller_descriptor(
            Controller::<ByRoomId>::new("/rooms/:roomId")
                .action(Action::on_message("join", "join").handle_sync(|_, _| Ok(Value::Null))),
        )
        .start()
        .unwrap_err();

    assert!(matches!(
        err,
        ConfigError::DuplicateEvent { ref event, ref first, ref second, .. }
            if event == "join" && first == "ById::join" && second == "ByRoomId::join"
    ));
    assert_eq!(server.listener_count(), 0);
}
