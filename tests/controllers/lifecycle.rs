//! Connection lifecycle: connect before messages, disconnect after,
//! independent concurrent dispatch.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use socket_controllers::{Action, Controller, Param, SocketControllers};

use crate::support::{recv, server, settle, Log};

struct Tracked {
    log: Log,
}

struct Other {
    log: Log,
}

fn tracked(log: &Log) -> Controller<Tracked> {
    let log = log.clone();
    Controller::with_factory("/life", move || Tracked { log: log.clone() })
}

#[tokio::test]
async fn connect_actions_finish_before_any_message() {
    let log = Log::new();
    let server = server();
    let other_log = log.clone();
    let _app = SocketControllers::builder()
        .transport(server.clone())
        .controller_descriptor(
            tracked(&log)
                .action(Action::on_connect("first").handle(|this: Arc<Tracked>, _| async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    this.log.push("connect:first");
                    Ok(Value::Null)
                }))
                .action(Action::on_connect("second").handle_sync(|this: Arc<Tracked>, _| {
                    this.log.push("connect:second");
                    Ok(Value::Null)
                }))
                .action(
                    Action::on_message("ping", "ping")
                        .param(Param::message_body())
                        .handle_sync(|this: Arc<Tracked>, params| {
                            let n: i64 = params.body(0)?.unwrap_or_default();
                            this.log.push(format!("ping:{}", n));
                            Ok(Value::Null)
                        }),
                ),
        )
        .controller_descriptor(
            Controller::with_factory("/life", move || Other { log: other_log.clone() }).action(
                Action::on_connect("third").handle_sync(|this: Arc<Other>, _| {
                    this.log.push("connect:other");
                    Ok(Value::Null)
                }),
            ),
        )
        .start()
        .unwrap();

    let client = server.connect("/life").unwrap();
    client.emit("ping", vec![json!(1)]).unwrap();
    client.emit("ping", vec![json!(2)]).unwrap();

    assert_eq!(
        log.wait_len(5).await,
        vec!["connect:first", "connect:second", "connect:other", "ping:1", "ping:2"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn one_connection_dispatches_in_delivery_order() {
    let log = Log::new();
    let server = server();
    let _app = SocketControllers::builder()
        .transport(server.clone())
        .controller_descriptor(
            tracked(&log).action(
                Action::on_message("n", "n")
                    .param(Param::message_body())
                    .handle_sync(|this: Arc<Tracked>, params| {
                        let n: i64 = params.body(0)?.unwrap_or_default();
                        this.log.push(n.to_string());
                        Ok(Value::Null)
                    }),
            ),
        )
        .start()
        .unwrap();

    let client = server.connect("/life").unwrap();
    for n in 0..50 {
        client.emit("n", vec![json!(n)]).unwrap();
    }

    let expected: Vec<String> = (0..50).map(|n| n.to_string()).collect();
    assert_eq!(log.wait_len(50).await, expected);
}

#[tokio::test]
async fn connect_runs_once_per_connection() {
    let log = Log::new();
    let server = server();
    let _app = SocketControllers::builder()
        .transport(server.clone())
        .controller_descriptor(tracked(&log).action(
            Action::on_connect("hello").param(Param::socket_id()).handle_sync(|this: Arc<Tracked>, params| {
                this.log.push(params.socket_id(0)?.to_string());
                Ok(Value::Null)
            }),
        ))
        .start()
        .unwrap();

    let a = server.connect("/life").unwrap();
    let b = server.connect("/life").unwrap();
    let mut entries = log.wait_len(2).await;
    settle().await;
    assert_eq!(log.len(), 2);

    entries.sort();
    let mut expected = vec![a.id().to_string(), b.id().to_string()];
    expected.sort();
    assert_eq!(entries, expected);
}

#[tokio::test]
async fn socket_id_is_stable_and_distinct() {
    let server = server();
    let _app = SocketControllers::builder()
        .transport(server.clone())
        .controller_descriptor(tracked(&Log::new()).action(
            Action::on_message("whoami", "whoami")
                .param(Param::socket_id())
                .emit_on_success("you")
                .handle_sync(|_, params| Ok(json!(params.socket_id(0)?))),
        ))
        .start()
        .unwrap();

    let a = server.connect("/life").unwrap();
    let b = server.connect("/life").unwrap();
    for _ in 0..2 {
        a.emit("whoami", vec![]).unwrap();
        b.emit("whoami", vec![]).unwrap();
        assert_eq!(recv(&a, "you").await, vec![json!(a.id())]);
        assert_eq!(recv(&b, "you").await, vec![json!(b.id())]);
    }
    assert_ne!(a.id(), b.id());
}

#[tokio::test]
async fn disconnect_actions_run_and_release_the_connection() {
    let log = Log::new();
    let server = server();
    let app = SocketControllers::builder()
        .transport(server.clone())
        .controller_descriptor(
            tracked(&log)
                .action(Action::on_connect("hello").handle_sync(|this: Arc<Tracked>, _| {
                    this.log.push("connect");
                    Ok(Value::Null)
                }))
                .action(Action::on_disconnect("bye").handle_sync(|this: Arc<Tracked>, _| {
                    this.log.push("disconnect");
                    Ok(Value::Null)
                })),
        )
        .start()
        .unwrap();

    let client = server.connect("/life").unwrap();
    log.wait_len(1).await;
    assert_eq!(app.connection_count(), 1);

    client.disconnect();
    assert_eq!(log.wait_len(2).await, vec!["connect", "disconnect"]);
    settle().await;
    assert_eq!(app.connection_count(), 0);
}

#[tokio::test]
async fn slow_handlers_do_not_block_other_events() {
    let server = server();
    let _app = SocketControllers::builder()
        .transport(server.clone())
        .controller_descriptor(
            tracked(&Log::new())
                .action(
                    Action::on_message("slow", "slow")
                        .emit_on_success("done")
                        .handle(|_, _| async {
                            tokio::time::sleep(Duration::from_millis(200)).await;
                            Ok(json!("slow"))
                        }),
                )
                .action(
                    Action::on_message("fast", "fast")
                        .emit_on_success("done")
                        .handle_sync(|_, _| Ok(json!("fast"))),
                ),
        )
        .start()
        .unwrap();

    let client = server.connect("/life").unwrap();
    client.emit("slow", vec![]).unwrap();
    client.emit("fast", vec![]).unwrap();

    assert_eq!(recv(&client, "done").await, vec![json!("fast")]);
    assert_eq!(recv(&client, "done").await, vec![json!("slow")]);
}

#[tokio::test]
async fn any_message_sees_every_event() {
    let log = Log::new();
    let server = server();
    let _app = SocketControllers::builder()
        .transport(server.clone())
        .controller_descriptor(
            tracked(&log)
                .action(
                    Action::on_any_message("audit")
                        .param(Param::event_name())
                        .param(Param::message_body())
                        .handle_sync(|this: Arc<Tracked>, params| {
                            let event = params.value(0)?.cloned().unwrap_or_default();
                            let body = params.body_value(1)?.cloned().unwrap_or_default();
                            this.log.push(format!("{}={}", event.as_str().unwrap_or(""), body));
                            Ok(Value::Null)
                        }),
                )
                .action(Action::on_message("named", "named").handle_sync(|this: Arc<Tracked>, _| {
                    this.log.push("named");
                    Ok(Value::Null)
                })),
        )
        .start()
        .unwrap();

    let client = server.connect("/life").unwrap();
    client.emit("named", vec![json!(1)]).unwrap();
    client.emit("unrouted", vec![json!("x")]).unwrap();

    assert_eq!(
        log.wait_len(3).await,
        vec!["named", "named=1", "unrouted=\"x\""]
    );
}
