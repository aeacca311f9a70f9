//! Acknowledgements: the handler's explicit use of the callback is the only
//! reply; return values are never sent back implicitly.

use serde_json::json;
use socket_controllers::SocketControllers;

use crate::controllers::echo;
use crate::support::{recv, server, TIMEOUT};

fn start(server: &std::sync::Arc<socket_controllers::memory::MemoryServer>) -> SocketControllers {
    SocketControllers::builder()
        .transport(server.clone())
        .controller_descriptor(echo::controller())
        .start()
        .unwrap()
}

#[tokio::test]
async fn handler_replies_through_ack() {
    let server = server();
    let _app = start(&server);
    let client = server.connect("/echo").unwrap();

    let reply = client
        .emit_with_ack("sum", vec![json!(2), json!(40)])
        .unwrap();
    let reply = tokio::time::timeout(TIMEOUT, reply).await.unwrap().unwrap();
    assert_eq!(reply, vec![json!(42)]);
}

#[tokio::test]
async fn return_value_is_not_an_implicit_reply() {
    let server = server();
    let _app = start(&server);
    let client = server.connect("/echo").unwrap();

    let reply = client.emit_with_ack("silent", vec![]).unwrap();
    let outcome = tokio::time::timeout(TIMEOUT, reply).await.unwrap();
    assert!(outcome.is_err(), "callback dropped without a reply");
}

#[tokio::test]
async fn ack_without_callback_is_a_noop() {
    let server = server();
    let _app = start(&server);
    let client = server.connect("/echo").unwrap();

    client.emit("try_ack", vec![]).unwrap();
    assert_eq!(recv(&client, "ack_sent").await, vec![json!(false)]);

    let reply = client.emit_with_ack("try_ack", vec![]).unwrap();
    assert_eq!(recv(&client, "ack_sent").await, vec![json!(true)]);
    let reply = tokio::time::timeout(TIMEOUT, reply).await.unwrap().unwrap();
    assert_eq!(reply, vec![json!("late")]);
}
