//! The `/string` scenario: connect result, a single body, and indexed bodies.

use serde_json::json;
use socket_controllers::SocketControllers;

use crate::controllers::message_body;
use crate::support::{recv, server};

#[tokio::test]
async fn message_body_scenario() {
    let server = server();
    let app = SocketControllers::builder()
        .transport(server.clone())
        .controller_descriptor(message_body::controller())
        .start()
        .unwrap();

    let client = server.connect("/string").unwrap();
    assert_eq!(recv(&client, "connected").await, vec![json!(client.id())]);

    client.emit("test", vec![json!("test data")]).unwrap();
    assert_eq!(recv(&client, "return").await, vec![json!("test data")]);

    client
        .emit(
            "test2",
            vec![json!("test data 0"), json!("test data 1"), json!("test data 2")],
        )
        .unwrap();
    assert_eq!(
        recv(&client, "return2").await,
        vec![json!({ "data1": "test data 1", "data0": "test data 0" })]
    );

    app.stop();
}

#[tokio::test]
async fn missing_arguments_resolve_to_null() {
    let server = server();
    let _app = SocketControllers::builder()
        .transport(server.clone())
        .controller_descriptor(message_body::controller())
        .start()
        .unwrap();

    let client = server.connect("/string").unwrap();
    recv(&client, "connected").await;

    client.emit("test", vec![]).unwrap();
    assert_eq!(recv(&client, "return").await, vec![json!(null)]);

    client.emit("test2", vec![json!("only")]).unwrap();
    assert_eq!(
        recv(&client, "return2").await,
        vec![json!({ "data1": null, "data0": "only" })]
    );
}
