//! Namespace patterns: captured path values, handshake query values, and
//! transport-level rejection of unmatched namespaces.

use serde_json::{json, Value};
use socket_controllers::{
    Action, Controller, Handshake, Param, SocketControllers, TransportError,
};

use crate::controllers::rooms;
use crate::support::{recv, server};

#[tokio::test]
async fn captures_reach_connect_and_message_handlers() {
    let server = server();
    let _app = SocketControllers::builder()
        .transport(server.clone())
        .controller_descriptor(rooms::controller())
        .start()
        .unwrap();

    let client = server
        .connect_with("/rooms/42", Handshake::new().with_query("user", "ada"))
        .unwrap();
    assert_eq!(
        recv(&client, "joined").await,
        vec![json!({ "roomId": "42" }), json!("42"), json!("ada")]
    );

    client.emit("say", vec![json!("hello")]).unwrap();
    assert_eq!(
        recv(&client, "said").await,
        vec![json!({ "room": "42", "text": "hello" })]
    );
}

#[tokio::test]
async fn each_connection_sees_its_own_captures() {
    let server = server();
    let _app = SocketControllers::builder()
        .transport(server.clone())
        .controller_descriptor(rooms::controller())
        .start()
        .unwrap();

    let a = server.connect("/rooms/a").unwrap();
    let b = server.connect("/rooms/b").unwrap();
    assert_eq!(
        recv(&a, "joined").await,
        vec![json!({ "roomId": "a" }), json!("a"), json!(null)]
    );
    assert_eq!(recv(&b, "joined").await[1], json!("b"));
}

#[tokio::test]
async fn unmatched_namespaces_never_reach_controllers() {
    let server = server();
    let _app = SocketControllers::builder()
        .transport(server.clone())
        .controller_descriptor(rooms::controller())
        .start()
        .unwrap();

    for namespace in ["/rooms", "/rooms/1/extra", "/lobby"] {
        assert!(matches!(
            server.connect(namespace),
            Err(TransportError::UnknownNamespace(_))
        ));
    }
}

#[derive(Default)]
struct Seats;

#[tokio::test]
async fn renamed_captures_keep_each_controllers_names() {
    let server = server();
    let _app = SocketControllers::builder()
        .transport(server.clone())
        .controller_descriptor(rooms::controller())
        .controller_descriptor(
            Controller::<Seats>::new("/rooms/:id").action(
                Action::on_message("seat", "seat")
                    .param(Param::namespace_params())
                    .param(Param::namespace_param("id"))
                    .param(Param::namespace_param("roomId"))
                    .emit_on_success("seated")
                    .handle_sync(|_, params| {
                        Ok(json!([
                            params.namespace_params(0)?.to_value(),
                            params.value(1)?.cloned().unwrap_or(Value::Null),
                            params.value(2)?.cloned().unwrap_or(Value::Null),
                        ]))
                    }),
            ),
        )
        .start()
        .unwrap();
    assert_eq!(server.listener_count(), 1);

    let client = server.connect("/rooms/7").unwrap();
    assert_eq!(recv(&client, "joined").await[1], json!("7"));

    client.emit("say", vec![json!("hi")]).unwrap();
    assert_eq!(
        recv(&client, "said").await,
        vec![json!({ "room": "7", "text": "hi" })]
    );
    client.emit("seat", vec![]).unwrap();
    assert_eq!(
        recv(&client, "seated").await,
        vec![json!([{ "id": "7" }, "7", null])]
    );
}
