//! Namespace `/string`: single and indexed message bodies.

use serde_json::{json, Value};
use socket_controllers::{Action, Controller, ControllerDescriptor, Param};

#[derive(Default)]
pub struct MessageBodyController;

pub fn controller() -> ControllerDescriptor {
    Controller::<MessageBodyController>::new("/string")
        .action(
            Action::on_connect("connection")
                .param(Param::connected_socket())
                .handle(|_, params| async move {
                    let socket = params.socket(0)?;
                    let result = Value::String(socket.id().to_string());
                    socket.emit("connected", vec![result.clone()])?;
                    Ok(result)
                }),
        )
        .action(
            Action::on_message("test", "test")
                .param(Param::connected_socket())
                .param(Param::message_body())
                .handle(|_, params| async move {
                    let message: Option<String> = params.body(1)?;
                    params.socket(0)?.emit("return", vec![json!(message)])?;
                    Ok(Value::Null)
                }),
        )
        .action(
            Action::on_message("test2", "test2")
                .param(Param::connected_socket())
                .param(Param::message_body_at(1))
                .param(Param::message_body_at(0))
                .handle(|_, params| async move {
                    let result = json!({
                        "data1": params.body_value(1)?,
                        "data0": params.body_value(2)?,
                    });
                    params.socket(0)?.emit("return2", vec![result])?;
                    Ok(Value::Null)
                }),
        )
        .build()
}
