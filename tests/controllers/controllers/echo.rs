//! Namespace `/echo`: replies through the acknowledgement callback.

use serde_json::{json, Value};
use socket_controllers::{Action, Controller, ControllerDescriptor, Param};

#[derive(Default)]
pub struct EchoController;

pub fn controller() -> ControllerDescriptor {
    Controller::<EchoController>::new("/echo")
        .action(
            Action::on_message("sum", "sum")
                .param(Param::message_body())
                .param(Param::message_body())
                .param(Param::ack())
                .handle(|_, params| async move {
                    let a: i64 = params.body(0)?.unwrap_or(0);
                    let b: i64 = params.body(1)?.unwrap_or(0);
                    params.ack(2)?.send(vec![json!(a + b)]);
                    Ok(Value::Null)
                }),
        )
        .action(
            Action::on_message("silent", "silent")
                .param(Param::ack())
                .handle_sync(|_, _| Ok(json!("returned, not acked"))),
        )
        .action(
            Action::on_message("try_ack", "try_ack")
                .param(Param::connected_socket())
                .param(Param::ack())
                .handle(|_, params| async move {
                    let sent = params.ack(1)?.send(vec![json!("late")]);
                    params.socket(0)?.emit("ack_sent", vec![json!(sent)])?;
                    Ok(Value::Null)
                }),
        )
        .build()
}
