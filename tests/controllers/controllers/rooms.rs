//! Namespace `/rooms/:roomId`: values captured from the namespace path.

use serde_json::{json, Value};
use socket_controllers::{Action, Controller, ControllerDescriptor, Param};

#[derive(Default)]
pub struct RoomsController;

pub fn controller() -> ControllerDescriptor {
    Controller::<RoomsController>::new("/rooms/:roomId")
        .action(
            Action::on_connect("joined")
                .param(Param::connected_socket())
                .param(Param::namespace_params())
                .param(Param::namespace_param("roomId"))
                .param(Param::query_param("user"))
                .handle(|_, params| async move {
                    let all = params.namespace_params(1)?.to_value();
                    let room = params.value(2)?.cloned().unwrap_or(Value::Null);
                    let user = params.value(3)?.cloned().unwrap_or(Value::Null);
                    params.socket(0)?.emit("joined", vec![all, room, user])?;
                    Ok(Value::Null)
                }),
        )
        .action(
            Action::on_message("say", "say")
                .param(Param::namespace_param("roomId"))
                .param(Param::message_body())
                .emit_on_success("said")
                .handle_sync(|_, params| {
                    Ok(json!({
                        "room": params.value(0)?,
                        "text": params.body_value(1)?,
                    }))
                }),
        )
        .build()
}
