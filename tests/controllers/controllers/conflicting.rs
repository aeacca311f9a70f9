//! Namespace `/string` again, claiming an event `message_body` already handles.

use serde_json::Value;
use socket_controllers::{Action, Controller, ControllerDescriptor};

#[derive(Default)]
pub struct ConflictingController;

pub fn controller() -> ControllerDescriptor {
    Controller::<ConflictingController>::new("/string")
        .action(Action::on_message("shadow", "test").handle_sync(|_, _| Ok(Value::Null)))
        .build()
}
