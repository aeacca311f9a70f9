//! Controllers supplied by a container, with per-connection scoping.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use socket_controllers::{
    Action, ConfigError, ConnectionContext, Container, ContainerError, Controller, Instance,
    Scope, SimpleContainer, SocketControllers, TypeKey,
};

use crate::support::{recv, server};

/// A controller with per-connection state; only a container can build it.
struct Counter {
    hits: AtomicUsize,
    label: String,
}

impl Counter {
    fn new(label: &str) -> Self {
        Self {
            hits: AtomicUsize::new(0),
            label: label.to_string(),
        }
    }
}

fn counter() -> Controller<Counter> {
    Controller::<Counter>::injected("/count").action(
        Action::on_message("hit", "hit")
            .emit_on_success("hits")
            .handle_sync(|this: Arc<Counter>, _| {
                let hits = this.hits.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(json!({ "label": this.label, "hits": hits }))
            }),
    )
}

/// Counts how often the dispatcher asks for an instance.
#[derive(Default)]
struct Counting {
    inner: SimpleContainer,
    gets: AtomicUsize,
}

impl Container for Counting {
    fn get(&self, key: &TypeKey, scope: &ConnectionContext) -> Result<Instance, ContainerError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key, scope)
    }

    fn reset(&self) {
        self.inner.reset();
    }
}

async fn hit(client: &socket_controllers::memory::MemoryClient) -> Value {
    client.emit("hit", vec![]).unwrap();
    recv(client, "hits").await.remove(0)
}

#[tokio::test]
async fn connection_scope_gives_each_client_its_own_instance() {
    let container = Arc::new(SimpleContainer::new());
    container.register(Scope::Connection, || Counter::new("scoped"));

    let server = server();
    let _app = SocketControllers::builder()
        .transport(server.clone())
        .container(container)
        .controller_descriptor(counter())
        .start()
        .unwrap();

    let alice = server.connect("/count").unwrap();
    let bob = server.connect("/count").unwrap();
    assert_eq!(hit(&alice).await["hits"], json!(1));
    assert_eq!(hit(&alice).await["hits"], json!(2));
    assert_eq!(hit(&bob).await["hits"], json!(1));

    alice.disconnect();
    let again = server.connect("/count").unwrap();
    assert_eq!(hit(&again).await["hits"], json!(1));
}

#[tokio::test]
async fn singleton_scope_is_shared_across_connections() {
    let container = Arc::new(SimpleContainer::new());
    container.insert(Arc::new(Counter::new("shared")));

    let server = server();
    let _app = SocketControllers::builder()
        .transport(server.clone())
        .container(container)
        .controller_descriptor(counter())
        .start()
        .unwrap();

    let alice = server.connect("/count").unwrap();
    let bob = server.connect("/count").unwrap();
    assert_eq!(
        hit(&alice).await,
        json!({ "label": "shared", "hits": 1 })
    );
    assert_eq!(hit(&bob).await, json!({ "label": "shared", "hits": 2 }));
}

#[tokio::test]
async fn instance_is_requested_once_per_delivery() {
    let container = Arc::new(Counting::default());
    container.inner.register(Scope::Transient, || Counter::new("fresh"));

    let server = server();
    let _app = SocketControllers::builder()
        .transport(server.clone())
        .container(container.clone())
        .controller_descriptor(counter())
        .start()
        .unwrap();

    let client = server.connect("/count").unwrap();
    for _ in 0..3 {
        assert_eq!(hit(&client).await["hits"], json!(1));
    }
    assert_eq!(container.gets.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn injected_controller_without_container_is_rejected() {
    let server = server();
    let err = SocketControllers::builder()
        .transport(server.clone())
        .controller_descriptor(counter())
        .start()
        .unwrap_err();
    assert!(matches!(err, ConfigError::MissingFactory { ref name } if name == "Counter"));
    assert_eq!(server.listener_count(), 0);
}
