use std::sync::Arc;

use anyhow::{Context, Result};
use json_swap_core::{Replacer, TokenPair};
use json_swap_http::{server, AppState, SwapConfig};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

// Re-export crates the benches and tests reach through this module
pub use json_swap_core;
pub use json_swap_http;
pub use serde_json;

pub fn dog_to_cat() -> Replacer {
    Replacer::new(TokenPair::new("dog", "cat").expect("static tokens are valid"))
}

/// A string of `words` words where every third one is the source token.
pub fn sentence(words: usize) -> String {
    (0..words)
        .map(|i| if i % 3 == 0 { "dog" } else { "hotdog" })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A flat object with `fields` string members, half of them exact matches.
pub fn wide_document(fields: usize) -> Value {
    let mut map = Map::with_capacity(fields);
    for i in 0..fields {
        let value = if i % 2 == 0 { "dog" } else { "a cat nap" };
        map.insert(format!("field_{i}"), json!(value));
    }
    Value::Object(map)
}

/// Alternating objects and arrays nested `depth` levels deep.
pub fn nested_document(depth: usize) -> Value {
    let mut value = json!("dog at the bottom");
    for level in 0..depth {
        value = if level % 2 == 0 {
            json!({ "level": level, "label": "dog", "child": value })
        } else {
            json!([level, "dog", value])
        };
    }
    value
}

/// A realistic mixed payload with dangerous keys sprinkled in.
pub fn mixed_document(records: usize) -> Value {
    let items: Vec<Value> = (0..records)
        .map(|i| {
            json!({
                "id": i,
                "owner": "dog",
                "description": sentence(12),
                "tags": ["dog", "Dog", "doghouse", "good dog!"],
                "active": i % 2 == 0,
                "__proto__": { "admin": true, "name": "dog" },
                "meta": { "score": (i as f64 * 0.5), "note": null }
            })
        })
        .collect();
    json!({ "records": items })
}

/// A running service bound to an ephemeral localhost port.
pub struct ServiceFixture {
    pub base_url: String,
    pub state: Arc<AppState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<()>>,
}

impl ServiceFixture {
    pub async fn start(config: SwapConfig) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind ephemeral port")?;
        let addr = listener.local_addr().context("listener has no local addr")?;
        let state = Arc::new(AppState::new(config)?);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(server::run(listener, Arc::clone(&state), async move {
            let _ = shutdown_rx.await;
        }));

        Ok(Self {
            base_url: format!("http://{addr}"),
            state,
            shutdown_tx: Some(shutdown_tx),
            handle,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Signals shutdown and waits for the server task to finish draining.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.handle.await.context("server task panicked")?
    }
}
