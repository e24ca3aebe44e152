use std::collections::HashMap;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use serde_json::Value;

/// Canned upstream: JSONBin documents under `/jsonbin`, TMDB under `/tmdb`.
#[derive(Debug, Default, Clone)]
pub struct UpstreamStubConfig {
    routes: HashMap<String, (u16, Value)>,
}

#[allow(dead_code)]
impl UpstreamStubConfig {
    pub fn bin(mut self, document_id: &str, record: Value) -> Self {
        self.routes.insert(
            format!("/jsonbin/b/{document_id}/latest"),
            (200, serde_json::json!({ "record": record, "metadata": { "id": document_id } })),
        );
        self
    }

    pub fn tmdb(mut self, path: &str, body: Value) -> Self {
        self.routes.insert(format!("/tmdb{path}"), (200, body));
        self
    }

    pub fn tmdb_status(mut self, path: &str, status: u16) -> Self {
        self.routes.insert(
            format!("/tmdb{path}"),
            (status, serde_json::json!({ "status_message": "stub failure" })),
        );
        self
    }
}

pub struct UpstreamStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

#[allow(dead_code)]
impl UpstreamStub {
    pub fn spawn(config: UpstreamStubConfig) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start upstream stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let url = request.url().to_string();
                let path = url.split('?').next().unwrap_or(&url).to_owned();
                seen.lock().expect("lock request log").push(url.clone());

                let Some((status, body)) = config.routes.get(&path) else {
                    let _ = request.respond(
                        tiny_http::Response::from_string("not found").with_status_code(404),
                    );
                    continue;
                };

                let header =
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .expect("build header");
                let response = tiny_http::Response::from_string(body.to_string())
                    .with_status_code(*status)
                    .with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn jsonbin_url(&self) -> String {
        format!("{}/jsonbin", self.base_url)
    }

    pub fn tmdb_url(&self) -> String {
        format!("{}/tmdb", self.base_url)
    }

    /// Requests received so far whose path starts with `prefix`.
    pub fn hits(&self, prefix: &str) -> usize {
        self.requests
            .lock()
            .expect("lock request log")
            .iter()
            .filter(|url| url.starts_with(prefix))
            .count()
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("lock request log").clone()
    }
}

impl Drop for UpstreamStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
