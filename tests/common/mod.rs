//! Shared utilities for integration testing.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use factrice::config::ServiceConfig;
use factrice::dispatch::{DispatchLog, DispatchRecord, Dispatcher};
use factrice::http::HttpServer;
use factrice::lifecycle::{build_dispatcher_with, Shutdown};
use factrice::mail::{MailEnvelope, MailTransport, TransportError};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::Notify;

/// Transport that keeps every envelope instead of sending it.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<MailEnvelope>>,
    fail: AtomicBool,
    hold: Option<SendHold>,
}

/// Pauses each send until released.
pub struct SendHold {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl RecordingTransport {
    /// A transport whose sends signal `entered` and then wait for `release`.
    #[allow(dead_code)]
    pub fn holding(hold: SendHold) -> Self {
        Self {
            hold: Some(hold),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<MailEnvelope> {
        self.sent.lock().unwrap().clone()
    }

    /// Make every following send fail with a connection error.
    #[allow(dead_code)]
    pub fn fail_sends(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, envelope: &MailEnvelope) -> Result<(), TransportError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransportError::Connection("connection refused".into()));
        }
        if let Some(hold) = &self.hold {
            hold.entered.notify_one();
            hold.release.notified().await;
        }
        self.sent.lock().unwrap().push(envelope.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Dispatch log keeping every record in memory.
#[derive(Default)]
pub struct RecordingLog {
    records: Mutex<Vec<DispatchRecord>>,
}

impl RecordingLog {
    #[allow(dead_code)]
    pub fn records(&self) -> Vec<DispatchRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl DispatchLog for RecordingLog {
    fn record(&self, record: &DispatchRecord) {
        self.records.lock().unwrap().push(record.clone());
    }
}

pub fn write_route(root: &Path, name: &str, template: &str, bindings: &str) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("template.html"), template).unwrap();
    fs::write(dir.join("bindings.toml"), bindings).unwrap();
}

/// Template directory holding the `welcome` route.
pub fn welcome_templates() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_route(
        dir.path(),
        "welcome",
        "<html><body><p data-bind=\"name\"></p><a data-bind=\"link\">here</a></body></html>",
        "[[bindings]]\nmarker = \"name\"\nattribute = \"text\"\n\n\
         [[bindings]]\nmarker = \"link\"\nattribute = \"href\"\n",
    );
    dir
}

pub fn test_config(templates: &TempDir) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.server.bind_address = "127.0.0.1:0".into();
    config.templates.directory = templates.path().to_string_lossy().into_owned();
    config.mail.default_from = Some("noreply@example.com".into());
    config
}

/// Start the service on an ephemeral port.
#[allow(dead_code)]
pub async fn start_service(
    config: &ServiceConfig,
    transport: Arc<RecordingTransport>,
) -> (SocketAddr, Shutdown) {
    let dispatcher = build_dispatcher_with(config, transport).unwrap();
    serve(config, dispatcher).await
}

/// Start the service with its dispatch records going to `log`.
#[allow(dead_code)]
pub async fn start_service_with_log(
    config: &ServiceConfig,
    transport: Arc<RecordingTransport>,
    log: Arc<RecordingLog>,
) -> (SocketAddr, Shutdown) {
    let dispatcher = build_dispatcher_with(config, transport).unwrap().with_log(log);
    serve(config, dispatcher).await
}

async fn serve(config: &ServiceConfig, dispatcher: Dispatcher) -> (SocketAddr, Shutdown) {
    let dispatcher = Arc::new(dispatcher);
    let listener = TcpListener::bind(&config.server.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let server = HttpServer::new(&config.server, dispatcher);
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    (addr, shutdown)
}
