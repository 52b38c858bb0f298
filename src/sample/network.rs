use parking_lot::Mutex;
use tracing::debug;

use crate::error::BoxError;

/// Fake network client exercising init and destroy hooks.
#[derive(Debug)]
pub struct NetworkClient {
    url: String,
    events: Mutex<Vec<String>>,
}

impl NetworkClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn connect(&self) {
        self.record(format!("connect: {}", self.url));
    }

    pub fn call(&self, message: &str) {
        self.record(format!("call: {} message = {}", self.url, message));
    }

    pub fn disconnect(&self) {
        self.record(format!("close: {}", self.url));
    }

    /// Everything that happened to this client, oldest first.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    /// Init hook: connect and send a greeting.
    pub fn init(&self) -> Result<(), BoxError> {
        if self.url.is_empty() {
            return Err("url is not set".into());
        }
        self.connect();
        self.call("initial connection message");
        Ok(())
    }

    /// Destroy hook.
    pub fn close(&self) -> Result<(), BoxError> {
        self.disconnect();
        Ok(())
    }

    fn record(&self, event: String) {
        debug!(client = %self.url, "{}", event);
        self.events.lock().push(event);
    }
}
