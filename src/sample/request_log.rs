use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::info;

use crate::error::{BoxError, DiResult};
use crate::provider::ScopedProxy;

static NEXT_LOG_ID: AtomicU64 = AtomicU64::new(1);

/// Request-scoped logger: one per request, tagged with a unique id.
#[derive(Debug, Default)]
pub struct RequestLog {
    state: Mutex<LogState>,
}

#[derive(Debug, Default)]
struct LogState {
    tag: Option<String>,
    request_url: Option<String>,
    lines: Vec<String>,
    closed: bool,
}

impl RequestLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_request_url(&self, url: impl Into<String>) {
        self.state.lock().request_url = Some(url.into());
    }

    pub fn log(&self, message: &str) {
        let mut state = self.state.lock();
        let line = format!(
            "[{}][{}] {}",
            state.tag.as_deref().unwrap_or("-"),
            state.request_url.as_deref().unwrap_or("-"),
            message
        );
        info!("{}", line);
        state.lines.push(line);
    }

    /// Unique tag assigned by the init hook.
    pub fn tag(&self) -> Option<String> {
        self.state.lock().tag.clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.state.lock().lines.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Init hook.
    pub fn init(&self) -> Result<(), BoxError> {
        let tag = format!("log-{}", NEXT_LOG_ID.fetch_add(1, Ordering::Relaxed));
        info!(tag = %tag, "request scope bean create");
        self.state.lock().tag = Some(tag);
        Ok(())
    }

    /// Destroy hook.
    pub fn close(&self) -> Result<(), BoxError> {
        let mut state = self.state.lock();
        info!(tag = state.tag.as_deref().unwrap_or("-"), "request scope bean close");
        state.closed = true;
        Ok(())
    }
}

/// Singleton service writing to the request log of whichever request calls it.
pub struct LogDemoService {
    log: ScopedProxy<RequestLog>,
}

impl LogDemoService {
    pub fn new(log: ScopedProxy<RequestLog>) -> Self {
        Self { log }
    }

    pub fn logic(&self, id: &str) -> DiResult<()> {
        self.log.call(|log| log.log(&format!("service id = {}", id)))
    }

    /// Handles one request: records the url then runs the service logic.
    pub fn handle(&self, request_url: &str, id: &str) -> DiResult<()> {
        self.log.call(|log| {
            log.set_request_url(request_url);
            log.log("controller test");
        })?;
        self.logic(id)
    }
}
