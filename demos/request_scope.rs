//! Request scope demo: a singleton service writing to a per-request log
//! through a scoped proxy, with requests served on several threads.

use beanpod::sample::{register_app, LogDemoService, RequestLog, REQUEST_SCOPE};
use beanpod::{Container, DiResult};
use std::thread;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn serve(container: &Container, request_id: &str, url: &str) -> DiResult<Vec<String>> {
    container.begin_scope(REQUEST_SCOPE, request_id)?;
    let service = container.get_bean::<LogDemoService>()?;
    let result = service.handle(url, request_id).and_then(|_| {
        // Same instance the proxy forwarded to
        let log = container.get_bean::<RequestLog>()?;
        Ok(log.lines())
    });
    for error in container.end_scope(REQUEST_SCOPE, request_id)? {
        info!(error = %error, "request log failed to close");
    }
    result
}

fn main() -> DiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_thread_ids(true)
        .init();

    let container = Container::new();
    register_app(&container)?;
    container.seal()?;

    let handles: Vec<_> = (1..=3)
        .map(|n| {
            let container = container.clone();
            thread::spawn(move || {
                let request_id = format!("req-{}", n);
                let url = format!("http://localhost:8080/log-demo/{}", n);
                serve(&container, &request_id, &url)
            })
        })
        .collect();

    for handle in handles {
        match handle.join() {
            Ok(Ok(lines)) => lines.iter().for_each(|line| println!("{}", line)),
            Ok(Err(e)) => println!("request failed: {}", e),
            Err(_) => println!("worker panicked"),
        }
    }

    // Outside a request the service has nowhere to log
    let service = container.get_bean::<LogDemoService>()?;
    if let Err(e) = service.logic("no-request") {
        println!("without a request: {}", e);
    }

    container.shutdown();
    Ok(())
}
