//! Tracing setup and the call-logging observer.

use tonic::Status;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::rpc::{CallInfo, Payload, StreamRequestObserver, StreamResponseObserver, UnaryObserver};

/// Install the global subscriber. `RUST_LOG` wins over `level`.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("ms_project={level},tower_http=info").into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Logs every observed call with its request and response or error.
/// In verbose mode the request metadata is logged as well.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver {
    verbose: bool,
}

impl LoggingObserver {
    pub const NAME: &'static str = "logger";

    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn log_headers(&self, info: &CallInfo) {
        if self.verbose {
            tracing::info!(method = info.method, headers = ?info.headers, "Request headers");
        }
    }
}

impl UnaryObserver for LoggingObserver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn observe_unary(&self, info: &CallInfo, request: &dyn Payload, response: Result<&dyn Payload, &Status>) {
        self.log_headers(info);
        match response {
            Ok(response) => tracing::info!(
                method = info.method,
                transport = %info.transport,
                request = ?request,
                response = ?response,
                "Call completed"
            ),
            Err(status) => tracing::info!(
                method = info.method,
                transport = %info.transport,
                request = ?request,
                code = ?status.code(),
                detail = status.message(),
                "Call failed"
            ),
        }
    }
}

impl StreamRequestObserver for LoggingObserver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn observe_stream_request(&self, info: &CallInfo, request: Result<Option<&dyn Payload>, &Status>) {
        match request {
            Ok(Some(message)) => tracing::debug!(method = info.method, message = ?message, "Stream message received"),
            Ok(None) => tracing::debug!(method = info.method, "Client closed stream"),
            Err(status) => tracing::debug!(method = info.method, code = ?status.code(), "Stream receive failed"),
        }
    }
}

impl StreamResponseObserver for LoggingObserver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn observe_stream_response(&self, info: &CallInfo, response: &dyn Payload, error: Option<&Status>) {
        match error {
            None => tracing::debug!(method = info.method, message = ?response, "Stream message sent"),
            Some(status) => tracing::debug!(method = info.method, code = ?status.code(), "Stream send failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::proto::testing::{PingRequest, PingResponse};
    use crate::rpc::{CallContext, Transport};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn observe(observer: LoggingObserver, response: Result<&dyn Payload, &Status>) -> String {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .finish();

        let info = CallContext::unary("/testing.TestService/Ping", Transport::Rpc)
            .with_headers(vec![("user-agent".into(), "ms-cli".into())])
            .info;
        let request = PingRequest {
            value: "hello".into(),
            ..Default::default()
        };
        tracing::subscriber::with_default(subscriber, || {
            observer.observe_unary(&info, &request, response);
        });
        captured.text()
    }

    #[test]
    fn logs_request_and_response() {
        let response = PingResponse {
            value: "hello".into(),
            counter: 7,
        };
        let response: &dyn Payload = &response;
        let out = observe(LoggingObserver::new(false), Ok(response));
        assert!(out.contains("Call completed"));
        assert!(out.contains("value: \"hello\""));
        assert!(out.contains("counter: 7"));
        assert!(!out.contains("user-agent"));
    }

    #[test]
    fn logs_error_and_headers_when_verbose() {
        let status = Status::not_found("no such ping");
        let out = observe(LoggingObserver::new(true), Err(&status));
        assert!(out.contains("Call failed"));
        assert!(out.contains("no such ping"));
        assert!(out.contains("user-agent"));
    }
}
