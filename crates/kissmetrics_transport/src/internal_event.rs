use std::time::Duration;

use metrics::{counter, histogram};

/// An observable occurrence inside the transport or a client built on it.
///
/// Emitting records the matching metrics and writes a log line at the level the
/// event warrants.
pub trait InternalEvent: Sized {
    fn emit(self);
}

/// A request reached the server and got a response back.
#[derive(Clone, Copy, Debug)]
pub struct HttpRequestCompleted {
    pub status: u16,
    pub elapsed: Duration,
}

impl InternalEvent for HttpRequestCompleted {
    fn emit(self) {
        counter!("kissmetrics_requests_total", "status" => self.status.to_string()).increment(1);
        histogram!("kissmetrics_request_duration_seconds").record(self.elapsed);
        trace!(
            target: "kissmetrics_transport::stats",
            status = self.status,
            elapsed_ms = self.elapsed.as_millis(),
            "Request completed"
        );
    }
}

/// A request failed before a success response could be returned.
#[derive(Clone, Copy, Debug)]
pub struct HttpRequestFailed {
    pub kind: &'static str,
    pub elapsed: Duration,
}

impl InternalEvent for HttpRequestFailed {
    fn emit(self) {
        counter!("kissmetrics_request_errors_total", "kind" => self.kind).increment(1);
        histogram!("kissmetrics_request_duration_seconds").record(self.elapsed);
        debug!(
            target: "kissmetrics_transport::stats",
            kind = self.kind,
            elapsed_ms = self.elapsed.as_millis(),
            "Request failed"
        );
    }
}
