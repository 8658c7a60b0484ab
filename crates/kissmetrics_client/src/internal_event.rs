use kissmetrics_transport::internal_event::InternalEvent;
use metrics::counter;

/// A tracking call (record, set, alias or a custom resource) was handed to the transport.
#[derive(Clone, Copy, Debug)]
pub struct TrackingCallIssued {
    /// One of `e`, `s`, `a` or `custom`. Custom resources are folded together to keep
    /// label cardinality bounded.
    pub resource: &'static str,
}

impl InternalEvent for TrackingCallIssued {
    fn emit(self) {
        counter!("kissmetrics_tracking_calls_total", "resource" => self.resource).increment(1);
        trace!(
            target: "kissmetrics_client::stats",
            resource = self.resource,
            "Tracking call issued"
        );
    }
}
