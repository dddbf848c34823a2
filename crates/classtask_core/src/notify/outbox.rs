//! Best-effort dispatch of queued notification requests.

use log::{info, warn};

use super::sink::{NotificationSink, SinkError};
use crate::model::notification::NotificationRequest;

/// Outcome of one dispatch run.
///
/// Callers read this for observability; nothing in the core branches on
/// it, because delivery failures must not change mutation results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

impl DeliveryReport {
    /// Total requests handed to the sink.
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed
    }

    /// Whether every request reached the sink.
    pub fn all_delivered(&self) -> bool {
        self.failed == 0
    }
}

/// Delivers every request, counting failures instead of returning them.
///
/// The signature has no error type on purpose: the mutation that queued
/// these requests has already committed, so the only correct reaction to
/// a sink failure is to log it and keep going.
pub fn dispatch<S: NotificationSink>(sink: &S, requests: &[NotificationRequest]) -> DeliveryReport {
    let mut report = DeliveryReport::default();

    for request in requests {
        match sink.deliver(request) {
            Ok(()) => report.delivered += 1,
            Err(err) => {
                report.failed += 1;
                log_failure(request, &err);
            }
        }
    }

    if !requests.is_empty() {
        info!(
            "event=notify_dispatch module=notify status=ok attempted={} delivered={} failed={}",
            report.attempted(),
            report.delivered,
            report.failed
        );
    }

    report
}

fn log_failure(request: &NotificationRequest, err: &SinkError) {
    warn!(
        "event=notify_deliver module=notify status=error kind={} recipient={} error={}",
        request.kind.as_str(),
        request.recipient,
        err
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::notification::NotificationKind;
    use crate::model::user::UserId;
    use std::cell::RefCell;
    use uuid::Uuid;

    struct FlakySink {
        reject: UserId,
        delivered: RefCell<Vec<UserId>>,
    }

    impl NotificationSink for FlakySink {
        fn deliver(&self, request: &NotificationRequest) -> Result<(), SinkError> {
            if request.recipient == self.reject {
                return Err(SinkError::Unavailable("injected outage".to_string()));
            }
            self.delivered.borrow_mut().push(request.recipient);
            Ok(())
        }
    }

    fn ping(recipient: UserId) -> NotificationRequest {
        NotificationRequest::new("Ping", "hello", NotificationKind::MessageReceived, recipient)
    }

    #[test]
    fn empty_dispatch_reports_nothing() {
        let sink = FlakySink {
            reject: Uuid::new_v4(),
            delivered: RefCell::new(Vec::new()),
        };
        let report = dispatch(&sink, &[]);
        assert_eq!(report, DeliveryReport::default());
        assert!(report.all_delivered());
    }

    #[test]
    fn one_failure_does_not_stop_the_rest() {
        let unlucky = Uuid::new_v4();
        let sink = FlakySink {
            reject: unlucky,
            delivered: RefCell::new(Vec::new()),
        };

        let first = Uuid::new_v4();
        let last = Uuid::new_v4();
        let requests = vec![ping(first), ping(unlucky), ping(last)];

        let report = dispatch(&sink, &requests);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.attempted(), 3);
        assert!(!report.all_delivered());
        assert_eq!(*sink.delivered.borrow(), vec![first, last]);
    }
}
