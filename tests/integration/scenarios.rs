use crate::*;

use tether_core::{describe_error_code, ActionError, RequestError, ServiceStatus};

const H: ServiceHandle = ServiceHandle(1);

/// disconnected → connecting → connected with a connect accepted up front.
#[tokio::test]
async fn connect_completes_at_connected() -> Result<()> {
    let h = Harness::start(&[(H, A2DP_SINK)]);

    let mut pending = h.client.submit_connect(H);
    h.backend.transition(H, ServiceStatus::Connecting);
    h.settle().await;
    assert_eq!(pending.try_outcome(), None, "resolved before connected");

    h.backend.transition(H, ServiceStatus::Connected);
    assert_eq!(pending.outcome().await, Ok(()));

    h.settle().await;
    assert_eq!(h.state_labels(A2DP_SINK), vec!["connecting", "connected"]);
    assert_eq!(h.backend.connect_calls(), 1);
    h.stop().await
}

/// A connect attempt that ends in a disconnection fails with the stored error.
#[tokio::test]
async fn failed_attempt_reports_stored_error() -> Result<()> {
    let h = Harness::start(&[(H, A2DP_SINK)]);

    let pending = h.client.submit_connect(H);
    h.backend.transition(H, ServiceStatus::Connecting);
    h.backend.update(H, |s| s.error_code = -111);
    h.backend.transition(H, ServiceStatus::Disconnected);

    assert_eq!(
        pending.outcome().await,
        Err(RequestError::Failed(describe_error_code(-111)))
    );
    h.settle().await;
    assert_eq!(h.state_labels(A2DP_SINK).last().map(String::as_str), Some("error"));
    h.stop().await
}

/// The subsystem clears the error and starts retrying before the bridge gets
/// to the failed attempt. The reply and the label still reflect the failure.
#[tokio::test]
async fn failure_survives_immediate_retry() -> Result<()> {
    let h = Harness::start(&[(H, A2DP_SINK)]);

    let pending = h.client.submit_connect(H);
    h.backend.transition(H, ServiceStatus::Connecting);
    h.backend.update(H, |s| s.error_code = -111);
    h.backend.transition(H, ServiceStatus::Disconnected);
    h.backend.update(H, |s| {
        s.error_code = 0;
        s.reconnecting = true;
    });

    assert_eq!(
        pending.outcome().await,
        Err(RequestError::Failed(describe_error_code(-111)))
    );
    h.settle().await;
    assert_eq!(h.state_labels(A2DP_SINK), vec!["connecting", "error"]);

    h.backend.transition(H, ServiceStatus::Connecting);
    h.settle().await;
    assert_eq!(
        h.state_labels(A2DP_SINK),
        vec!["connecting", "error", "reconnecting"]
    );
    h.stop().await
}

/// Second disconnect while the first is outstanding is refused on the spot.
#[tokio::test]
async fn duplicate_disconnect_is_refused() -> Result<()> {
    let h = Harness::start(&[(H, A2DP_SINK)]);
    h.backend.transition(H, ServiceStatus::Connected);

    let mut first = h.client.submit_disconnect(H);
    let second = h.client.submit_disconnect(H);
    assert_eq!(second.outcome().await, Err(RequestError::AlreadyInProgress));
    assert_eq!(first.try_outcome(), None);
    assert_eq!(h.backend.disconnect_calls(), 1);

    h.backend.transition(H, ServiceStatus::Disconnecting);
    h.backend.transition(H, ServiceStatus::Disconnected);
    assert_eq!(first.outcome().await, Ok(()));

    h.settle().await;
    assert_eq!(
        h.state_labels(A2DP_SINK),
        vec!["connected", "disconnecting", "disconnected"]
    );
    h.stop().await
}

/// Same for connect, across a client clone.
#[tokio::test]
async fn duplicate_connect_is_refused() -> Result<()> {
    let h = Harness::start(&[(H, A2DP_SINK)]);
    let other = h.client.clone();

    let mut first = h.client.submit_connect(H);
    assert_eq!(other.connect(H).await, Err(RequestError::AlreadyInProgress));
    assert_eq!(first.try_outcome(), None);

    h.backend.transition(H, ServiceStatus::Connected);
    assert_eq!(first.outcome().await, Ok(()));

    // The slot is free again once the first request is answered.
    h.backend.transition(H, ServiceStatus::Disconnected);
    let again = h.client.submit_connect(H);
    h.backend.transition(H, ServiceStatus::Connected);
    assert_eq!(again.outcome().await, Ok(()));
    h.stop().await
}

/// The service vanishes while a connect is pending: no reply is ever sent.
#[tokio::test]
async fn unavailable_abandons_pending_connect() -> Result<()> {
    let h = Harness::start(&[(H, A2DP_SINK)]);

    let pending = h.client.submit_connect(H);
    h.backend.transition(H, ServiceStatus::Unavailable);
    assert_eq!(pending.outcome().await, Err(RequestError::Abandoned));

    h.backend.transition(H, ServiceStatus::Unavailable);
    h.settle().await;
    assert_eq!(h.unregistered(), vec![key_for(A2DP_SINK)]);
    assert!(h.state_labels(A2DP_SINK).is_empty());
    h.stop().await
}

/// Synchronous rejections answer immediately and change nothing.
#[tokio::test]
async fn synchronous_rejection_leaves_no_trace() -> Result<()> {
    let h = Harness::start(&[(H, A2DP_SINK)]);

    h.backend
        .update(H, |s| s.connect_result = Err(ActionError::NotSupported));
    assert_eq!(h.client.connect(H).await, Err(RequestError::NotAvailable));

    h.backend.update(H, |s| {
        s.connect_result = Err(ActionError::Failed("no route to host".into()))
    });
    assert_eq!(
        h.client.connect(H).await,
        Err(RequestError::Failed("no route to host".into()))
    );

    h.settle().await;
    assert!(h.state_labels(A2DP_SINK).is_empty());

    // Nothing was parked, so an accepted connect still goes through.
    h.backend.update(H, |s| s.connect_result = Ok(()));
    let pending = h.client.submit_connect(H);
    h.backend.transition(H, ServiceStatus::Connected);
    assert_eq!(pending.outcome().await, Ok(()));
    h.stop().await
}

/// A peer-initiated disconnect only produces notifications.
#[tokio::test]
async fn peer_disconnect_without_request() -> Result<()> {
    let h = Harness::start(&[(H, A2DP_SINK)]);
    h.backend.transition(H, ServiceStatus::Connected);
    h.backend.transition(H, ServiceStatus::Disconnected);
    h.backend.transition(H, ServiceStatus::Disconnected);
    h.settle().await;

    assert_eq!(h.state_labels(A2DP_SINK), vec!["connected", "disconnected"]);
    h.stop().await
}

/// Connect and disconnect outstanding together both settle on disconnected.
#[tokio::test]
async fn disconnect_during_connect_settles_both() -> Result<()> {
    let h = Harness::start(&[(H, A2DP_SINK)]);

    let connect = h.client.submit_connect(H);
    h.backend.transition(H, ServiceStatus::Connecting);
    let disconnect = h.client.submit_disconnect(H);
    h.backend.transition(H, ServiceStatus::Disconnected);

    assert_eq!(disconnect.outcome().await, Ok(()));
    assert!(matches!(
        connect.outcome().await,
        Err(RequestError::Failed(_))
    ));
    h.stop().await
}

/// Services that cannot be named are never exported.
#[tokio::test]
async fn undeliverable_service_is_dropped() -> Result<()> {
    let h = Harness::start(&[(H, A2DP_SINK)]);
    h.backend.update(H, |s| s.identity = None);

    h.backend.transition(H, ServiceStatus::Connected);
    assert_eq!(h.client.connect(H).await, Err(RequestError::UnknownService));
    h.settle().await;
    assert!(h.journal.entries().is_empty());
    h.stop().await
}
