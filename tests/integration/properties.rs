use crate::*;

use serde_json::json;
use tether_core::{AttributeValue, ServiceStatus};

const H: ServiceHandle = ServiceHandle(7);

#[tokio::test]
async fn properties_follow_the_subsystem() -> Result<()> {
    let h = Harness::start(&[(H, HFP_AG)]);
    assert_eq!(
        h.client.properties(H).await,
        Err(PropertyError::UnknownService),
        "not exported before the first event"
    );

    h.backend.transition(H, ServiceStatus::Connected);
    let props = serde_json::to_value(h.client.properties(H).await?)?;
    assert_eq!(
        props,
        json!({
            "State": "connected",
            "RemoteUUID": HFP_AG,
            "AutoConnect": false,
            "Blocked": false,
        })
    );

    h.backend.update(H, |s| {
        let id = s.identity.as_mut().unwrap();
        id.local_uuid = Some("0000111e-0000-1000-8000-00805f9b34fb".into());
        id.version = Some(0x0107);
        s.reconnecting = true;
        s.status = ServiceStatus::Connecting;
    });
    let props = h.client.properties(H).await?;
    assert_eq!(props.state.as_str(), "reconnecting");
    assert_eq!(props.version, Some(0x0107));
    assert!(props.local_uuid.is_some());
    h.stop().await
}

#[tokio::test]
async fn zero_version_is_hidden() -> Result<()> {
    let h = Harness::start(&[(H, HFP_AG)]);
    h.backend.update(H, |s| s.identity.as_mut().unwrap().version = Some(0));
    h.backend.transition(H, ServiceStatus::Disconnected);

    assert_eq!(
        h.client.get_property(H, "Version").await,
        Err(PropertyError::UnknownProperty)
    );
    assert_eq!(
        h.client.get_property(H, "State").await,
        Ok(AttributeValue::Str("disconnected".into()))
    );
    h.stop().await
}

#[tokio::test]
async fn policy_writes_are_delegated() -> Result<()> {
    let h = Harness::start(&[(H, HFP_AG)]);
    h.backend.transition(H, ServiceStatus::Disconnected);

    h.client.set_property(H, "AutoConnect", json!(true)).await?;
    h.client.set_property(H, "Blocked", json!(true)).await?;
    assert!(h.backend.snapshot(H).auto_connect);
    assert!(h.backend.snapshot(H).blocked);
    assert_eq!(
        h.client.get_property(H, "Blocked").await,
        Ok(AttributeValue::Bool(true))
    );
    h.stop().await
}

#[tokio::test]
async fn bad_writes_are_rejected_at_the_boundary() -> Result<()> {
    let h = Harness::start(&[(H, HFP_AG)]);
    h.backend.transition(H, ServiceStatus::Disconnected);

    assert_eq!(
        h.client.set_property(H, "Blocked", json!("true")).await,
        Err(PropertyError::InvalidArguments)
    );
    assert_eq!(
        h.client.set_property(H, "RemoteUUID", json!("x")).await,
        Err(PropertyError::ReadOnly)
    );
    assert_eq!(
        h.client.set_property(H, "Trusted", json!(true)).await,
        Err(PropertyError::UnknownProperty)
    );
    assert!(!h.backend.snapshot(H).blocked);
    h.stop().await
}
