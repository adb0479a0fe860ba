//! Rejection at the control-surface boundary: a bad submission fails with a
//! typed error and leaves every container untouched.

use chrono::Utc;
use meshobserver::config::MeshConfig;
use meshobserver::observer::{MessageSubmission, Observer, SubmitError};
use meshobserver::protocol::HeartbeatPacket;

fn observer() -> Observer {
    Observer::new(&MeshConfig::default())
}

fn assert_untouched(observer: &Observer) {
    let summary = observer.summary();
    assert_eq!(
        (summary.nodes, summary.messages, summary.active_sos),
        (0, 0, 0)
    );
    assert_eq!(observer.poll_outbound_command(), None);
}

#[test]
fn heartbeat_with_blank_node_id_is_rejected() {
    let observer = observer();
    let err = observer
        .submit_heartbeat(&HeartbeatPacket {
            node_id: "   ".to_string(),
            battery: 50,
            rssi: -60,
            sos: false,
            is_direct: false,
        })
        .unwrap_err();
    assert_eq!(err, SubmitError::EmptyNodeId);
    assert_untouched(&observer);
}

#[test]
fn heartbeat_with_impossible_battery_is_rejected() {
    let observer = observer();
    let err = observer
        .submit_heartbeat(&HeartbeatPacket {
            node_id: "A1".to_string(),
            battery: 101,
            rssi: -60,
            sos: false,
            is_direct: false,
        })
        .unwrap_err();
    assert_eq!(err, SubmitError::BatteryOutOfRange);
    assert_untouched(&observer);
}

#[test]
fn outbound_message_with_blank_destination_is_rejected() {
    let observer = observer();
    let err = observer
        .submit_outbound_message(&MessageSubmission {
            packet_id: "pkt-1".to_string(),
            from_node: "A1".to_string(),
            to: "  ".to_string(),
            payload: "hello".to_string(),
            rssi: 0,
            is_direct: false,
            timestamp: Utc::now(),
        })
        .unwrap_err();
    assert_eq!(err, SubmitError::EmptyDestination);
    assert_untouched(&observer);
}

#[test]
fn sos_toggle_with_blank_node_id_is_rejected() {
    let observer = observer();
    assert_eq!(
        observer.activate_sos("").unwrap_err(),
        SubmitError::EmptyNodeId
    );
    assert_eq!(
        observer.clear_sos(" ").unwrap_err(),
        SubmitError::EmptyNodeId
    );
    assert_untouched(&observer);
}
