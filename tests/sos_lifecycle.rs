//! SOS lifecycle through the observer's control surface: idempotent
//! activate/clear, battery capture at activation time, and the hardware
//! side effects on the outbound queue.

use meshobserver::config::MeshConfig;
use meshobserver::observer::Observer;
use meshobserver::protocol::{HeartbeatPacket, SOS_OFF, SOS_ON};

fn observer() -> Observer {
    Observer::new(&MeshConfig::default())
}

#[test]
fn double_activation_keeps_one_record() {
    let observer = observer();
    observer.activate_sos("n5").unwrap();
    observer.activate_sos(" N5 ").unwrap();

    let status = observer.sos_status();
    assert_eq!(status.len(), 1);
    assert!(status.contains_key("N5"));
}

#[test]
fn clearing_an_inactive_node_succeeds() {
    let observer = observer();
    observer.clear_sos("NEVER_SEEN").unwrap();
    assert!(observer.sos_status().is_empty());
}

#[test]
fn activation_captures_last_known_battery() {
    let observer = observer();
    observer
        .submit_heartbeat(&HeartbeatPacket {
            node_id: "A1".to_string(),
            battery: 37,
            rssi: -80,
            sos: true,
            is_direct: false,
        })
        .unwrap();

    observer.activate_sos("a1").unwrap();
    assert_eq!(observer.sos_status()["A1"].battery, Some(37));

    // Unknown node: no battery to capture, activation still works.
    observer.activate_sos("GHOST").unwrap();
    assert_eq!(observer.sos_status()["GHOST"].battery, None);
}

#[test]
fn activate_and_clear_queue_their_control_tokens() {
    let observer = observer();
    observer.activate_sos("A1").unwrap();
    observer.clear_sos("A1").unwrap();

    assert_eq!(observer.poll_outbound_command().unwrap().payload, SOS_ON);
    assert_eq!(observer.poll_outbound_command().unwrap().payload, SOS_OFF);
    assert_eq!(observer.poll_outbound_command(), None);
    assert!(observer.sos_status().is_empty());
}
