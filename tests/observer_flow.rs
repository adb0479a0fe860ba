//! End-to-end observer flow: a direct heartbeat surfaces the gateway and an
//! online node, SOS activation reaches the SOS panel, and the outbox yields
//! the broadcast command exactly once.

use meshobserver::config::MeshConfig;
use meshobserver::observer::nodes::NodeStatus;
use meshobserver::observer::{Observer, GATEWAY_PLACEHOLDER};
use meshobserver::protocol::{HeartbeatPacket, BROADCAST, SOS_ON};

fn observer() -> Observer {
    Observer::new(&MeshConfig::default())
}

fn heartbeat(node_id: &str, is_direct: bool) -> HeartbeatPacket {
    HeartbeatPacket {
        node_id: node_id.to_string(),
        battery: 80,
        rssi: -60,
        sos: false,
        is_direct,
    }
}

#[test]
fn direct_heartbeat_sets_gateway_and_online_node() {
    let observer = observer();
    assert_eq!(observer.gateway_node(), None);

    observer.submit_heartbeat(&heartbeat("A1", true)).unwrap();

    assert_eq!(observer.gateway_node(), Some("A1".to_string()));
    let nodes = observer.nodes();
    let view = &nodes["A1"];
    assert_eq!(view.status, NodeStatus::Online);
    assert_eq!(view.record.battery, 80);
    assert!(!view.active_sos);
}

#[test]
fn sos_activation_reaches_panel_and_queues_one_broadcast() {
    let observer = observer();
    observer.submit_heartbeat(&heartbeat("A1", true)).unwrap();

    observer.activate_sos("A1").unwrap();

    assert!(observer.sos_status().contains_key("A1"));
    assert!(observer.nodes()["A1"].active_sos);

    let cmd = observer.poll_outbound_command().expect("one queued command");
    assert_eq!(cmd.to, BROADCAST);
    assert_eq!(cmd.payload, SOS_ON);
    assert_eq!(observer.poll_outbound_command(), None);
    assert_eq!(observer.poll_outbound_command(), None);
}

#[test]
fn summary_counts_follow_the_field() {
    let observer = observer();
    let summary = observer.summary();
    assert_eq!(
        (summary.nodes, summary.messages, summary.active_sos),
        (0, 0, 0)
    );

    observer.submit_heartbeat(&heartbeat("a1", false)).unwrap();
    observer.submit_heartbeat(&heartbeat("A1", false)).unwrap();
    observer.submit_heartbeat(&heartbeat("b2", false)).unwrap();
    observer.activate_sos("b2").unwrap();

    let summary = observer.summary();
    assert_eq!(summary.nodes, 2);
    assert_eq!(summary.active_sos, 1);
}

#[test]
fn gateway_placeholder_before_any_direct_heartbeat() {
    let observer = observer();
    observer.submit_heartbeat(&heartbeat("C3", false)).unwrap();
    assert_eq!(observer.gateway_node(), None);
    // The HTTP layer substitutes the placeholder for None.
    assert_eq!(GATEWAY_PLACEHOLDER, "WAITING");
}
