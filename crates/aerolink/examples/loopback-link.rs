//! Two runtimes talking over an in-memory loopback pair.
//!
//! Run with: `cargo run --example loopback-link`

use std::sync::Arc;
use std::time::Duration;

use aerolink::dialect;
use aerolink::frame::{Identifier, MessageSetExt};
use aerolink::net::NetworkRuntime;
use aerolink::transport::LoopbackInterface;

fn main() {
    let set = Arc::new(dialect::standard().expect("dialect builds"));
    let (vehicle_side, ground_side) = LoopbackInterface::pair();

    // "Vehicle": streams a heartbeat.
    let vehicle = NetworkRuntime::with_identity(
        Identifier::new(1, 1),
        Arc::clone(&set),
        Arc::new(vehicle_side),
    );
    let mut heartbeat = set.create_by_name("HEARTBEAT").expect("known message");
    heartbeat.set("type", 2u8).expect("known field");
    vehicle.set_heartbeat(heartbeat);

    // "Ground station": waits for the link, then pings.
    let ground = NetworkRuntime::with_identity(
        Identifier::new(250, 1),
        Arc::clone(&set),
        Arc::new(ground_side),
    );

    let to_vehicle = ground
        .await_connection(Duration::from_secs(5))
        .expect("vehicle heartbeat within 5s");
    println!("link up with {}", to_vehicle.partner());

    let heartbeat = to_vehicle
        .receive_named("HEARTBEAT", Some(Duration::from_secs(5)))
        .expect("heartbeat within 5s");
    println!(
        "heartbeat from {}: type={}",
        heartbeat.header().sender(),
        heartbeat.get::<u8>("type").expect("known field"),
    );

    let mut ping = set.create_by_name("PING").expect("known message");
    ping.set("seq", 1u32).expect("known field");
    to_vehicle.send(&ping).expect("send succeeds");

    let to_ground = vehicle
        .await_connection(Duration::from_secs(5))
        .expect("ground traffic within 5s");
    let ping = to_ground
        .receive_named("PING", Some(Duration::from_secs(5)))
        .expect("ping within 5s");
    println!(
        "ping from {} seq={}",
        ping.header().sender(),
        ping.get::<u32>("seq").expect("known field"),
    );
}
