//! Walkthrough of a hosted room over the in-memory loopback relay.
//!
//! A host opens a room, two clients join with its code, payloads flow in
//! both directions, one client gets kicked and the host shuts down.
//!
//! Run with:
//! - cargo run -p relaygate --example room_demo

use relaygate::{
    Connection, ConnectionId, DisconnectCause, DisconnectReason, EngineSink, LoopbackBackend,
    LoopbackHub, RelayConfig, RelayTransport, RunMode,
};

/// Engine sink that prints every notification with a side label.
struct PrintEngine {
    label: &'static str,
}

impl EngineSink for PrintEngine {
    fn on_connected(&mut self, id: ConnectionId, connection: &Connection) {
        println!(
            "[{}] connection {} up: participant {:?} at {} (mtu {})",
            self.label,
            id,
            connection.participant(),
            connection.endpoint(),
            connection.mtu()
        );
    }

    fn on_disconnected(&mut self, id: ConnectionId, reason: DisconnectReason) {
        println!("[{}] connection {} down: {:?}", self.label, id, reason);
    }

    fn on_receive(&mut self, id: ConnectionId, payload: &[u8]) {
        println!(
            "[{}] received on {}: \"{}\"",
            self.label,
            id,
            String::from_utf8_lossy(payload)
        );
    }

    fn on_room_code_available(&mut self) {
        println!("[{}] room entered", self.label);
    }

    fn on_connect_failed(&mut self) {
        println!("[{}] join code rejected", self.label);
    }

    fn on_relay_disconnected(&mut self, cause: DisconnectCause) {
        println!("[{}] relay link gone: {:?}", self.label, cause);
    }
}

fn tick(transport: &mut RelayTransport<LoopbackBackend>, engine: &mut PrintEngine) {
    // Room operations settle across consecutive polls, so run a few.
    for _ in 0..3 {
        transport.poll_events(engine);
    }
}

fn bound_connections(
    transport: &RelayTransport<LoopbackBackend>,
    capacity: usize,
) -> Vec<ConnectionId> {
    (0..capacity)
        .map(ConnectionId)
        .filter(|id| transport.connection(*id).is_some())
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let hub = LoopbackHub::new();
    let config = RelayConfig {
        app_id: "room-demo".to_string(),
        max_participants: 4,
        ..RelayConfig::default()
    };

    // The host opens a room and reads its join code.
    let mut host = RelayTransport::new(hub.backend(), config.clone());
    let mut host_engine = PrintEngine { label: "host" };
    host.run(RunMode::Host, 0)?;
    tick(&mut host, &mut host_engine);
    let code = host.try_room_code().expect("room should be up").to_string();
    println!("[host] join code: {}", code);

    // Two clients join with the code instead of an address.
    let mut alice = RelayTransport::new(hub.backend(), config.clone());
    let mut alice_engine = PrintEngine { label: "alice" };
    alice.run(RunMode::Client, 0)?;
    alice.connect(&code, 0, &[])?;
    tick(&mut alice, &mut alice_engine);
    tick(&mut host, &mut host_engine);

    let mut bob = RelayTransport::new(hub.backend(), config.clone());
    let mut bob_engine = PrintEngine { label: "bob" };
    bob.run(RunMode::Client, 0)?;
    bob.connect(&code, 0, &[])?;
    tick(&mut bob, &mut bob_engine);
    tick(&mut host, &mut host_engine);

    // Clients talk to the host through their single connection; the host
    // answers on every slot it has bound.
    for id in bound_connections(&alice, config.max_participants) {
        alice.send(id, b"hello from alice")?;
    }
    for id in bound_connections(&bob, config.max_participants) {
        bob.send(id, b"hello from bob")?;
    }
    tick(&mut host, &mut host_engine);

    for id in bound_connections(&host, config.max_participants) {
        host.send(id, b"welcome to the room")?;
    }
    tick(&mut alice, &mut alice_engine);
    tick(&mut bob, &mut bob_engine);

    // The host kicks bob's connection; bob loses the room, alice stays.
    let host_connections = bound_connections(&host, config.max_participants);
    if let Some(&bob_connection) = host_connections.last() {
        println!("[host] kicking connection {}", bob_connection);
        host.disconnect(bob_connection);
    }
    tick(&mut bob, &mut bob_engine);
    tick(&mut host, &mut host_engine);

    // Shutting the host down sweeps what is left.
    println!("[host] shutting down");
    host.shutdown();
    tick(&mut host, &mut host_engine);
    tick(&mut alice, &mut alice_engine);

    println!("done");
    Ok(())
}
