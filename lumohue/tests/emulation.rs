//! Tests d'intégration du protocole d'émulation complet
//!
//! Le pont est piloté à travers sa surface publique : les requêtes
//! passent par [`VirtualBridge::serve`] sur un canal en mémoire, comme
//! le ferait la tâche cliente du pool.

use lumohue::{BridgeBuilder, BridgeIdentity, VirtualBridge};
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use tokio::io::AsyncReadExt;

fn test_identity() -> BridgeIdentity {
    BridgeIdentity::from_parts(
        Ipv4Addr::new(192, 168, 1, 42),
        "B8:27:EB:12:34:56".to_string(),
    )
}

async fn enabled_bridge() -> VirtualBridge {
    let mut bridge = BridgeBuilder::new(0).identity(test_identity()).build();
    bridge.enable().await.expect("enable");
    bridge
}

/// Émet une requête brute et récupère la réponse complète
async fn exchange(bridge: &VirtualBridge, raw: &str) -> (bool, Vec<u8>) {
    let (mut server_end, mut client_end) = tokio::io::duplex(16 * 1024);

    let handled = bridge
        .serve(raw.as_bytes(), &mut server_end)
        .await
        .expect("serve");
    drop(server_end);

    let mut response = Vec::new();
    client_end.read_to_end(&mut response).await.expect("read");
    (handled, response)
}

/// Corps d'une réponse HTTP cadrée
fn body_of(response: &[u8]) -> String {
    let text = String::from_utf8_lossy(response);
    let (_, body) = text.split_once("\r\n\r\n").expect("framed response");
    body.to_string()
}

#[tokio::test]
async fn description_advertises_bridge_identity() {
    let bridge = enabled_bridge().await;
    let port = bridge.http_port();

    let (handled, response) = exchange(&bridge, "GET /description.xml HTTP/1.1\r\n\r\n").await;
    assert!(handled);

    let text = String::from_utf8_lossy(&response);
    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.contains("Content-Type: text/xml\r\n"));

    let body = body_of(&response);
    // IP et port répétés deux fois, convention UPnP
    assert_eq!(
        body.matches(&format!("192.168.1.42:{}", port)).count(),
        2
    );
    assert!(body.contains("<UDN>uuid:2f402f80-da50-11e1-9b23-b827eb123456</UDN>"));
}

#[tokio::test]
async fn list_all_devices_short_form() {
    let bridge = enabled_bridge().await;
    bridge.add_device("A");
    bridge.add_device("B");

    let (handled, response) = exchange(&bridge, "GET /api/x/lights HTTP/1.1\r\n\r\n").await;
    assert!(handled);

    assert_eq!(
        body_of(&response),
        "{\"1\":{\"name\":\"A\",\"uniqueid\":\"00:B8:27:EB:12:34:56:00:00\"},\
         \"2\":{\"name\":\"B\",\"uniqueid\":\"01:B8:27:EB:12:34:56:00:00\"}}"
    );
}

#[tokio::test]
async fn single_device_full_form_round_trip() {
    let bridge = enabled_bridge().await;
    let id = bridge.add_device("lampe");
    assert!(bridge.set_state_color(id, true, 254, 30000, 77));

    let (_, response) = exchange(&bridge, "GET /api/x/lights/1 HTTP/1.1\r\n\r\n").await;
    let json: serde_json::Value = serde_json::from_str(&body_of(&response)).unwrap();

    assert_eq!(json["name"], "lampe");
    assert_eq!(json["state"]["on"], true);
    assert_eq!(json["state"]["bri"], 254);
    assert_eq!(json["state"]["hue"], 30000);
    assert_eq!(json["state"]["sat"], 77);
    assert_eq!(json["state"]["colormode"], "hs");
}

#[tokio::test]
async fn out_of_range_device_yields_empty_object() {
    let bridge = enabled_bridge().await;
    bridge.add_device("A");
    bridge.add_device("B");

    let (handled, response) = exchange(&bridge, "GET /api/x/lights/99 HTTP/1.1\r\n\r\n").await;
    assert!(handled);
    assert_eq!(body_of(&response), "{}");
}

#[tokio::test]
async fn devicetype_handshake_returns_username() {
    let bridge = enabled_bridge().await;

    let (handled, response) = exchange(
        &bridge,
        "POST /api HTTP/1.1\r\n\r\n{\"devicetype\":\"test#probe\"}",
    )
    .await;
    assert!(handled);

    let body = body_of(&response);
    let expected = format!(
        "[{{\"success\":{{\"username\": \"{}\"}}}}]",
        test_identity().pseudo_username()
    );
    assert_eq!(body, expected);
}

#[tokio::test]
async fn control_acks_then_applies_and_notifies() {
    let bridge = enabled_bridge().await;
    bridge.add_device("lampe");

    let calls: Arc<Mutex<Vec<(usize, String, bool, u8)>>> = Arc::new(Mutex::new(Vec::new()));
    let seen = calls.clone();
    bridge.on_state(move |id, name, state, brightness| {
        seen.lock()
            .unwrap()
            .push((id, name.to_string(), state, brightness));
    });

    let (handled, response) = exchange(
        &bridge,
        "PUT /api/x/lights/1/state HTTP/1.1\r\n\r\n{\"on\":true,\"bri\":100}",
    )
    .await;
    assert!(handled);
    assert_eq!(
        body_of(&response),
        "[{\"success\":{\"/lights/1/state/\": true}}]"
    );

    // Le callback a vu l'enregistrement post-mutation
    assert_eq!(
        *calls.lock().unwrap(),
        vec![(0, "lampe".to_string(), true, 100)]
    );

    // Et la mutation est visible au prochain listing
    let (_, response) = exchange(&bridge, "GET /api/x/lights/1 HTTP/1.1\r\n\r\n").await;
    let json: serde_json::Value = serde_json::from_str(&body_of(&response)).unwrap();
    assert_eq!(json["state"]["on"], true);
    assert_eq!(json["state"]["bri"], 100);
}

#[tokio::test]
async fn callbacks_fire_in_fixed_order() {
    let bridge = enabled_bridge().await;
    bridge.add_device("lampe");

    let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    let o = order.clone();
    bridge.on_state(move |_, _, _, _| o.lock().unwrap().push("state"));
    let o = order.clone();
    bridge.on_state_color(move |_, _, _, _, _, _| o.lock().unwrap().push("color"));
    let o = order.clone();
    bridge.on_state_color_temp(move |_, _, _, _, _, _, ct| {
        o.lock().unwrap().push("ct");
        assert_eq!(ct, 366);
    });

    exchange(
        &bridge,
        "PUT /api/x/lights/1/state HTTP/1.1\r\n\r\n{\"ct\":366}",
    )
    .await;

    assert_eq!(*order.lock().unwrap(), vec!["state", "color", "ct"]);
}

#[tokio::test]
async fn unmatched_route_sends_nothing() {
    let bridge = enabled_bridge().await;

    let (handled, response) = exchange(&bridge, "GET /favicon.ico HTTP/1.1\r\n\r\n").await;
    assert!(!handled);
    assert!(response.is_empty());
}

#[tokio::test]
async fn disabled_bridge_declines_requests() {
    let bridge = enabled_bridge().await;
    bridge.add_device("lampe");
    bridge.disable();

    let (handled, response) = exchange(&bridge, "GET /api/x/lights HTTP/1.1\r\n\r\n").await;
    assert!(!handled);
    assert!(response.is_empty());
}

#[tokio::test]
async fn process_feeds_router_from_external_stack() {
    let bridge = enabled_bridge().await;
    bridge.add_device("lampe");

    let (mut server_end, mut client_end) = tokio::io::duplex(16 * 1024);
    let handled = bridge
        .process(true, "/api/x/lights", "", &mut server_end)
        .await
        .expect("process");
    drop(server_end);
    assert!(handled);

    let mut response = Vec::new();
    client_end.read_to_end(&mut response).await.unwrap();
    assert!(body_of(&response).starts_with("{\"1\":"));
}
