//! Application de démonstration du pont émulé
//!
//! Monte un pont avec deux lampes virtuelles dont l'actionnement se
//! contente de tracer les changements d'état. Un assistant vocal du
//! réseau local peut découvrir le pont et piloter les lampes.

use lumohue::BridgeBuilder;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Période du tick de découverte : assez courte pour répondre aux
/// sondes avant le timeout des contrôleurs
const HANDLE_PERIOD: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ========== PHASE 1 : Construction du pont ==========

    let mut bridge = BridgeBuilder::new_configured()?.build();
    let identity = bridge.identity();
    info!("📡 Bridge identity: {} ({})", identity.ip, identity.mac);

    // Lampes de démonstration
    bridge.add_device("lampe salon");
    bridge.add_device("lampe cuisine");
    info!("✅ {} device(s) registered", bridge.device_count());

    // ========== PHASE 2 : Câblage de l'actionnement ==========

    // Ici on ne pilote aucun matériel : chaque forme de callback trace
    // ce qu'un vrai actionneur recevrait
    bridge.on_state(|id, name, state, brightness| {
        info!(
            "💡 #{} '{}' -> {} (bri {})",
            id,
            name,
            if state { "on" } else { "off" },
            brightness
        );
    });

    bridge.on_state_color_temp(|id, name, _state, _brightness, hue, sat, ct| {
        debug!("🎨 #{} '{}' hue={} sat={} ct={}", id, name, hue, sat, ct);
    });

    // ========== PHASE 3 : Service ==========

    bridge.enable().await?;
    info!(
        "✅ LumoBridge ready at http://{}:{}/description.xml",
        identity.ip,
        bridge.http_port()
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C reçu, arrêt");
                break;
            }
            _ = tokio::time::sleep(HANDLE_PERIOD) => {
                bridge.handle();
            }
        }
    }

    bridge.disable();
    Ok(())
}
