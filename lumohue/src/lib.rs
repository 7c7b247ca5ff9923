//! # lumohue - Émulation d'un pont Philips Hue
//!
//! Ce crate fait passer une machine pour un pont Hue auprès des
//! écosystèmes d'assistants vocaux qui ne savent découvrir et piloter
//! que ce type de pont. Il implémente juste assez des deux protocoles
//! concernés pour passer leurs vérifications de compatibilité : la
//! moitié réponse de SSDP/UPnP pour la découverte, et le sous-ensemble
//! de l'API REST du pont que les contrôleurs utilisent réellement.
//!
//! L'actionnement du matériel reste à la charge de l'application hôte,
//! notifiée par callbacks ; le crate ne fournit que l'illusion d'un
//! pont conforme.
//!
//! ## Fonctionnalités
//!
//! - ✅ Réponse aux sondes de découverte M-SEARCH en unicast
//! - ✅ Description UPnP et API lumières (listing, état, contrôle)
//! - ✅ Registre de devices virtuels avec CRUD par index ou par nom
//! - ✅ Pool fixe de connexions TCP avec timeout d'inactivité
//! - ✅ Callbacks d'actionnement synchrones à trois formes
//!
//! ## Architecture
//!
//! - [`VirtualBridge`] : Façade assemblant les composants
//! - [`registry`] : Registre ordonné des devices virtuels
//! - [`ssdp`] : Répondeur de découverte multicast
//! - [`http`] : Parseur, routeur et protocole de contrôle
//!
//! ## Exemple
//!
//! ```rust,no_run
//! use lumohue::BridgeBuilder;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> lumohue::Result<()> {
//! let mut bridge = BridgeBuilder::new_configured()?.build();
//!
//! bridge.add_device("lampe salon");
//! bridge.on_state(move |id, name, state, brightness| {
//!     println!("{} ({}) -> {} @ {}", name, id, state, brightness);
//! });
//!
//! bridge.enable().await?;
//! loop {
//!     bridge.handle();
//!     tokio::time::sleep(Duration::from_millis(100)).await;
//! }
//! # }
//! ```

pub mod bridge;
pub mod callbacks;
mod config_ext;
pub mod error;
pub mod http;
pub mod identity;
pub mod registry;
mod server;
pub mod ssdp;

pub use bridge::{BridgeBuilder, VirtualBridge};
pub use config_ext::HueConfigExt;
pub use error::{BridgeError, Result};
pub use identity::BridgeIdentity;
pub use registry::{ColorMode, DeviceRecord, DeviceRegistry};
pub use ssdp::DiscoveryResponder;
