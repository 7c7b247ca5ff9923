//! # Module SSDP - Découverte du pont émulé
//!
//! Ce module implémente la moitié réponse du protocole SSDP : le pont
//! n'annonce jamais spontanément (pas de NOTIFY alive/byebye), il se
//! contente de répondre aux sondes M-SEARCH pertinentes émises par les
//! contrôleurs compatibles Hue.
//!
//! ## Fonctionnalités
//!
//! - ✅ Lecture non-bloquante, au plus un datagramme par appel
//! - ✅ Filtrage des sondes par marqueurs de cible de recherche
//! - ✅ Réponse unicast vers la source de la sonde
//!
//! ## Architecture
//!
//! - [`DiscoveryResponder`] : Socket multicast et logique de réponse
//!
//! ## Constants SSDP
//!
//! - **Multicast Address**: 239.255.255.250:1900

mod responder;

pub use responder::DiscoveryResponder;

/// Adresse multicast SSDP
pub const SSDP_MULTICAST_ADDR: &str = "239.255.255.250";

/// Port SSDP
pub const SSDP_PORT: u16 = 1900;
