/// Utilitaires réseau partagés par les crates LumoBridge.
///
/// Ce crate regroupe les fonctions d'identité réseau dont le pont émulé
/// a besoin : détection de l'adresse IP locale et récupération de
/// l'adresse MAC de l'interface principale.
///
/// # Fonctions principales
///
/// - [`guess_local_ip`] : Devine l'adresse IPv4 locale utilisée pour les connexions sortantes
/// - [`primary_mac`] : Adresse MAC de l'interface principale (format `AA:BB:CC:DD:EE:FF`)
/// - [`strip_mac`] : Version compacte en minuscules d'une adresse MAC
mod ip_utils;
mod mac_utils;

pub use ip_utils::guess_local_ip;
pub use mac_utils::{primary_mac, strip_mac};
