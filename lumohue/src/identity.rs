//! Identité réseau du pont émulé
//!
//! Tous les jetons annoncés sur le réseau (UUID UPnP, numéro de série,
//! pseudo-username, `uniqueid` des devices) dérivent de la même paire
//! adresse IP / adresse MAC, détectée une seule fois à la construction.

use md5::{Digest, Md5};
use std::net::Ipv4Addr;

/// Préfixe d'UUID des ponts Hue, attendu tel quel par les contrôleurs
const DEVICE_UUID_PREFIX: &str = "2f402f80-da50-11e1-9b23";

/// Identité réseau annoncée par le pont
///
/// Les contrôleurs recoupent l'UUID de la réponse de découverte avec
/// celui de `/description.xml` : les deux doivent provenir de la même
/// instance.
#[derive(Debug, Clone)]
pub struct BridgeIdentity {
    /// Adresse IPv4 annoncée dans les URLs (LOCATION, URLBase)
    pub ip: Ipv4Addr,

    /// Adresse MAC au format `AA:BB:CC:DD:EE:FF`, utilisée dans les
    /// `uniqueid` des devices virtuels
    pub mac: String,

    /// Adresse MAC compactée en minuscules, utilisée dans les jetons
    /// UPnP (UUID, serial, bridgeid)
    mac_token: String,
}

impl BridgeIdentity {
    /// Détecte l'identité de la machine hôte
    ///
    /// # Returns
    ///
    /// Une identité construite depuis l'IP locale devinée et la MAC de
    /// l'interface principale (avec replis fixes si la détection échoue).
    pub fn detect() -> Self {
        Self::from_parts(lumoutils::guess_local_ip(), lumoutils::primary_mac())
    }

    /// Construit une identité depuis une paire IP / MAC explicite
    pub fn from_parts(ip: Ipv4Addr, mac: String) -> Self {
        let mac_token = lumoutils::strip_mac(&mac);
        Self { ip, mac, mac_token }
    }

    /// Jeton MAC compacté (minuscules, sans `:`)
    pub fn mac_token(&self) -> &str {
        &self.mac_token
    }

    /// UUID UPnP du device racine
    pub fn device_uuid(&self) -> String {
        format!("{}-{}", DEVICE_UUID_PREFIX, self.mac_token)
    }

    /// Pseudo-username renvoyé lors du handshake `devicetype`
    ///
    /// Les contrôleurs Hue réclament un username de session ; le pont
    /// n'authentifie rien, il fabrique donc un jeton stable en hachant
    /// le jeton MAC. MD5 n'est utilisé que pour cela.
    pub fn pseudo_username(&self) -> String {
        let mut hasher = Md5::new();
        hasher.update(self.mac_token.as_bytes());
        let digest = hasher.finalize();

        let mut token = String::with_capacity(32);
        for byte in digest {
            token.push_str(&format!("{:02x}", byte));
        }
        token
    }

    /// `uniqueid` d'un device virtuel
    ///
    /// Format figé `XX:<mac>:00:00` où XX est l'index de création en
    /// hexadécimal, immuable une fois le device créé.
    pub fn unique_id(&self, index: usize) -> String {
        format!("{:02X}:{}:{}", index, self.mac, "00:00")
    }
}
