//! Répondeur aux sondes de découverte M-SEARCH

use super::{SSDP_MULTICAST_ADDR, SSDP_PORT};
use crate::identity::BridgeIdentity;
use std::io;
use std::net::UdpSocket;
use tracing::{debug, info, warn};

/// Marqueurs de cible de recherche auxquels le pont répond
///
/// Toute sonde M-SEARCH ne portant aucun de ces marqueurs est ignorée :
/// seules les recherches visant un pont de ce type méritent une
/// réponse, pas le reste du trafic SSDP.
const SEARCH_MARKERS: [&str; 3] = ["ssdp:discover", "upnp:rootdevice", "device:basic:1"];

/// Répondeur de découverte du pont
///
/// Écoute le groupe multicast SSDP et répond en unicast aux sondes
/// M-SEARCH pertinentes en annonçant l'endpoint HTTP du pont. La
/// lecture est strictement non-bloquante : l'application hôte appelle
/// [`poll_once`](Self::poll_once) à chaque tick.
pub struct DiscoveryResponder {
    socket: UdpSocket,
    identity: BridgeIdentity,
    http_port: u16,
}

impl DiscoveryResponder {
    /// Lie le socket multicast SSDP et rejoint le groupe
    ///
    /// # Arguments
    ///
    /// * `identity` - Identité réseau annoncée dans les réponses
    /// * `http_port` - Port TCP annoncé dans le champ LOCATION
    pub fn bind(identity: &BridgeIdentity, http_port: u16) -> io::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", SSDP_PORT))?;

        // Rejoindre le groupe multicast
        socket.join_multicast_v4(
            &SSDP_MULTICAST_ADDR.parse().unwrap(),
            &"0.0.0.0".parse().unwrap(),
        )?;

        socket.set_nonblocking(true)?;
        socket.set_multicast_loop_v4(false)?;

        info!(
            "✅ SSDP responder listening on {}:{}",
            SSDP_MULTICAST_ADDR, SSDP_PORT
        );

        Ok(Self::from_socket(socket, identity, http_port))
    }

    /// Construit un répondeur sur un socket déjà préparé
    pub(crate) fn from_socket(
        socket: UdpSocket,
        identity: &BridgeIdentity,
        http_port: u16,
    ) -> Self {
        Self {
            socket,
            identity: identity.clone(),
            http_port,
        }
    }

    /// Traite au plus un datagramme en attente
    ///
    /// Retourne immédiatement si rien n'est arrivé depuis le dernier
    /// appel. Une sonde reconnue déclenche exactement une réponse
    /// unicast vers sa source ; tout le reste est ignoré sans réponse.
    ///
    /// # Returns
    ///
    /// `true` si une réponse a été émise.
    pub fn poll_once(&self) -> bool {
        let mut buf = [0u8; 1536];

        match self.socket.recv_from(&mut buf) {
            Ok((n, src)) => {
                let data = String::from_utf8_lossy(&buf[..n]);
                if !is_discovery_probe(&data) {
                    return false;
                }

                debug!("📡 M-SEARCH probe received from {}", src);
                let response = search_response(&self.identity, self.http_port);
                match self.socket.send_to(response.as_bytes(), src) {
                    Ok(_) => {
                        info!("📡 Discovery response sent to {}", src);
                        true
                    }
                    Err(e) => {
                        warn!("❌ Failed to send discovery response to {}: {}", src, e);
                        false
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => false,
            Err(e) => {
                warn!("❌ SSDP read error: {}", e);
                false
            }
        }
    }
}

/// Teste si un datagramme est une sonde de découverte pertinente
///
/// Il faut le littéral "M-SEARCH" et au moins un des marqueurs de
/// cible ; les annonces et autres trafics SSDP ne déclenchent rien.
pub(crate) fn is_discovery_probe(data: &str) -> bool {
    data.contains("M-SEARCH") && SEARCH_MARKERS.iter().any(|marker| data.contains(marker))
}

/// Construit la réponse de découverte
///
/// Gabarit figé attendu par les contrôleurs : champs UPnP standard,
/// LOCATION vers `/description.xml`, et les deux jetons d'identité
/// dérivés de la MAC (bridgeid et USN). `format!` calcule la taille
/// exacte avant d'allouer le tampon final.
pub(crate) fn search_response(identity: &BridgeIdentity, http_port: u16) -> String {
    format!(
        "HTTP/1.1 200 OK\r\n\
         EXT:\r\n\
         CACHE-CONTROL: max-age=100\r\n\
         LOCATION: http://{}:{}/description.xml\r\n\
         SERVER: FreeRTOS/6.0.5, UPnP/1.0, IpBridge/1.17.0\r\n\
         hue-bridgeid: {}\r\n\
         ST: urn:schemas-upnp-org:device:basic:1\r\n\
         USN: uuid:{}::upnp:rootdevice\r\n\
         \r\n",
        identity.ip,
        http_port,
        identity.mac_token(),
        identity.device_uuid(),
    )
}
