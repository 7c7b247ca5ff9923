use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// Devine l'adresse IPv4 locale de la machine.
///
/// La détection passe par la technique classique du "connect UDP" : un
/// socket UDP est lié à `0.0.0.0:0` puis connecté vers un serveur DNS
/// public. Aucun paquet n'est émis (UDP est sans connexion), mais le
/// système d'exploitation choisit l'interface de sortie, dont on lit
/// ensuite l'adresse locale.
///
/// # Returns
///
/// L'adresse IPv4 locale, ou `127.0.0.1` si la détection échoue à
/// n'importe quelle étape (pas de route, pas d'interface, IPv6 only).
///
/// # Examples
///
/// ```
/// use lumoutils::guess_local_ip;
///
/// let ip = guess_local_ip();
/// println!("IP locale: {}", ip);
/// ```
pub fn guess_local_ip() -> Ipv4Addr {
    if let Ok(socket) = UdpSocket::bind("0.0.0.0:0") {
        if socket.connect("8.8.8.8:80").is_ok() {
            if let Ok(addr) = socket.local_addr() {
                if let IpAddr::V4(ip) = addr.ip() {
                    return ip;
                }
            }
        }
    }

    // Machine sans route par défaut : première interface IPv4 venue
    first_non_loopback_ip().unwrap_or(Ipv4Addr::LOCALHOST)
}

/// Première adresse IPv4 non-loopback des interfaces réseau.
///
/// Secours quand le connect UDP ne donne rien d'utile.
pub(crate) fn first_non_loopback_ip() -> Option<Ipv4Addr> {
    let interfaces = get_if_addrs::get_if_addrs().ok()?;
    interfaces.into_iter().find_map(|iface| match iface.ip() {
        IpAddr::V4(ip) if !ip.is_loopback() => Some(ip),
        _ => None,
    })
}
