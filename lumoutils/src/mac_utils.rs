use tracing::warn;

/// Adresse MAC de repli quand aucune interface n'en expose une
/// (conteneurs, environnements de test).
const FALLBACK_MAC: &str = "DE:AD:BE:EF:00:42";

/// Retourne l'adresse MAC de l'interface principale.
///
/// # Format
///
/// Six octets hexadécimaux en majuscules séparés par `:`, comme
/// `B8:27:EB:12:34:56`. C'est le format attendu par les identifiants
/// `uniqueid` des devices virtuels.
///
/// # Returns
///
/// L'adresse MAC détectée, ou une adresse de repli fixe si aucune
/// interface n'en fournit (un pont émulé doit toujours avoir une
/// identité, même dégradée).
pub fn primary_mac() -> String {
    match mac_address::get_mac_address() {
        Ok(Some(mac)) => {
            let b = mac.bytes();
            format!(
                "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
                b[0], b[1], b[2], b[3], b[4], b[5]
            )
        }
        Ok(None) => {
            warn!("❌ No interface exposes a MAC address, using fallback");
            FALLBACK_MAC.to_string()
        }
        Err(e) => {
            warn!("❌ Failed to read MAC address: {}, using fallback", e);
            FALLBACK_MAC.to_string()
        }
    }
}

/// Compacte une adresse MAC pour les jetons d'identité UPnP.
///
/// Supprime les séparateurs `:` et passe en minuscules, le format
/// utilisé dans les UUID de device et les numéros de série annoncés.
///
/// # Examples
///
/// ```
/// use lumoutils::strip_mac;
///
/// assert_eq!(strip_mac("B8:27:EB:12:34:56"), "b827eb123456");
/// ```
pub fn strip_mac(mac: &str) -> String {
    mac.chars()
        .filter(|c| *c != ':')
        .flat_map(char::to_lowercase)
        .collect()
}
