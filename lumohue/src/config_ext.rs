//! Extension pour intégrer la configuration du pont dans lumoconfig
//!
//! Ce module fournit le trait `HueConfigExt` qui ajoute les réglages
//! propres au pont émulé à `lumoconfig::Config`, sur le même modèle
//! que les autres crates du workspace.

use anyhow::Result;
use lumoconfig::Config;
use serde_yaml::{Number, Value};

/// Capacité par défaut du pool de clients TCP
pub(crate) const DEFAULT_MAX_CLIENTS: usize = 10;

/// Timeout d'inactivité par défaut d'une connexion cliente (secondes)
pub(crate) const DEFAULT_RX_TIMEOUT_SECS: u64 = 3;

/// Trait d'extension pour la configuration du pont émulé
///
/// # Exemple
///
/// ```rust,ignore
/// use lumoconfig::get_config;
/// use lumohue::HueConfigExt;
///
/// let config = get_config();
/// let max_clients = config.get_bridge_max_clients()?;
/// ```
pub trait HueConfigExt {
    /// Récupère la capacité du pool de clients TCP
    ///
    /// # Returns
    ///
    /// Le nombre maximal de connexions simultanées (défaut: 10)
    fn get_bridge_max_clients(&self) -> Result<usize>;

    /// Définit la capacité du pool de clients TCP
    fn set_bridge_max_clients(&self, max_clients: usize) -> Result<()>;

    /// Récupère le timeout d'inactivité des connexions clientes
    ///
    /// # Returns
    ///
    /// Le timeout en secondes (défaut: 3)
    fn get_bridge_rx_timeout_secs(&self) -> Result<u64>;

    /// Définit le timeout d'inactivité des connexions clientes
    fn set_bridge_rx_timeout_secs(&self, secs: u64) -> Result<()>;
}

impl HueConfigExt for Config {
    fn get_bridge_max_clients(&self) -> Result<usize> {
        match self.get_value(&["bridge", "max_clients"]) {
            Ok(Value::Number(n)) if n.is_u64() => Ok(n.as_u64().unwrap() as usize),
            _ => Ok(DEFAULT_MAX_CLIENTS),
        }
    }

    fn set_bridge_max_clients(&self, max_clients: usize) -> Result<()> {
        self.set_value(
            &["bridge", "max_clients"],
            Value::Number(Number::from(max_clients)),
        )
    }

    fn get_bridge_rx_timeout_secs(&self) -> Result<u64> {
        match self.get_value(&["bridge", "rx_timeout_secs"]) {
            Ok(Value::Number(n)) if n.is_u64() => Ok(n.as_u64().unwrap()),
            _ => Ok(DEFAULT_RX_TIMEOUT_SECS),
        }
    }

    fn set_bridge_rx_timeout_secs(&self, secs: u64) -> Result<()> {
        self.set_value(
            &["bridge", "rx_timeout_secs"],
            Value::Number(Number::from(secs)),
        )
    }
}
