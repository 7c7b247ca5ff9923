//! Gestion des erreurs pour le pont émulé

use thiserror::Error;

/// Type Result personnalisé pour lumohue
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Erreurs possibles lors de l'exploitation du pont émulé
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Erreur d'entrée/sortie réseau (bind, accept, envoi de datagramme)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Erreur de configuration (anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),
}
