//! Façade du pont émulé
//!
//! [`VirtualBridge`] assemble les quatre morceaux du protocole :
//! registre des devices, répondeur de découverte, routeur HTTP et pool
//! de connexions. L'application hôte enregistre ses devices et ses
//! callbacks d'actionnement, active le pont, puis appelle
//! [`handle`](VirtualBridge::handle) à chaque tick pour répondre aux
//! sondes de découverte avant le timeout du contrôleur.
//!
//! Toutes les mutations du registre passent par le même point de
//! synchronisation : le verrou unique du cœur partagé. Les tâches
//! tokio livrent les requêtes en parallèle, ce verrou est donc la
//! seule frontière d'exclusion mutuelle du crate.

use crate::callbacks::CallbackSet;
use crate::error::Result;
use crate::http::request::ParsedRequest;
use crate::identity::BridgeIdentity;
use crate::registry::DeviceRegistry;
use crate::server::{ClientPool, run_listener, serve_buffer, serve_request};
use crate::ssdp::DiscoveryResponder;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::io::AsyncWrite;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config_ext::{DEFAULT_MAX_CLIENTS, DEFAULT_RX_TIMEOUT_SECS, HueConfigExt};

/// État partagé entre la façade, la boucle d'acceptation et les tâches
/// clientes
pub(crate) struct BridgeCore {
    pub(crate) identity: BridgeIdentity,
    http_port: AtomicU16,
    enabled: AtomicBool,
    pub(crate) registry: RwLock<DeviceRegistry>,
    pub(crate) callbacks: RwLock<CallbackSet>,
}

impl BridgeCore {
    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub(crate) fn http_port(&self) -> u16 {
        self.http_port.load(Ordering::Acquire)
    }
}

/// Constructeur du pont émulé
///
/// # Exemple
///
/// ```rust,no_run
/// # use lumohue::BridgeBuilder;
/// # #[tokio::main]
/// # async fn main() -> lumohue::Result<()> {
/// let mut bridge = BridgeBuilder::new(1901).build();
/// bridge.add_device("lampe salon");
/// bridge.enable().await?;
/// # Ok(())
/// # }
/// ```
pub struct BridgeBuilder {
    port: u16,
    max_clients: usize,
    rx_timeout: Duration,
    identity: Option<BridgeIdentity>,
}

impl BridgeBuilder {
    /// Crée un builder sur un port TCP explicite
    pub fn new(port: u16) -> Self {
        Self {
            port,
            max_clients: DEFAULT_MAX_CLIENTS,
            rx_timeout: Duration::from_secs(DEFAULT_RX_TIMEOUT_SECS),
            identity: None,
        }
    }

    /// Crée un builder depuis la configuration globale
    pub fn new_configured() -> Result<Self> {
        let config = lumoconfig::get_config();
        Ok(Self {
            port: config.get_http_port(),
            max_clients: config.get_bridge_max_clients()?,
            rx_timeout: Duration::from_secs(config.get_bridge_rx_timeout_secs()?),
            identity: None,
        })
    }

    /// Remplace la capacité du pool de clients
    pub fn max_clients(mut self, max_clients: usize) -> Self {
        self.max_clients = max_clients;
        self
    }

    /// Remplace le timeout d'inactivité des connexions
    pub fn rx_timeout(mut self, rx_timeout: Duration) -> Self {
        self.rx_timeout = rx_timeout;
        self
    }

    /// Impose une identité réseau au lieu de la détecter
    pub fn identity(mut self, identity: BridgeIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Construit le pont
    pub fn build(self) -> VirtualBridge {
        let identity = self.identity.unwrap_or_else(BridgeIdentity::detect);

        VirtualBridge {
            core: Arc::new(BridgeCore {
                identity: identity.clone(),
                http_port: AtomicU16::new(self.port),
                enabled: AtomicBool::new(false),
                registry: RwLock::new(DeviceRegistry::new(identity)),
                callbacks: RwLock::new(CallbackSet::default()),
            }),
            pool: Arc::new(Mutex::new(ClientPool::new(self.max_clients))),
            rx_timeout: self.rx_timeout,
            requested_port: self.port,
            responder: None,
            listener_task: None,
        }
    }
}

/// Pont Hue émulé
///
/// Voir la documentation de [`crate`] pour le cycle de vie complet.
pub struct VirtualBridge {
    core: Arc<BridgeCore>,
    pool: Arc<Mutex<ClientPool>>,
    rx_timeout: Duration,
    requested_port: u16,
    responder: Option<DiscoveryResponder>,
    listener_task: Option<JoinHandle<()>>,
}

impl VirtualBridge {
    /// Crée un pont sur un port TCP explicite avec les réglages par
    /// défaut
    pub fn new(port: u16) -> Self {
        BridgeBuilder::new(port).build()
    }

    /// Identité réseau annoncée par le pont
    pub fn identity(&self) -> BridgeIdentity {
        self.core.identity.clone()
    }

    /// Port TCP effectif (résolu après `enable` si le port demandé
    /// était 0)
    pub fn http_port(&self) -> u16 {
        self.core.http_port()
    }

    // ------------------------------------------------------------------
    // Devices
    // ------------------------------------------------------------------

    /// Ajoute un device virtuel, retourne son index 0-based
    pub fn add_device(&self, name: &str) -> usize {
        self.core.registry.write().unwrap().add(name)
    }

    /// Index d'un device par son nom
    pub fn find_device(&self, name: &str) -> Option<usize> {
        self.core.registry.read().unwrap().find_by_name(name)
    }

    /// Nombre de devices enregistrés
    pub fn device_count(&self) -> usize {
        self.core.registry.read().unwrap().len()
    }

    /// Renomme un device par index
    pub fn rename_device(&self, id: usize, new_name: &str) -> bool {
        self.core.registry.write().unwrap().rename(id, new_name)
    }

    /// Renomme un device par nom
    pub fn rename_device_by_name(&self, old_name: &str, new_name: &str) -> bool {
        self.core
            .registry
            .write()
            .unwrap()
            .rename_by_name(old_name, new_name)
    }

    /// Supprime un device par index ; les indices suivants glissent
    pub fn remove_device(&self, id: usize) -> bool {
        self.core.registry.write().unwrap().remove(id)
    }

    /// Supprime un device par nom
    pub fn remove_device_by_name(&self, name: &str) -> bool {
        self.core.registry.write().unwrap().remove_by_name(name)
    }

    /// Nom d'un device, `None` si l'index est hors limites
    pub fn device_name(&self, id: usize) -> Option<String> {
        self.core
            .registry
            .read()
            .unwrap()
            .get_name(id)
            .map(str::to_string)
    }

    /// Remplace le `uniqueid` d'un device
    pub fn set_device_unique_id(&self, id: usize, unique_id: &str) -> bool {
        self.core
            .registry
            .write()
            .unwrap()
            .set_unique_id(id, unique_id)
    }

    /// Fixe l'état marche/arrêt et la luminosité d'un device
    ///
    /// Les setters directs ne déclenchent pas les callbacks : ils
    /// reflètent un état déjà appliqué par l'application hôte.
    pub fn set_state(&self, id: usize, state: bool, brightness: u8) -> bool {
        self.core
            .registry
            .write()
            .unwrap()
            .set_state(id, state, brightness)
    }

    /// Variante par nom de [`Self::set_state`]
    pub fn set_state_by_name(&self, name: &str, state: bool, brightness: u8) -> bool {
        self.core
            .registry
            .write()
            .unwrap()
            .set_state_by_name(name, state, brightness)
    }

    /// Fixe l'état, la luminosité et la couleur teinte/saturation
    pub fn set_state_color(
        &self,
        id: usize,
        state: bool,
        brightness: u8,
        hue: u16,
        saturation: u8,
    ) -> bool {
        self.core
            .registry
            .write()
            .unwrap()
            .set_state_color(id, state, brightness, hue, saturation)
    }

    /// Variante par nom de [`Self::set_state_color`]
    pub fn set_state_color_by_name(
        &self,
        name: &str,
        state: bool,
        brightness: u8,
        hue: u16,
        saturation: u8,
    ) -> bool {
        self.core
            .registry
            .write()
            .unwrap()
            .set_state_color_by_name(name, state, brightness, hue, saturation)
    }

    /// Fixe l'état complet, température de couleur comprise
    pub fn set_state_color_temp(
        &self,
        id: usize,
        state: bool,
        brightness: u8,
        hue: u16,
        saturation: u8,
        color_temp: u16,
    ) -> bool {
        self.core.registry.write().unwrap().set_state_color_temp(
            id,
            state,
            brightness,
            hue,
            saturation,
            color_temp,
        )
    }

    /// Variante par nom de [`Self::set_state_color_temp`]
    pub fn set_state_color_temp_by_name(
        &self,
        name: &str,
        state: bool,
        brightness: u8,
        hue: u16,
        saturation: u8,
        color_temp: u16,
    ) -> bool {
        self.core
            .registry
            .write()
            .unwrap()
            .set_state_color_temp_by_name(name, state, brightness, hue, saturation, color_temp)
    }

    // ------------------------------------------------------------------
    // Callbacks d'actionnement
    // ------------------------------------------------------------------

    /// Enregistre le callback état + luminosité
    pub fn on_state<F>(&self, callback: F)
    where
        F: Fn(usize, &str, bool, u8) + Send + Sync + 'static,
    {
        self.core.callbacks.write().unwrap().on_state = Some(Box::new(callback));
    }

    /// Enregistre le callback état + couleur
    pub fn on_state_color<F>(&self, callback: F)
    where
        F: Fn(usize, &str, bool, u8, u16, u8) + Send + Sync + 'static,
    {
        self.core.callbacks.write().unwrap().on_state_color = Some(Box::new(callback));
    }

    /// Enregistre le callback état + couleur + température
    pub fn on_state_color_temp<F>(&self, callback: F)
    where
        F: Fn(usize, &str, bool, u8, u16, u8, u16) + Send + Sync + 'static,
    {
        self.core.callbacks.write().unwrap().on_state_color_temp = Some(Box::new(callback));
    }

    // ------------------------------------------------------------------
    // Cycle de vie
    // ------------------------------------------------------------------

    /// Active le pont : listener TCP puis socket de découverte
    ///
    /// Le premier appel lie le listener (un port demandé à 0 est résolu
    /// en port éphémère) et lance la boucle d'acceptation ; les appels
    /// suivants se contentent de lever le drapeau d'activation. Un
    /// échec du socket multicast n'est pas fatal : le pont reste
    /// joignable en direct, seule la découverte est dégradée.
    pub async fn enable(&mut self) -> Result<()> {
        if self.core.is_enabled() {
            return Ok(());
        }

        if self.listener_task.is_none() {
            let listener = TcpListener::bind(("0.0.0.0", self.requested_port)).await?;
            let port = listener.local_addr()?.port();
            self.core.http_port.store(port, Ordering::Release);

            self.listener_task = Some(tokio::spawn(run_listener(
                self.core.clone(),
                listener,
                self.pool.clone(),
                self.rx_timeout,
            )));
            info!("✅ Bridge HTTP surface listening on port {}", port);
        }

        if self.responder.is_none() {
            match DiscoveryResponder::bind(&self.core.identity, self.core.http_port()) {
                Ok(responder) => self.responder = Some(responder),
                Err(e) => warn!("❌ Discovery socket unavailable: {}", e),
            }
        }

        self.core.enabled.store(true, Ordering::Release);
        info!("✅ Bridge enabled");
        Ok(())
    }

    /// Désactive le pont : toute requête et toute connexion entrante
    /// sont refusées jusqu'à la prochaine activation
    pub fn disable(&self) {
        self.core.enabled.store(false, Ordering::Release);
        info!("👋 Bridge disabled");
    }

    /// Vrai si le pont répond aux requêtes
    pub fn is_enabled(&self) -> bool {
        self.core.is_enabled()
    }

    /// Tick périodique : traite au plus une sonde de découverte
    ///
    /// À appeler assez souvent pour répondre avant le timeout de sonde
    /// du contrôleur (une période de l'ordre de 100 ms convient).
    pub fn handle(&self) {
        if !self.core.is_enabled() {
            return;
        }
        if let Some(responder) = &self.responder {
            responder.poll_once();
        }
    }

    /// Route un tampon de requête brut vers la surface HTTP du pont
    ///
    /// Point d'entrée pour servir le protocole depuis une pile HTTP
    /// externe ; les réponses sont écrites sur `sink`.
    ///
    /// # Returns
    ///
    /// `false` si la requête a été déclinée (aucun octet émis).
    pub async fn serve<W>(&self, buf: &[u8], sink: &mut W) -> std::io::Result<bool>
    where
        W: AsyncWrite + Unpin,
    {
        serve_buffer(&self.core, buf, sink).await
    }

    /// Variante de [`Self::serve`] pour une requête déjà découpée
    pub async fn process<W>(
        &self,
        is_get: bool,
        url: &str,
        body: &str,
        sink: &mut W,
    ) -> std::io::Result<bool>
    where
        W: AsyncWrite + Unpin,
    {
        let request = ParsedRequest {
            method: if is_get { "GET" } else { "PUT" },
            url,
            body,
        };
        serve_request(&self.core, &request, sink).await
    }
}

impl Drop for VirtualBridge {
    fn drop(&mut self) {
        if let Some(task) = self.listener_task.take() {
            task.abort();
        }
    }
}
