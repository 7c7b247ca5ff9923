//! Gestion du cycle de vie des connexions TCP
//!
//! Un pool de slots clients à capacité fixe multiplexe les contrôleurs
//! concurrents. Chaque connexion acceptée prend le premier slot libre
//! (ou abandonné) et vit sur sa propre tâche : lecture avec timeout
//! d'inactivité, passage du tampon au routeur, libération du slot à la
//! déconnexion. Pool plein ou pont désactivé : la connexion est refusée
//! et fermée immédiatement, sans file d'attente.

use crate::bridge::BridgeCore;
use crate::http::control::apply_state_body;
use crate::http::request::ParsedRequest;
use crate::http::{RouterOutcome, parse_request, route};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Taille du tampon de lecture ; une requête de contrôleur tient
/// largement dedans, le parseur suppose la requête complète
pub(crate) const REQUEST_BUFFER_SIZE: usize = 4096;

/// Pool de slots clients à capacité fixe
///
/// Un slot occupé par une connexion terminée est réutilisable ; la
/// libération est idempotente et vérifiée par génération, pour qu'une
/// double libération ne touche jamais un slot déjà réattribué.
pub(crate) struct ClientPool {
    slots: Vec<Option<ClientSlot>>,
    next_generation: u64,
}

struct ClientSlot {
    generation: u64,
    finished: Arc<AtomicBool>,
}

impl ClientPool {
    pub(crate) fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            next_generation: 0,
        }
    }

    /// Réserve le premier slot vide ou abandonné
    ///
    /// # Returns
    ///
    /// L'index du slot, sa génération, et le drapeau de fin que la
    /// tâche cliente lève avant de libérer ; `None` si le pool est
    /// plein de connexions vivantes.
    pub(crate) fn acquire(&mut self) -> Option<(usize, u64, Arc<AtomicBool>)> {
        for index in 0..self.slots.len() {
            let reusable = match &self.slots[index] {
                None => true,
                Some(slot) => slot.finished.load(Ordering::Acquire),
            };
            if !reusable {
                continue;
            }

            // Libérer l'éventuel occupant périmé avant d'installer
            self.slots[index] = None;

            let generation = self.next_generation;
            self.next_generation += 1;
            let finished = Arc::new(AtomicBool::new(false));
            self.slots[index] = Some(ClientSlot {
                generation,
                finished: finished.clone(),
            });
            return Some((index, generation, finished));
        }
        None
    }

    /// Libère un slot si (et seulement si) il porte encore la même
    /// génération
    pub(crate) fn release(&mut self, index: usize, generation: u64) {
        if let Some(slot) = &self.slots[index] {
            if slot.generation == generation {
                self.slots[index] = None;
            }
        }
    }

    /// Nombre de slots occupés par une connexion vivante
    pub(crate) fn live_count(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|slot| !slot.finished.load(Ordering::Acquire))
            .count()
    }
}

/// Route un tampon de requête et écrit les réponses sur `sink`
///
/// Pour une mutation d'état, l'accusé de réception part sur le fil
/// avant l'interprétation du corps ; les callbacks sont invoqués après
/// l'application, sur cette même tâche.
///
/// # Returns
///
/// `false` si la requête a été déclinée (aucun octet émis).
pub(crate) async fn serve_buffer<W>(
    core: &BridgeCore,
    buf: &[u8],
    sink: &mut W,
) -> std::io::Result<bool>
where
    W: AsyncWrite + Unpin,
{
    let Some(request) = parse_request(buf) else {
        return Ok(false);
    };
    serve_request(core, &request, sink).await
}

/// Variante de [`serve_buffer`] pour une requête déjà découpée
pub(crate) async fn serve_request<W>(
    core: &BridgeCore,
    request: &ParsedRequest<'_>,
    sink: &mut W,
) -> std::io::Result<bool>
where
    W: AsyncWrite + Unpin,
{
    let outcome = {
        let registry = core.registry.read().unwrap();
        route(
            &registry,
            &core.identity,
            core.http_port(),
            core.is_enabled(),
            request,
        )
    };

    match outcome {
        RouterOutcome::Unhandled => Ok(false),
        RouterOutcome::Response(response) => {
            sink.write_all(&response.to_bytes()).await?;
            sink.flush().await?;
            Ok(true)
        }
        RouterOutcome::ControlAck {
            response,
            device_index,
            body,
        } => {
            sink.write_all(&response.to_bytes()).await?;
            sink.flush().await?;

            let record = {
                let mut registry = core.registry.write().unwrap();
                apply_state_body(&mut registry, device_index, &body)
            };
            if let Some(record) = record {
                core.callbacks.read().unwrap().notify(device_index, &record);
            }
            Ok(true)
        }
    }
}

/// Boucle d'acceptation des connexions entrantes
///
/// Tourne tant que le listener vit ; le drapeau d'activation est testé
/// à chaque connexion, une désactivation ne tue donc pas la boucle.
pub(crate) async fn run_listener(
    core: Arc<BridgeCore>,
    listener: TcpListener,
    pool: Arc<Mutex<ClientPool>>,
    rx_timeout: Duration,
) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("❌ Accept error: {}", e);
                continue;
            }
        };

        if !core.is_enabled() {
            debug!("Rejecting {} - disabled", peer);
            continue; // drop ferme la connexion
        }

        let Some((slot, generation, finished)) = pool.lock().unwrap().acquire() else {
            warn!("❌ Rejecting {} - too many connections", peer);
            continue;
        };

        info!("✅ Client #{} connected ({})", slot, peer);

        let core = core.clone();
        let pool = pool.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_client(&core, stream, slot, rx_timeout).await {
                warn!("❌ Error on client #{}: {}", slot, e);
            }

            // La libération passe toujours par ici, erreur comprise
            finished.store(true, Ordering::Release);
            pool.lock().unwrap().release(slot, generation);
            debug!("Client #{} disconnected", slot);
        });
    }
}

/// Sert une connexion cliente jusqu'à déconnexion, erreur ou timeout
async fn serve_client(
    core: &BridgeCore,
    mut stream: TcpStream,
    slot: usize,
    rx_timeout: Duration,
) -> std::io::Result<()> {
    let mut buf = vec![0u8; REQUEST_BUFFER_SIZE];

    loop {
        let read = match timeout(rx_timeout, stream.read(&mut buf)).await {
            // Timeout d'inactivité : fermeture unilatérale
            Err(_) => {
                debug!("Timeout on client #{}", slot);
                return Ok(());
            }
            Ok(Ok(0)) => return Ok(()),
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(e),
        };

        if !serve_buffer(core, &buf[..read], &mut stream).await? {
            debug!("Client #{} request declined", slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_acquire_fills_capacity() {
        let mut pool = ClientPool::new(2);
        assert!(pool.acquire().is_some());
        assert!(pool.acquire().is_some());
        assert!(pool.acquire().is_none());
        assert_eq!(pool.live_count(), 2);
    }

    #[test]
    fn test_pool_release_frees_slot() {
        let mut pool = ClientPool::new(1);
        let (slot, generation, _finished) = pool.acquire().unwrap();

        pool.release(slot, generation);
        assert_eq!(pool.live_count(), 0);
        assert!(pool.acquire().is_some());
    }

    #[test]
    fn test_pool_reuses_finished_slot() {
        let mut pool = ClientPool::new(1);
        let (_, _, finished) = pool.acquire().unwrap();

        // Connexion terminée mais pas encore libérée : le slot est
        // réattribuable
        finished.store(true, Ordering::Release);
        assert!(pool.acquire().is_some());
    }

    #[test]
    fn test_pool_double_release_is_noop() {
        let mut pool = ClientPool::new(1);
        let (slot, old_generation, _) = pool.acquire().unwrap();
        pool.release(slot, old_generation);

        // Le slot est réattribué à une connexion plus récente
        let (same_slot, new_generation, _) = pool.acquire().unwrap();
        assert_eq!(same_slot, slot);

        // Une libération tardive avec l'ancienne génération ne doit pas
        // corrompre le slot réutilisé
        pool.release(slot, old_generation);
        assert_eq!(pool.live_count(), 1);

        pool.release(slot, new_generation);
        assert_eq!(pool.live_count(), 0);
    }
}
