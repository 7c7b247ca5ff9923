//! # Registre des devices virtuels
//!
//! Liste ordonnée en mémoire des devices exposés par le pont. L'ordre
//! de création fait office d'identifiant : l'index 0-based en interne,
//! sa version 1-based sur le fil (clés JSON, chemins `/lights/<id>`).
//!
//! La suppression compacte la séquence : les indices suivants glissent
//! d'un cran, un appelant qui garde un id après une suppression doit le
//! re-résoudre par nom.

use crate::identity::BridgeIdentity;
use tracing::{debug, info};

/// Valeur maximale de luminosité côté device ; 255 est réservé par le
/// protocole et se normalise en 254
pub const BRIGHTNESS_MAX: u8 = 254;

// Valeurs par défaut d'un device fraîchement créé
const DEFAULT_BRIGHTNESS: u8 = 100;
const DEFAULT_HUE: u16 = 1;
const DEFAULT_SATURATION: u8 = 1;
const DEFAULT_COLOR_TEMP: u16 = 50;

/// Représentation couleur faisant autorité pour un device
///
/// Les trois représentations sont mutuellement exclusives : activer
/// l'une remet les champs numériques des autres à zéro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Teinte / saturation
    HueSat,
    /// Température de couleur (mireds)
    ColorTemp,
    /// Coordonnées xy (accepté comme marqueur de mode uniquement)
    Xy,
}

impl ColorMode {
    /// Code deux-lettres utilisé dans le JSON des devices
    pub fn code(&self) -> &'static str {
        match self {
            ColorMode::HueSat => "hs",
            ColorMode::ColorTemp => "ct",
            ColorMode::Xy => "xy",
        }
    }
}

/// Un device virtuel du registre
#[derive(Debug, Clone)]
pub struct DeviceRecord {
    /// Étiquette mutable, unicité non garantie
    pub name: String,

    /// Jeton au format figé, dérivé à la création ; immuable ensuite
    pub unique_id: String,

    /// Allumé / éteint
    pub state: bool,

    /// Luminosité 0–254 (0 implique éteint)
    pub brightness: u8,

    /// Teinte 0–65535
    pub hue: u16,

    /// Saturation 0–255
    pub saturation: u8,

    /// Température de couleur en mireds
    pub color_temp: u16,

    /// Représentation couleur faisant autorité
    pub color_mode: ColorMode,
}

impl DeviceRecord {
    /// Forme JSON complète ou abrégée du device
    ///
    /// La forme abrégée (listing) ne contient que le nom et le
    /// `uniqueid` ; la forme complète ajoute l'état sous la clé
    /// `state` avec le code colormode deux-lettres.
    pub fn to_json(&self, all: bool) -> String {
        if all {
            format!(
                "{{\"name\":\"{}\",\"uniqueid\":\"{}\",\"state\":{{\"on\":{},\"bri\":{},\"hue\":{},\"sat\":{},\"ct\":{},\"colormode\":\"{}\"}}}}",
                self.name,
                self.unique_id,
                if self.state { "true" } else { "false" },
                self.brightness,
                self.hue,
                self.saturation,
                self.color_temp,
                self.color_mode.code(),
            )
        } else {
            format!(
                "{{\"name\":\"{}\",\"uniqueid\":\"{}\"}}",
                self.name, self.unique_id
            )
        }
    }
}

/// Normalise une luminosité venue du fil : 255 est réservé, le modèle
/// device plafonne à 254
pub(crate) fn clamp_brightness(value: u8) -> u8 {
    if value == u8::MAX { BRIGHTNESS_MAX } else { value }
}

/// Registre ordonné des devices virtuels
///
/// Toutes les mutations passent par le même contexte d'exécution que
/// les handlers HTTP (voir [`crate::bridge`]) ; le registre lui-même ne
/// porte aucun verrou.
#[derive(Debug)]
pub struct DeviceRegistry {
    identity: BridgeIdentity,
    devices: Vec<DeviceRecord>,
}

impl DeviceRegistry {
    /// Crée un registre vide lié à une identité réseau
    pub fn new(identity: BridgeIdentity) -> Self {
        Self {
            identity,
            devices: Vec::new(),
        }
    }

    /// Nombre de devices enregistrés
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Vrai si aucun device n'est enregistré
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Ajoute un device avec les valeurs par défaut
    ///
    /// Le `uniqueid` est synthétisé depuis l'index de création et
    /// l'identité MAC de l'hôte.
    ///
    /// # Returns
    ///
    /// L'index 0-based du nouveau device.
    pub fn add(&mut self, name: &str) -> usize {
        let index = self.devices.len();
        let device = DeviceRecord {
            name: name.to_string(),
            unique_id: self.identity.unique_id(index),
            state: true,
            brightness: DEFAULT_BRIGHTNESS,
            hue: DEFAULT_HUE,
            saturation: DEFAULT_SATURATION,
            color_temp: DEFAULT_COLOR_TEMP,
            color_mode: ColorMode::HueSat,
        };
        self.devices.push(device);

        info!("✅ Device '{}' added as #{}", name, index);
        index
    }

    /// Retrouve l'index d'un device par son nom
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.devices.iter().position(|d| d.name == name)
    }

    /// Renomme un device par index
    pub fn rename(&mut self, id: usize, new_name: &str) -> bool {
        match self.devices.get_mut(id) {
            Some(device) => {
                device.name = new_name.to_string();
                info!("✅ Device #{} renamed to '{}'", id, new_name);
                true
            }
            None => false,
        }
    }

    /// Renomme un device par nom
    pub fn rename_by_name(&mut self, old_name: &str, new_name: &str) -> bool {
        match self.find_by_name(old_name) {
            Some(id) => self.rename(id, new_name),
            None => false,
        }
    }

    /// Supprime un device par index et compacte la séquence
    pub fn remove(&mut self, id: usize) -> bool {
        if id < self.devices.len() {
            self.devices.remove(id);
            info!("👋 Device #{} removed", id);
            true
        } else {
            false
        }
    }

    /// Supprime un device par nom
    pub fn remove_by_name(&mut self, name: &str) -> bool {
        match self.find_by_name(name) {
            Some(id) => self.remove(id),
            None => false,
        }
    }

    /// Nom d'un device, `None` si l'index est hors limites
    pub fn get_name(&self, id: usize) -> Option<&str> {
        self.devices.get(id).map(|d| d.name.as_str())
    }

    /// Remplace le `uniqueid` d'un device
    ///
    /// Réservé aux intégrations qui restaurent des identifiants
    /// persistés ; le format n'est pas vérifié.
    pub fn set_unique_id(&mut self, id: usize, unique_id: &str) -> bool {
        match self.devices.get_mut(id) {
            Some(device) => {
                device.unique_id = unique_id.to_string();
                true
            }
            None => false,
        }
    }

    /// Fixe l'état marche/arrêt et la luminosité
    pub fn set_state(&mut self, id: usize, state: bool, brightness: u8) -> bool {
        match self.devices.get_mut(id) {
            Some(device) => {
                device.state = state;
                device.brightness = clamp_brightness(brightness);
                true
            }
            None => false,
        }
    }

    /// Variante par nom de [`Self::set_state`]
    pub fn set_state_by_name(&mut self, name: &str, state: bool, brightness: u8) -> bool {
        match self.find_by_name(name) {
            Some(id) => self.set_state(id, state, brightness),
            None => false,
        }
    }

    /// Fixe l'état, la luminosité et la couleur teinte/saturation
    pub fn set_state_color(
        &mut self,
        id: usize,
        state: bool,
        brightness: u8,
        hue: u16,
        saturation: u8,
    ) -> bool {
        match self.devices.get_mut(id) {
            Some(device) => {
                device.state = state;
                device.brightness = clamp_brightness(brightness);
                device.hue = hue;
                device.saturation = saturation;
                true
            }
            None => false,
        }
    }

    /// Variante par nom de [`Self::set_state_color`]
    pub fn set_state_color_by_name(
        &mut self,
        name: &str,
        state: bool,
        brightness: u8,
        hue: u16,
        saturation: u8,
    ) -> bool {
        match self.find_by_name(name) {
            Some(id) => self.set_state_color(id, state, brightness, hue, saturation),
            None => false,
        }
    }

    /// Fixe l'état complet, température de couleur comprise
    pub fn set_state_color_temp(
        &mut self,
        id: usize,
        state: bool,
        brightness: u8,
        hue: u16,
        saturation: u8,
        color_temp: u16,
    ) -> bool {
        match self.devices.get_mut(id) {
            Some(device) => {
                device.state = state;
                device.brightness = clamp_brightness(brightness);
                device.hue = hue;
                device.saturation = saturation;
                device.color_temp = color_temp;
                true
            }
            None => false,
        }
    }

    /// Variante par nom de [`Self::set_state_color_temp`]
    pub fn set_state_color_temp_by_name(
        &mut self,
        name: &str,
        state: bool,
        brightness: u8,
        hue: u16,
        saturation: u8,
        color_temp: u16,
    ) -> bool {
        match self.find_by_name(name) {
            Some(id) => self.set_state_color_temp(id, state, brightness, hue, saturation, color_temp),
            None => false,
        }
    }

    /// Accès en lecture à un device
    pub fn get(&self, id: usize) -> Option<&DeviceRecord> {
        self.devices.get(id)
    }

    /// Accès mutable pour le protocole de mutation d'état
    pub(crate) fn get_mut(&mut self, id: usize) -> Option<&mut DeviceRecord> {
        self.devices.get_mut(id)
    }

    /// Forme JSON d'un device, `{}` si l'index est hors limites
    pub fn device_json(&self, id: usize, all: bool) -> String {
        match self.devices.get(id) {
            Some(device) => {
                debug!(
                    "Sending device info for '{}', uniqueid = '{}', complete_info = {}",
                    device.name, device.unique_id, all
                );
                device.to_json(all)
            }
            None => "{}".to_string(),
        }
    }
}
