//! Callbacks d'actionnement
//!
//! Le pont ne pilote aucun matériel : après chaque mutation d'état
//! réussie, il notifie la couche d'actionnement via des callbacks
//! enregistrés une fois à l'initialisation. Trois formes coexistent,
//! chacune indépendamment optionnelle, invoquées dans un ordre fixe :
//! état/luminosité, puis état/couleur, puis état/couleur/température.

use crate::registry::DeviceRecord;

/// Callback état + luminosité
pub type StateCallback = Box<dyn Fn(usize, &str, bool, u8) + Send + Sync>;

/// Callback état + luminosité + teinte + saturation
pub type ColorCallback = Box<dyn Fn(usize, &str, bool, u8, u16, u8) + Send + Sync>;

/// Callback état + luminosité + teinte + saturation + température
pub type ColorTempCallback = Box<dyn Fn(usize, &str, bool, u8, u16, u8, u16) + Send + Sync>;

/// Jeu de callbacks enregistrés auprès du pont
#[derive(Default)]
pub struct CallbackSet {
    pub(crate) on_state: Option<StateCallback>,
    pub(crate) on_state_color: Option<ColorCallback>,
    pub(crate) on_state_color_temp: Option<ColorTempCallback>,
}

impl CallbackSet {
    /// Notifie la couche d'actionnement après une mutation
    ///
    /// Chaque callback enregistré reçoit l'index du device et son
    /// enregistrement post-mutation complet, dans l'ordre documenté.
    pub(crate) fn notify(&self, id: usize, device: &DeviceRecord) {
        if let Some(cb) = &self.on_state {
            cb(id, &device.name, device.state, device.brightness);
        }
        if let Some(cb) = &self.on_state_color {
            cb(
                id,
                &device.name,
                device.state,
                device.brightness,
                device.hue,
                device.saturation,
            );
        }
        if let Some(cb) = &self.on_state_color_temp {
            cb(
                id,
                &device.name,
                device.state,
                device.brightness,
                device.hue,
                device.saturation,
                device.color_temp,
            );
        }
    }
}

impl std::fmt::Debug for CallbackSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackSet")
            .field("on_state", &self.on_state.is_some())
            .field("on_state_color", &self.on_state_color.is_some())
            .field("on_state_color_temp", &self.on_state_color_temp.is_some())
            .finish()
    }
}
