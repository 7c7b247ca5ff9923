//! Protocole de mutation d'état des devices
//!
//! Le corps des requêtes de contrôle n'est pas parsé comme du JSON : le
//! handler scanne un petit jeu de jetons littéraux, dans un ordre et
//! avec des précédences figés, calibrés sur les payloads réellement
//! émis par les contrôleurs. `false` gagne sur `true`, les marqueurs de
//! mode entre guillemets sont testés indépendamment de la valeur `ct`
//! numérique, et chaque champ reconnu est appliqué séparément.

use super::router::{RouterOutcome, device_id_in_url};
use super::{HttpResponse, parse_leading_uint, slice_from};
use crate::identity::BridgeIdentity;
use crate::registry::{ColorMode, DeviceRecord, DeviceRegistry, clamp_brightness};
use tracing::debug;

/// Handler de contrôle : handshake `devicetype` ou mutation d'état
///
/// Le handshake répond immédiatement sans toucher au registre. Une
/// mutation valide produit un [`RouterOutcome::ControlAck`] : l'ack est
/// émis par l'appelant avant que le corps ne soit interprété par
/// [`apply_state_body`].
pub(crate) fn control(identity: &BridgeIdentity, url: &str, body: &str) -> RouterOutcome {
    // Sonde d'authentification des clients de pont réels : un jeton de
    // session suffit, aucun mot de passe n'existe
    if body.contains("devicetype") {
        debug!("Handling devicetype request");
        return RouterOutcome::Response(HttpResponse::json(format!(
            "[{{\"success\":{{\"username\": \"{}\"}}}}]",
            identity.pseudo_username()
        )));
    }

    if url.contains("state") && !body.is_empty() {
        let Some(wire_id) = device_id_in_url(url) else {
            return RouterOutcome::Unhandled;
        };
        if wire_id == 0 {
            return RouterOutcome::Unhandled;
        }

        debug!("Handling state request for device {}", wire_id);
        let device_index = (wire_id - 1) as usize;

        // Réponse rapide pour devancer le timeout du contrôleur ;
        // le registre n'est pas consulté avant que l'ack ne parte
        let response = HttpResponse::json(format!(
            "[{{\"success\":{{\"/lights/{}/state/\": true}}}}]",
            device_index + 1
        ));

        return RouterOutcome::ControlAck {
            response,
            device_index,
            body: body.to_string(),
        };
    }

    RouterOutcome::Unhandled
}

/// Applique les champs du corps de contrôle à un device
///
/// Les champs reconnus sont appliqués indépendamment, dans cet ordre :
/// marqueur de mode, on/off, `bri`, `hue`+`sat`, `ct`. Fixer hue/sat
/// remet la température à zéro et réciproquement.
///
/// # Returns
///
/// L'enregistrement post-mutation (pour les callbacks), ou `None` si
/// l'index est hors limites, auquel cas rien n'est modifié.
pub(crate) fn apply_state_body(
    registry: &mut DeviceRegistry,
    id: usize,
    body: &str,
) -> Option<DeviceRecord> {
    let device = registry.get_mut(id)?;

    // Marqueur de mode : xy prioritaire, ct sinon, hue/sat par défaut
    if body.contains("\"xy\"") {
        device.color_mode = ColorMode::Xy;
    } else if body.contains("\"ct\"") {
        device.color_mode = ColorMode::ColorTemp;
    } else {
        device.color_mode = ColorMode::HueSat;
    }

    // false gagne si les deux littéraux apparaissent
    if body.contains("false") {
        device.state = false;
    } else if body.contains("true") {
        device.state = true;
    }

    // Luminosité : force l'état selon que la valeur est nulle ou non
    if let Some(pos) = body.find("bri") {
        let value = parse_leading_uint(slice_from(body, pos + 5)).min(255);
        device.state = value > 0;
        device.brightness = clamp_brightness(value as u8);
    }

    // Teinte et saturation : la teinte s'arrête à la virgule, la
    // saturation se cherche après elle
    if let Some(pos) = body.find("hue") {
        device.state = true;
        let comma = body[pos..].find(',').map_or(body.len(), |o| pos + o);

        let hue_text = body.get(pos + 5..comma).unwrap_or("");
        device.hue = parse_leading_uint(hue_text).min(u16::MAX as u32) as u16;

        let sat = body[comma..]
            .find("sat")
            .map_or(0, |o| parse_leading_uint(slice_from(body, comma + o + 5)));
        device.saturation = sat.min(255) as u8;

        // repasser en couleur annule la température
        device.color_temp = 0;
    }

    // Température de couleur : annule la teinte et la saturation
    if let Some(pos) = body.find("ct") {
        device.state = true;
        device.color_temp = parse_leading_uint(slice_from(body, pos + 4)).min(u16::MAX as u32) as u16;
        device.hue = 0;
        device.saturation = 0;
    }

    Some(device.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn identity() -> BridgeIdentity {
        BridgeIdentity::from_parts(
            Ipv4Addr::new(192, 168, 1, 42),
            "B8:27:EB:12:34:56".to_string(),
        )
    }

    fn registry_with_one() -> DeviceRegistry {
        let mut registry = DeviceRegistry::new(identity());
        registry.add("lampe");
        registry
    }

    #[test]
    fn test_devicetype_handshake() {
        let RouterOutcome::Response(response) =
            control(&identity(), "/api", "{\"devicetype\":\"test#probe\"}")
        else {
            panic!("expected an immediate response");
        };

        let expected = format!(
            "[{{\"success\":{{\"username\": \"{}\"}}}}]",
            identity().pseudo_username()
        );
        assert_eq!(response.body, expected);
    }

    #[test]
    fn test_state_request_acks_before_apply() {
        let outcome = control(
            &identity(),
            "/api/x/lights/1/state",
            "{\"on\":true,\"bri\":100}",
        );

        let RouterOutcome::ControlAck {
            response,
            device_index,
            body,
        } = outcome
        else {
            panic!("expected a deferred mutation");
        };

        assert_eq!(response.body, "[{\"success\":{\"/lights/1/state/\": true}}]");
        assert_eq!(device_index, 0);
        assert_eq!(body, "{\"on\":true,\"bri\":100}");
    }

    #[test]
    fn test_state_request_id_zero_declines() {
        assert!(matches!(
            control(&identity(), "/api/x/lights/0/state", "{\"on\":true}"),
            RouterOutcome::Unhandled
        ));
    }

    #[test]
    fn test_state_request_empty_body_declines() {
        assert!(matches!(
            control(&identity(), "/api/x/lights/1/state", ""),
            RouterOutcome::Unhandled
        ));
    }

    #[test]
    fn test_apply_on_and_brightness() {
        let mut registry = registry_with_one();
        let record = apply_state_body(&mut registry, 0, "{\"on\":true,\"bri\":100}").unwrap();

        assert!(record.state);
        assert_eq!(record.brightness, 100);
        assert_eq!(record.color_mode, ColorMode::HueSat);
    }

    #[test]
    fn test_apply_brightness_255_normalized() {
        let mut registry = registry_with_one();
        let record = apply_state_body(&mut registry, 0, "{\"bri\":255}").unwrap();
        assert_eq!(record.brightness, 254);
    }

    #[test]
    fn test_apply_brightness_zero_forces_off() {
        let mut registry = registry_with_one();
        let record = apply_state_body(&mut registry, 0, "{\"on\":true,\"bri\":0}").unwrap();
        assert!(!record.state);
        assert_eq!(record.brightness, 0);
    }

    #[test]
    fn test_apply_false_wins_over_true() {
        let mut registry = registry_with_one();
        let record = apply_state_body(&mut registry, 0, "{\"on\":true,\"note\":false}").unwrap();
        assert!(!record.state);
    }

    #[test]
    fn test_apply_hue_sat_resets_color_temp() {
        let mut registry = registry_with_one();
        let record =
            apply_state_body(&mut registry, 0, "{\"on\":true,\"hue\":40000,\"sat\":200}").unwrap();

        assert!(record.state);
        assert_eq!(record.hue, 40000);
        assert_eq!(record.saturation, 200);
        assert_eq!(record.color_temp, 0);
        assert_eq!(record.color_mode, ColorMode::HueSat);
    }

    #[test]
    fn test_apply_ct_resets_hue_sat() {
        let mut registry = registry_with_one();
        apply_state_body(&mut registry, 0, "{\"hue\":40000,\"sat\":200}").unwrap();
        let record = apply_state_body(&mut registry, 0, "{\"ct\":366}").unwrap();

        assert!(record.state);
        assert_eq!(record.color_temp, 366);
        assert_eq!(record.hue, 0);
        assert_eq!(record.saturation, 0);
        assert_eq!(record.color_mode, ColorMode::ColorTemp);
    }

    #[test]
    fn test_apply_xy_marker_sets_mode_only() {
        let mut registry = registry_with_one();
        let record =
            apply_state_body(&mut registry, 0, "{\"xy\":[0.32,0.41],\"on\":true}").unwrap();

        // les valeurs numériques xy ne sont pas décodées
        assert_eq!(record.color_mode, ColorMode::Xy);
        assert!(record.state);
    }

    #[test]
    fn test_apply_out_of_range_is_none() {
        let mut registry = registry_with_one();
        assert!(apply_state_body(&mut registry, 5, "{\"on\":true}").is_none());
    }
}
