//! Aiguillage des requêtes HTTP reconnues par le pont
//!
//! Trois routes seulement, testées dans l'ordre : la description UPnP,
//! le listing des devices (GET sous `/api`), et le protocole de
//! contrôle (non-GET sous `/api`). Tout le reste est décliné sans
//! qu'aucun octet ne parte sur le fil.

use super::control;
use super::request::ParsedRequest;
use super::{HttpResponse, parse_leading_uint, slice_from};
use crate::identity::BridgeIdentity;
use crate::registry::DeviceRegistry;
use tracing::debug;

/// Issue de l'aiguillage d'une requête
#[derive(Debug)]
pub enum RouterOutcome {
    /// Réponse unique à émettre telle quelle
    Response(HttpResponse),

    /// Accusé de réception à émettre AVANT d'interpréter le corps :
    /// le contrôleur expire vite, l'ack ne doit pas attendre le parse
    ControlAck {
        /// L'accusé de réception à écrire immédiatement
        response: HttpResponse,
        /// Index 0-based du device visé
        device_index: usize,
        /// Corps à interpréter après l'envoi de l'ack
        body: String,
    },

    /// Aucune route ne correspond ; l'appelant n'envoie rien
    Unhandled,
}

/// Aiguille une requête découpée vers son handler
///
/// Les requêtes sont intégralement déclinées tant que le pont est
/// administrativement désactivé.
pub fn route(
    registry: &DeviceRegistry,
    identity: &BridgeIdentity,
    http_port: u16,
    enabled: bool,
    request: &ParsedRequest<'_>,
) -> RouterOutcome {
    if !enabled {
        return RouterOutcome::Unhandled;
    }

    debug!(method = request.method, url = request.url, "TCP request");

    if request.url == "/description.xml" {
        return RouterOutcome::Response(description(identity, http_port));
    }

    if request.url.starts_with("/api") {
        if request.is_get() {
            return list(registry, request.url);
        }
        return control::control(identity, request.url, request.body);
    }

    RouterOutcome::Unhandled
}

/// Description UPnP du device racine
///
/// Gabarit figé : l'IP et le port apparaissent deux fois (URLBase et
/// friendlyName, convention UPnP), le jeton MAC sert de numéro de
/// série et clôt l'UDN.
fn description(identity: &BridgeIdentity, http_port: u16) -> HttpResponse {
    debug!("Handling /description.xml request");

    let body = format!(
        "<?xml version=\"1.0\" ?>\
         <root xmlns=\"urn:schemas-upnp-org:device-1-0\">\
         <specVersion><major>1</major><minor>0</minor></specVersion>\
         <URLBase>http://{ip}:{port}/</URLBase>\
         <device>\
         <deviceType>urn:schemas-upnp-org:device:Basic:1</deviceType>\
         <friendlyName>Philips hue ({ip}:{port})</friendlyName>\
         <manufacturer>Royal Philips Electronics</manufacturer>\
         <modelName>Philips hue bridge 2012</modelName>\
         <modelNumber>929000226503</modelNumber>\
         <serialNumber>{serial}</serialNumber>\
         <UDN>uuid:{uuid}</UDN>\
         </device>\
         </root>",
        ip = identity.ip,
        port = http_port,
        serial = identity.mac_token(),
        uuid = identity.device_uuid(),
    );

    HttpResponse::xml(body)
}

/// Extrait l'id 1-based qui suit le segment `lights` de l'URL
///
/// `None` si le segment est absent ; 0 si aucun entier ne suit
/// (listing complet demandé).
pub(super) fn device_id_in_url(url: &str) -> Option<u32> {
    let pos = url.find("lights")?;
    Some(parse_leading_uint(slice_from(url, pos + 7)))
}

/// Listing d'un device ou de tous les devices
///
/// Id nul ou absent : objet JSON de tous les devices en forme abrégée,
/// clés 1-based. Id non nul : forme complète de ce seul device, `{}`
/// s'il est hors limites.
fn list(registry: &DeviceRegistry, url: &str) -> RouterOutcome {
    let Some(wire_id) = device_id_in_url(url) else {
        return RouterOutcome::Unhandled;
    };

    let body = if wire_id == 0 {
        debug!("Sending all devices");
        let mut body = String::from("{");
        for i in 0..registry.len() {
            if i > 0 {
                body.push(',');
            }
            body.push_str(&format!("\"{}\":{}", i + 1, registry.device_json(i, false)));
        }
        body.push('}');
        body
    } else {
        debug!("Sending device {}", wire_id);
        registry.device_json((wire_id - 1) as usize, true)
    };

    RouterOutcome::Response(HttpResponse::json(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::parse_request;
    use std::net::Ipv4Addr;

    fn identity() -> BridgeIdentity {
        BridgeIdentity::from_parts(
            Ipv4Addr::new(192, 168, 1, 42),
            "B8:27:EB:12:34:56".to_string(),
        )
    }

    fn registry_with(names: &[&str]) -> DeviceRegistry {
        let mut registry = DeviceRegistry::new(identity());
        for name in names {
            registry.add(name);
        }
        registry
    }

    fn get(registry: &DeviceRegistry, url: &str) -> RouterOutcome {
        let raw = format!("GET {} HTTP/1.1\r\n\r\n", url).into_bytes();
        let request = parse_request(&raw).unwrap();
        route(registry, &identity(), 1901, true, &request)
    }

    #[test]
    fn test_description_repeats_endpoint() {
        let registry = registry_with(&[]);
        let RouterOutcome::Response(response) = get(&registry, "/description.xml") else {
            panic!("expected a response");
        };

        assert_eq!(response.mime, "text/xml");
        assert_eq!(response.body.matches("192.168.1.42:1901").count(), 2);
        assert!(response.body.contains("<serialNumber>b827eb123456</serialNumber>"));
        assert!(
            response
                .body
                .contains("<UDN>uuid:2f402f80-da50-11e1-9b23-b827eb123456</UDN>")
        );
    }

    #[test]
    fn test_list_all_short_form() {
        let registry = registry_with(&["A", "B"]);
        let RouterOutcome::Response(response) = get(&registry, "/api/x/lights") else {
            panic!("expected a response");
        };

        assert_eq!(
            response.body,
            "{\"1\":{\"name\":\"A\",\"uniqueid\":\"00:B8:27:EB:12:34:56:00:00\"},\
             \"2\":{\"name\":\"B\",\"uniqueid\":\"01:B8:27:EB:12:34:56:00:00\"}}"
        );
    }

    #[test]
    fn test_list_id_zero_is_list_all() {
        let registry = registry_with(&["A"]);
        let RouterOutcome::Response(response) = get(&registry, "/api/x/lights/0") else {
            panic!("expected a response");
        };
        assert!(response.body.starts_with("{\"1\":"));
    }

    #[test]
    fn test_list_single_device_full_form() {
        let registry = registry_with(&["A", "B"]);
        let RouterOutcome::Response(response) = get(&registry, "/api/x/lights/2") else {
            panic!("expected a response");
        };

        let json: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(json["name"], "B");
        assert_eq!(json["state"]["on"], true);
        assert_eq!(json["state"]["colormode"], "hs");
    }

    #[test]
    fn test_list_out_of_range_is_empty_object() {
        let registry = registry_with(&["A", "B"]);
        let RouterOutcome::Response(response) = get(&registry, "/api/x/lights/99") else {
            panic!("expected a response");
        };
        assert_eq!(response.body, "{}");
    }

    #[test]
    fn test_unknown_route_unhandled() {
        let registry = registry_with(&["A"]);
        assert!(matches!(
            get(&registry, "/favicon.ico"),
            RouterOutcome::Unhandled
        ));
    }

    #[test]
    fn test_disabled_bridge_declines_everything() {
        let registry = registry_with(&["A"]);
        let raw = b"GET /description.xml HTTP/1.1\r\n\r\n";
        let request = parse_request(raw).unwrap();

        assert!(matches!(
            route(&registry, &identity(), 1901, false, &request),
            RouterOutcome::Unhandled
        ));
    }

    #[test]
    fn test_non_get_api_goes_to_control() {
        let registry = registry_with(&["A"]);
        let raw = b"POST /api HTTP/1.1\r\n\r\n{\"devicetype\":\"probe#x\"}";
        let request = parse_request(raw).unwrap();

        let RouterOutcome::Response(response) =
            route(&registry, &identity(), 1901, true, &request)
        else {
            panic!("expected a devicetype response");
        };
        assert!(response.body.contains("username"));
    }
}
