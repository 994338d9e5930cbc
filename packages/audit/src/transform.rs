//! Raw provider payloads → canonical business fields.
//!
//! Dispatch is a tagged union over the source type. Each extractor maps the
//! provider's field names onto the canonical shape; anything unknown or
//! missing becomes `None`/empty. Extraction never fails — a payload of `{}`
//! transforms into an all-empty business that still carries the raw payload
//! for debugging.

use serde_json::Value;

use crate::grid::GeoPoint;
use crate::types::BusinessSource;

/// Canonical business fields produced by a transform.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalBusiness {
    pub source: BusinessSource,
    pub external_id: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub categories: Vec<String>,
    pub location: Option<GeoPoint>,
    pub status: Option<String>,
    pub hours: Option<Value>,
    pub photos: Vec<String>,
    pub rating: Option<f64>,
    /// The untouched provider payload, kept for audit/debugging.
    pub raw: Value,
}

/// A raw provider payload tagged with its source.
#[derive(Debug, Clone)]
pub enum SourcePayload {
    GooglePlaces(Value),
    ReviewSite(Value),
    Generic(Value),
}

impl SourcePayload {
    pub fn from_tag(tag: &str, payload: Value) -> Self {
        match BusinessSource::from_tag(tag) {
            BusinessSource::GooglePlaces => SourcePayload::GooglePlaces(payload),
            BusinessSource::ReviewSite => SourcePayload::ReviewSite(payload),
            BusinessSource::Generic => SourcePayload::Generic(payload),
        }
    }

    pub fn source(&self) -> BusinessSource {
        match self {
            SourcePayload::GooglePlaces(_) => BusinessSource::GooglePlaces,
            SourcePayload::ReviewSite(_) => BusinessSource::ReviewSite,
            SourcePayload::Generic(_) => BusinessSource::Generic,
        }
    }

    /// Extract canonical fields for this payload's source.
    pub fn transform(&self) -> CanonicalBusiness {
        match self {
            SourcePayload::GooglePlaces(v) => transform_google_places(v),
            SourcePayload::ReviewSite(v) => transform_review_site(v),
            SourcePayload::Generic(v) => transform_generic(v),
        }
    }
}

fn transform_google_places(v: &Value) -> CanonicalBusiness {
    let location = match (
        v.pointer("/geometry/location/lat").and_then(Value::as_f64),
        v.pointer("/geometry/location/lng").and_then(Value::as_f64),
    ) {
        (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
        _ => None,
    };

    CanonicalBusiness {
        source: BusinessSource::GooglePlaces,
        external_id: str_at(v, &["place_id"]),
        name: str_at(v, &["name"]),
        address: str_at(v, &["formatted_address", "vicinity"]),
        city: google_city(v),
        phone: str_at(v, &["formatted_phone_number", "international_phone_number"]),
        website: str_at(v, &["website"]),
        categories: string_array(v.get("types")),
        location,
        status: str_at(v, &["business_status"]),
        hours: v.get("opening_hours").cloned(),
        photos: v
            .get("photos")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|p| str_at(p, &["photo_reference"]))
                    .collect()
            })
            .unwrap_or_default(),
        rating: v.get("rating").and_then(Value::as_f64),
        raw: v.clone(),
    }
}

fn transform_review_site(v: &Value) -> CanonicalBusiness {
    let address = v
        .pointer("/location/display_address")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|s| !s.is_empty())
        .or_else(|| {
            v.pointer("/location/address1")
                .and_then(Value::as_str)
                .map(str::to_string)
        });

    let location = match (
        v.pointer("/coordinates/latitude").and_then(Value::as_f64),
        v.pointer("/coordinates/longitude").and_then(Value::as_f64),
    ) {
        (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
        _ => None,
    };

    let status = v.get("is_closed").and_then(Value::as_bool).map(|closed| {
        if closed {
            "closed".to_string()
        } else {
            "operational".to_string()
        }
    });

    CanonicalBusiness {
        source: BusinessSource::ReviewSite,
        external_id: str_at(v, &["id"]),
        name: str_at(v, &["name"]),
        address,
        city: v
            .pointer("/location/city")
            .and_then(Value::as_str)
            .map(str::to_string),
        phone: str_at(v, &["display_phone", "phone"]),
        website: v
            .pointer("/attributes/business_url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| str_at(v, &["website"])),
        categories: v
            .get("categories")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(|c| str_at(c, &["title"])).collect())
            .unwrap_or_default(),
        location,
        status,
        hours: v.get("hours").cloned(),
        photos: string_array(v.get("photos")),
        rating: v.get("rating").and_then(Value::as_f64),
        raw: v.clone(),
    }
}

/// Fallback extractor. Accepts several candidate key names per field so
/// payloads from unknown providers still map with decent coverage.
fn transform_generic(v: &Value) -> CanonicalBusiness {
    CanonicalBusiness {
        source: BusinessSource::Generic,
        external_id: str_at(v, &["id", "external_id", "place_id"]),
        name: str_at(v, &["name", "business_name", "title"]),
        address: str_at(
            v,
            &["address", "formatted_address", "full_address", "street_address"],
        ),
        city: str_at(v, &["city", "locality", "town"]),
        phone: str_at(v, &["phone", "phone_number", "telephone"]),
        website: str_at(v, &["website", "url", "site", "homepage"]),
        categories: ["categories", "types", "tags"]
            .iter()
            .find_map(|k| v.get(*k))
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|c| match c {
                        Value::String(s) => Some(s.clone()),
                        other => str_at(other, &["title", "name"]),
                    })
                    .collect()
            })
            .unwrap_or_default(),
        location: generic_location(v),
        status: str_at(v, &["status", "business_status"]),
        hours: v.get("hours").or_else(|| v.get("opening_hours")).cloned(),
        photos: v
            .get("photos")
            .or_else(|| v.get("images"))
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|p| match p {
                        Value::String(s) => Some(s.clone()),
                        other => str_at(other, &["url", "photo_reference"]),
                    })
                    .collect()
            })
            .unwrap_or_default(),
        rating: ["rating", "stars", "score"]
            .iter()
            .find_map(|k| v.get(*k))
            .and_then(Value::as_f64),
        raw: v.clone(),
    }
}

/// First non-empty string among `keys` on an object.
fn str_at(v: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| v.get(*k))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn string_array(v: Option<&Value>) -> Vec<String> {
    v.and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn google_city(v: &Value) -> Option<String> {
    let components = v.get("address_components")?.as_array()?;
    components
        .iter()
        .find(|c| {
            c.get("types")
                .and_then(Value::as_array)
                .map(|t| t.iter().any(|x| x.as_str() == Some("locality")))
                .unwrap_or(false)
        })
        .and_then(|c| str_at(c, &["long_name"]))
}

fn generic_location(v: &Value) -> Option<GeoPoint> {
    let null = Value::Null;
    let candidates = [
        v,
        v.get("location").unwrap_or(&null),
        v.get("geometry").unwrap_or(&null),
        v.get("coordinates").unwrap_or(&null),
        v.get("coords").unwrap_or(&null),
    ];

    for c in candidates {
        let lat = ["lat", "latitude"].iter().find_map(|k| c.get(*k)).and_then(Value::as_f64);
        let lng = ["lng", "lon", "longitude"]
            .iter()
            .find_map(|k| c.get(*k))
            .and_then(Value::as_f64);
        if let (Some(lat), Some(lng)) = (lat, lng) {
            return Some(GeoPoint::new(lat, lng));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn google_places_payload_maps_fully() {
        let payload = json!({
            "place_id": "ChIJabc123",
            "name": "Blue Door Pub",
            "formatted_address": "123 Main St, Saint Paul, MN 55104",
            "address_components": [
                { "long_name": "Saint Paul", "types": ["locality", "political"] }
            ],
            "formatted_phone_number": "(651) 555-0123",
            "website": "https://bluedoorpub.example",
            "types": ["restaurant", "bar"],
            "geometry": { "location": { "lat": 44.94, "lng": -93.16 } },
            "business_status": "OPERATIONAL",
            "rating": 4.5,
            "photos": [{ "photo_reference": "ref1" }, { "photo_reference": "ref2" }]
        });

        let business = SourcePayload::GooglePlaces(payload.clone()).transform();
        assert_eq!(business.external_id.as_deref(), Some("ChIJabc123"));
        assert_eq!(business.name.as_deref(), Some("Blue Door Pub"));
        assert_eq!(business.city.as_deref(), Some("Saint Paul"));
        assert_eq!(business.website.as_deref(), Some("https://bluedoorpub.example"));
        assert_eq!(business.categories, vec!["restaurant", "bar"]);
        assert_eq!(business.location, Some(GeoPoint::new(44.94, -93.16)));
        assert_eq!(business.rating, Some(4.5));
        assert_eq!(business.photos, vec!["ref1", "ref2"]);
        assert_eq!(business.raw, payload);
    }

    #[test]
    fn review_site_payload_maps() {
        let payload = json!({
            "id": "blue-door-pub-st-paul",
            "name": "Blue Door Pub",
            "location": {
                "display_address": ["123 Main St", "Saint Paul, MN 55104"],
                "city": "Saint Paul"
            },
            "coordinates": { "latitude": 44.94, "longitude": -93.16 },
            "display_phone": "(651) 555-0123",
            "categories": [{ "alias": "pubs", "title": "Pubs" }],
            "is_closed": false,
            "rating": 4.0
        });

        let business = SourcePayload::ReviewSite(payload).transform();
        assert_eq!(business.external_id.as_deref(), Some("blue-door-pub-st-paul"));
        assert_eq!(
            business.address.as_deref(),
            Some("123 Main St, Saint Paul, MN 55104")
        );
        assert_eq!(business.categories, vec!["Pubs"]);
        assert_eq!(business.status.as_deref(), Some("operational"));
        assert_eq!(business.location, Some(GeoPoint::new(44.94, -93.16)));
    }

    #[test]
    fn generic_payload_accepts_alternate_keys() {
        let payload = json!({
            "external_id": "x-1",
            "business_name": "Corner Bakery",
            "full_address": "9 Oak Ave",
            "telephone": "555-0100",
            "url": "https://cornerbakery.example",
            "tags": ["bakery", { "name": "cafe" }],
            "coords": { "latitude": 44.1, "lon": -93.5 },
            "stars": 3.8
        });

        let business = SourcePayload::Generic(payload).transform();
        assert_eq!(business.external_id.as_deref(), Some("x-1"));
        assert_eq!(business.name.as_deref(), Some("Corner Bakery"));
        assert_eq!(business.address.as_deref(), Some("9 Oak Ave"));
        assert_eq!(business.phone.as_deref(), Some("555-0100"));
        assert_eq!(business.website.as_deref(), Some("https://cornerbakery.example"));
        assert_eq!(business.categories, vec!["bakery", "cafe"]);
        assert_eq!(business.location, Some(GeoPoint::new(44.1, -93.5)));
        assert_eq!(business.rating, Some(3.8));
    }

    #[test]
    fn empty_payload_never_errors() {
        for payload in [
            SourcePayload::GooglePlaces(json!({})),
            SourcePayload::ReviewSite(json!({})),
            SourcePayload::Generic(json!({})),
        ] {
            let business = payload.transform();
            assert!(business.name.is_none());
            assert!(business.external_id.is_none());
            assert!(business.categories.is_empty());
            assert!(business.location.is_none());
        }
    }

    #[test]
    fn tag_round_trip() {
        let p = SourcePayload::from_tag("google_places", json!({}));
        assert_eq!(p.source(), BusinessSource::GooglePlaces);
        assert_eq!(p.source().as_str(), "google_places");

        let unknown = SourcePayload::from_tag("somewhere_else", json!({}));
        assert_eq!(unknown.source(), BusinessSource::Generic);
    }
}
