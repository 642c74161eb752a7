use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value as JsonValue};

use crate::domains::events::Event;
use crate::domains::organizations::Organization;
use crate::domains::places::Place;

/// A publicly dereferenceable entity, tagged by kind so serializers can
/// branch without downcasting.
#[derive(Debug, Clone)]
pub enum LinkedDataResource {
    Event(Event),
    Place(Place),
    Organization(Organization),
}

impl LinkedDataResource {
    pub fn entity_type(&self) -> &'static str {
        match self {
            Self::Event(_) => "Event",
            Self::Place(_) => "Place",
            Self::Organization(_) => "Organization",
        }
    }

    pub fn ulid(&self) -> &str {
        match self {
            Self::Event(e) => &e.ulid,
            Self::Place(p) => &p.ulid,
            Self::Organization(o) => &o.ulid,
        }
    }

    pub fn is_deleted(&self) -> bool {
        match self {
            Self::Event(e) => e.is_deleted(),
            Self::Place(p) => p.is_deleted(),
            Self::Organization(o) => o.is_deleted(),
        }
    }

    /// Build the schema.org JSON-LD document this resource dereferences
    /// to. Absent optional fields are omitted rather than nulled.
    pub fn to_json_ld(&self, base_url: &str) -> JsonValue {
        match self {
            Self::Event(event) => event_json_ld(event, base_url),
            Self::Place(place) => place_json_ld(place, base_url),
            Self::Organization(org) => organization_json_ld(org, base_url),
        }
    }
}

pub fn event_uri(base_url: &str, ulid: &str) -> String {
    format!("{base_url}/events/{ulid}")
}

pub fn place_uri(base_url: &str, ulid: &str) -> String {
    format!("{base_url}/places/{ulid}")
}

pub fn organization_uri(base_url: &str, ulid: &str) -> String {
    format!("{base_url}/organizations/{ulid}")
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn event_json_ld(event: &Event, base_url: &str) -> JsonValue {
    let mut doc = Map::new();
    doc.insert("@context".into(), json!("https://schema.org"));
    doc.insert("@type".into(), json!("Event"));
    doc.insert("@id".into(), json!(event_uri(base_url, &event.ulid)));
    doc.insert("name".into(), json!(event.name));
    if let Some(description) = &event.description {
        doc.insert("description".into(), json!(description));
    }
    if let Some(url) = &event.url {
        doc.insert("url".into(), json!(url));
    }
    if let Some(image) = &event.image_url {
        doc.insert("image".into(), json!(image));
    }
    if let Some(start) = event.start_time {
        doc.insert("startDate".into(), json!(rfc3339(start)));
    }
    if let Some(end) = event.end_time {
        doc.insert("endDate".into(), json!(rfc3339(end)));
    }
    if let Some(venue) = &event.venue_ulid {
        doc.insert(
            "location".into(),
            json!({ "@type": "Place", "@id": place_uri(base_url, venue) }),
        );
    }
    if let Some(organizer) = &event.organizer_ulid {
        doc.insert(
            "organizer".into(),
            json!({ "@type": "Organization", "@id": organization_uri(base_url, organizer) }),
        );
    }
    JsonValue::Object(doc)
}

fn place_json_ld(place: &Place, base_url: &str) -> JsonValue {
    let mut doc = Map::new();
    doc.insert("@context".into(), json!("https://schema.org"));
    doc.insert("@type".into(), json!("Place"));
    doc.insert("@id".into(), json!(place_uri(base_url, &place.ulid)));
    doc.insert("name".into(), json!(place.name));

    let mut address = Map::new();
    address.insert("@type".into(), json!("PostalAddress"));
    if let Some(street) = &place.street_address {
        address.insert("streetAddress".into(), json!(street));
    }
    if let Some(city) = &place.city {
        address.insert("addressLocality".into(), json!(city));
    }
    if let Some(region) = &place.region {
        address.insert("addressRegion".into(), json!(region));
    }
    if let Some(postal) = &place.postal_code {
        address.insert("postalCode".into(), json!(postal));
    }
    if let Some(country) = &place.country {
        address.insert("addressCountry".into(), json!(country));
    }
    if address.len() > 1 {
        doc.insert("address".into(), JsonValue::Object(address));
    }

    if let (Some(lat), Some(lon)) = (place.latitude, place.longitude) {
        doc.insert(
            "geo".into(),
            json!({ "@type": "GeoCoordinates", "latitude": lat, "longitude": lon }),
        );
    }
    JsonValue::Object(doc)
}

fn organization_json_ld(org: &Organization, base_url: &str) -> JsonValue {
    let mut doc = Map::new();
    doc.insert("@context".into(), json!("https://schema.org"));
    doc.insert("@type".into(), json!("Organization"));
    doc.insert("@id".into(), json!(organization_uri(base_url, &org.ulid)));
    doc.insert("name".into(), json!(org.name));
    if let Some(description) = &org.description {
        doc.insert("description".into(), json!(description));
    }
    if let Some(url) = &org.url {
        doc.insert("url".into(), json!(url));
    }
    JsonValue::Object(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_event() -> Event {
        Event {
            ulid: "01ARZ3NDEKTSV4RRFFQ69G5FAV".to_string(),
            name: "Open Mic Night".to_string(),
            description: Some("Monthly open mic".to_string()),
            url: None,
            image_url: None,
            start_time: Some(Utc.with_ymd_and_hms(2026, 3, 1, 19, 0, 0).unwrap()),
            end_time: None,
            venue_ulid: Some("01BX5ZZKBKACTAV9WEVGEMMVRZ".to_string()),
            organizer_ulid: None,
            lifecycle_state: "published".to_string(),
            merged_into: None,
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn event_document_links_its_venue() {
        let doc = LinkedDataResource::Event(sample_event()).to_json_ld("https://sel.example.org");
        assert_eq!(
            doc["@id"],
            json!("https://sel.example.org/events/01ARZ3NDEKTSV4RRFFQ69G5FAV")
        );
        assert_eq!(doc["startDate"], json!("2026-03-01T19:00:00Z"));
        assert_eq!(
            doc["location"]["@id"],
            json!("https://sel.example.org/places/01BX5ZZKBKACTAV9WEVGEMMVRZ")
        );
        assert!(doc.get("endDate").is_none());
        assert!(doc.get("organizer").is_none());
    }
}
