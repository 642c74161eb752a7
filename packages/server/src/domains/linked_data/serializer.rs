use anyhow::{anyhow, Result};
use serde_json::Value as JsonValue;

/// Wire formats a dereferenceable page can be served as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Html,
    Turtle,
    JsonLd,
}

/// First-match negotiation over the Accept header. Quality values are
/// not parsed; HTML wins over Turtle wins over JSON-LD, and anything
/// else (including `*/*` and an absent header) gets JSON-LD.
pub fn negotiate(accept: &str) -> Format {
    if accept.contains("text/html") {
        Format::Html
    } else if accept.contains("text/turtle") {
        Format::Turtle
    } else {
        Format::JsonLd
    }
}

/// Renders a JSON-LD document into one wire format
pub trait LinkedDataSerializer: Send + Sync {
    fn content_type(&self) -> &'static str;
    fn render(&self, payload: &JsonValue) -> Result<String>;
}

pub fn serializer_for(format: Format) -> &'static dyn LinkedDataSerializer {
    match format {
        Format::Html => &HtmlSerializer,
        Format::Turtle => &TurtleSerializer,
        Format::JsonLd => &JsonLdSerializer,
    }
}

pub struct JsonLdSerializer;

impl LinkedDataSerializer for JsonLdSerializer {
    fn content_type(&self) -> &'static str {
        "application/ld+json; charset=utf-8"
    }

    fn render(&self, payload: &JsonValue) -> Result<String> {
        Ok(serde_json::to_string(payload)?)
    }
}

// =============================================================================
// Turtle
// =============================================================================

pub struct TurtleSerializer;

impl LinkedDataSerializer for TurtleSerializer {
    fn content_type(&self) -> &'static str {
        "text/turtle; charset=utf-8"
    }

    /// Simplified RDF serialization of a schema.org document: one
    /// subject, sorted predicates, nested objects reduced to their @id.
    fn render(&self, payload: &JsonValue) -> Result<String> {
        let doc = payload
            .as_object()
            .ok_or_else(|| anyhow!("document must be a JSON object"))?;
        let subject = doc
            .get("@id")
            .or_else(|| doc.get("id"))
            .and_then(JsonValue::as_str)
            .ok_or_else(|| anyhow!("document has no @id"))?;

        let mut out = String::new();
        out.push_str("@prefix schema: <https://schema.org/> .\n");
        out.push_str("@prefix sel: <https://sharedevents.org/ns#> .\n");
        out.push_str("@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .\n\n");
        out.push_str(&format!("<{subject}>\n"));

        let mut lines = Vec::new();
        if let Some(type_name) = extract_type(payload) {
            lines.push(format!("a schema:{type_name}"));
        }

        let mut keys: Vec<&String> = doc
            .keys()
            .filter(|k| !matches!(k.as_str(), "@context" | "@id" | "id" | "@type" | "type"))
            .collect();
        keys.sort();

        for key in keys {
            if let Some(triple) = serialize_property(key, &doc[key.as_str()]) {
                lines.push(triple);
            }
        }

        if lines.is_empty() {
            return Err(anyhow!("document has no serializable properties"));
        }
        out.push_str("    ");
        out.push_str(&lines.join(" ;\n    "));
        out.push_str(" .\n");
        Ok(out)
    }
}

pub fn extract_type(payload: &JsonValue) -> Option<&str> {
    for key in ["@type", "type"] {
        match payload.get(key) {
            Some(JsonValue::String(s)) => return Some(s),
            Some(JsonValue::Array(arr)) => {
                if let Some(first) = arr.first().and_then(JsonValue::as_str) {
                    return Some(first);
                }
            }
            _ => {}
        }
    }
    None
}

fn serialize_property(prop: &str, value: &JsonValue) -> Option<String> {
    // sel:-prefixed keys keep their namespace; everything else is schema.org
    let predicate = if let Some(local) = prop.strip_prefix("sel:") {
        format!("sel:{local}")
    } else {
        format!("schema:{prop}")
    };

    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => {
            if s.starts_with("http://") || s.starts_with("https://") {
                Some(format!("{predicate} <{s}>"))
            } else {
                Some(format!("{predicate} \"{}\"", escape_literal(s)))
            }
        }
        JsonValue::Number(n) => Some(format!("{predicate} {n}")),
        JsonValue::Bool(b) => Some(format!("{predicate} {b}")),
        JsonValue::Object(obj) => {
            if let Some(id) = obj
                .get("@id")
                .or_else(|| obj.get("id"))
                .and_then(JsonValue::as_str)
            {
                Some(format!("{predicate} <{id}>"))
            } else {
                let nested = serde_json::to_string(value).ok()?;
                Some(format!("{predicate} \"{}\"", escape_literal(&nested)))
            }
        }
        // arrays reduce to their first element
        JsonValue::Array(items) => items.first().and_then(|v| serialize_property(prop, v)),
    }
}

fn escape_literal(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

// =============================================================================
// HTML
// =============================================================================

pub struct HtmlSerializer;

impl LinkedDataSerializer for HtmlSerializer {
    fn content_type(&self) -> &'static str {
        "text/html; charset=utf-8"
    }

    /// Human-readable page with the full JSON-LD document embedded in a
    /// script tag for machine consumers that parse HTML.
    fn render(&self, payload: &JsonValue) -> Result<String> {
        let entity_type = extract_type(payload).unwrap_or("Event");
        let name = payload
            .get("name")
            .and_then(JsonValue::as_str)
            .unwrap_or("Unnamed");
        let embedded = serde_json::to_string_pretty(payload)?;

        let mut fields = String::new();
        push_field(&mut fields, "Description", text_field(payload, "description"));
        push_field(&mut fields, "Starts", text_field(payload, "startDate"));
        push_field(&mut fields, "Ends", text_field(payload, "endDate"));
        push_field(&mut fields, "Website", text_field(payload, "url"));
        push_field(&mut fields, "Location", nested_id(payload, "location"));
        push_field(&mut fields, "Organizer", nested_id(payload, "organizer"));

        Ok(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title} - Shared Events Library</title>
  <style>
    body {{ font-family: system-ui, -apple-system, sans-serif; max-width: 800px; margin: 2rem auto; padding: 0 1rem; line-height: 1.6; }}
    h1 {{ color: #333; margin-bottom: 0.5rem; }}
    .type {{ color: #666; font-size: 0.9rem; text-transform: uppercase; letter-spacing: 0.05em; }}
    .field {{ margin-bottom: 1rem; }}
    .label {{ font-weight: 600; color: #555; }}
    footer {{ margin-top: 3rem; padding-top: 2rem; border-top: 1px solid #ddd; color: #666; font-size: 0.9rem; }}
  </style>
  <script type="application/ld+json">
{jsonld}
  </script>
</head>
<body>
  <p class="type">{entity_type}</p>
  <h1>{title}</h1>
  <div class="content">
{fields}  </div>
  <footer>Served by a Shared Events Library node.</footer>
</body>
</html>
"#,
            title = escape_html(name),
            entity_type = entity_type,
            jsonld = embedded,
            fields = fields,
        ))
    }
}

fn text_field(payload: &JsonValue, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(JsonValue::as_str)
        .map(str::to_string)
}

fn nested_id(payload: &JsonValue, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(|v| v.get("@id"))
        .and_then(JsonValue::as_str)
        .map(str::to_string)
}

fn push_field(out: &mut String, label: &str, value: Option<String>) {
    if let Some(value) = value {
        out.push_str(&format!(
            "    <div class=\"field\"><span class=\"label\">{label}:</span> {}</div>\n",
            escape_html(&value)
        ));
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_doc() -> JsonValue {
        json!({
            "@context": "https://schema.org",
            "@type": "Event",
            "@id": "https://sel.example.org/events/01ARZ3NDEKTSV4RRFFQ69G5FAV",
            "name": "Open \"Mic\" Night",
            "startDate": "2026-03-01T19:00:00Z",
            "location": { "@type": "Place", "@id": "https://sel.example.org/places/01BX5ZZKBKACTAV9WEVGEMMVRZ" }
        })
    }

    #[test]
    fn negotiation_prefers_html_then_turtle() {
        assert_eq!(negotiate("text/html,application/xhtml+xml"), Format::Html);
        assert_eq!(negotiate("text/turtle"), Format::Turtle);
        assert_eq!(negotiate("application/ld+json"), Format::JsonLd);
        assert_eq!(negotiate("*/*"), Format::JsonLd);
        assert_eq!(negotiate(""), Format::JsonLd);
        // first-match: html wins even at lower quality
        assert_eq!(negotiate("text/html;q=0.1, text/turtle;q=0.9"), Format::Html);
    }

    #[test]
    fn turtle_renders_subject_type_and_nested_ids() {
        let out = TurtleSerializer.render(&sample_doc()).unwrap();
        assert!(out.starts_with("@prefix schema: <https://schema.org/> .\n"));
        assert!(out.contains("<https://sel.example.org/events/01ARZ3NDEKTSV4RRFFQ69G5FAV>\n"));
        assert!(out.contains("a schema:Event"));
        assert!(out
            .contains("schema:location <https://sel.example.org/places/01BX5ZZKBKACTAV9WEVGEMMVRZ>"));
        assert!(out.contains("schema:name \"Open \\\"Mic\\\" Night\""));
        assert!(out.trim_end().ends_with('.'));
    }

    #[test]
    fn turtle_keeps_sel_namespace() {
        let doc = json!({
            "@id": "https://sel.example.org/events/01ARZ3NDEKTSV4RRFFQ69G5FAV",
            "@type": "Event",
            "sel:tombstone": true
        });
        let out = TurtleSerializer.render(&doc).unwrap();
        assert!(out.contains("sel:tombstone true"));
    }

    #[test]
    fn turtle_requires_an_id() {
        assert!(TurtleSerializer.render(&json!({ "name": "x" })).is_err());
    }

    #[test]
    fn html_embeds_jsonld_and_escapes_text() {
        let out = HtmlSerializer.render(&sample_doc()).unwrap();
        assert!(out.contains("<script type=\"application/ld+json\">"));
        assert!(out.contains("Open &quot;Mic&quot; Night"));
        assert!(out.contains("<p class=\"type\">Event</p>"));
    }
}
