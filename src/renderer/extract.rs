//! CSS extraction of search records from rendered HTML

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::warn;

use super::Record;
use crate::providers::{FieldType, SearchField, SearchSchema};

/// Run `schema` over `html`.
///
/// One record per `base_selector` match; fields whose selector matches nothing
/// are left out and records without any field are skipped. A page matching one
/// of the schema's error selectors yields no records.
#[must_use]
pub fn extract_records(html: &str, schema: &SearchSchema) -> Vec<Record> {
    let document = Html::parse_document(html);

    for raw in &schema.error_selectors {
        if let Ok(selector) = Selector::parse(raw)
            && document.select(&selector).next().is_some()
        {
            warn!("Page matched error selector '{}', treating as empty", raw);
            return Vec::new();
        }
    }

    let Ok(base) = Selector::parse(&schema.base_selector) else {
        warn!("Invalid base selector '{}'", schema.base_selector);
        return Vec::new();
    };

    let fields: Vec<(&SearchField, Selector)> = schema
        .fields
        .iter()
        .filter_map(|field| match Selector::parse(&field.selector) {
            Ok(selector) => Some((field, selector)),
            Err(e) => {
                warn!("Skipping field '{}' with invalid selector: {}", field.name, e);
                None
            }
        })
        .collect();

    document
        .select(&base)
        .filter_map(|element| {
            let mut record = Record::new();
            for (field, selector) in &fields {
                if let Some(value) = element.select(selector).next().and_then(|t| field_value(t, field)) {
                    record.insert(field.name.clone(), Value::String(value));
                }
            }
            (!record.is_empty()).then_some(record)
        })
        .collect()
}

fn field_value(element: ElementRef<'_>, field: &SearchField) -> Option<String> {
    match field.field_type {
        FieldType::Text => {
            let text = element.text().collect::<Vec<_>>().join(" ");
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            (!text.is_empty()).then_some(text)
        }
        FieldType::Attribute => {
            let name = field.attribute.as_deref()?;
            element.value().attr(name).map(str::to_string)
        }
        FieldType::Html => Some(element.inner_html()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <ol id="results">
            <li class="result">
              <h2><a href="https://a.example/1">First   <b>hit</b></a></h2>
              <p class="snippet">Alpha snippet</p>
            </li>
            <li class="result">
              <h2><a href="https://b.example/2">Second hit</a></h2>
            </li>
            <li class="result"><span>ad slot</span></li>
          </ol>
        </body></html>
    "#;

    fn schema() -> SearchSchema {
        SearchSchema {
            base_selector: "li.result".to_string(),
            fields: vec![
                SearchField {
                    name: "title".to_string(),
                    selector: "h2 a".to_string(),
                    field_type: FieldType::Text,
                    attribute: None,
                },
                SearchField {
                    name: "url".to_string(),
                    selector: "h2 a".to_string(),
                    field_type: FieldType::Attribute,
                    attribute: Some("href".to_string()),
                },
                SearchField {
                    name: "summary".to_string(),
                    selector: "p.snippet".to_string(),
                    field_type: FieldType::Html,
                    attribute: None,
                },
            ],
            error_selectors: vec!["#captcha".to_string()],
        }
    }

    #[test]
    fn test_extract_records() {
        let records = extract_records(PAGE, &schema());
        assert_eq!(records.len(), 2);

        assert_eq!(records[0]["title"], "First hit");
        assert_eq!(records[0]["url"], "https://a.example/1");
        assert_eq!(records[0]["summary"], "Alpha snippet");

        assert_eq!(records[1]["title"], "Second hit");
        assert!(!records[1].contains_key("summary"));
    }

    #[test]
    fn test_error_selector_short_circuits() {
        let blocked = r#"<div id="captcha">verify you are human</div><li class="result"><h2><a href="x">t</a></h2></li>"#;
        assert!(extract_records(blocked, &schema()).is_empty());
    }
}
