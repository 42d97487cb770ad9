//! Named-entity fallback for fields the pattern rules miss.

use tracing::debug;

use crate::models::record::FieldName;

use super::patterns::{DATE_LOOSE, DATE_MONTH_NAME, MONEY_ENTITY, ORG_NAME};

/// Entity types the extractor knows how to map onto invoice fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Org,
    Money,
    Date,
}

/// A recognized entity span.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub kind: EntityKind,
    pub text: String,
}

/// Capability contract for entity recognizers. Implementations may wrap
/// a real NLP model; the built-in recognizer works from surface shape
/// alone.
pub trait EntityRecognizer: Send + Sync {
    fn name(&self) -> &str;

    /// Recognize entities in document order per kind.
    fn recognize(&self, text: &str) -> Vec<Entity>;
}

/// Static mapping from entity types to invoice fields.
pub fn field_for(kind: EntityKind) -> FieldName {
    match kind {
        EntityKind::Org => FieldName::Supplier,
        EntityKind::Money => FieldName::Total,
        EntityKind::Date => FieldName::InvoiceDate,
    }
}

/// Shape-based recognizer: legal-suffix organization names, currency
/// amounts, date tokens.
pub struct LexiconRecognizer;

impl EntityRecognizer for LexiconRecognizer {
    fn name(&self) -> &str {
        "lexicon"
    }

    fn recognize(&self, text: &str) -> Vec<Entity> {
        let mut entities = Vec::new();

        for caps in ORG_NAME.captures_iter(text) {
            entities.push(Entity {
                kind: EntityKind::Org,
                text: caps[1].trim().to_string(),
            });
        }

        for caps in MONEY_ENTITY.captures_iter(text) {
            if let Some(m) = caps.get(1).or_else(|| caps.get(2)) {
                entities.push(Entity {
                    kind: EntityKind::Money,
                    text: m.as_str().trim().to_string(),
                });
            }
        }

        for m in DATE_LOOSE
            .find_iter(text)
            .chain(DATE_MONTH_NAME.find_iter(text))
        {
            entities.push(Entity {
                kind: EntityKind::Date,
                text: m.as_str().to_string(),
            });
        }

        debug!("lexicon recognizer found {} entities", entities.len());
        entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognize_org() {
        let entities = LexiconRecognizer.recognize("Acme Widgets Ltd.\nsome body text\n");
        assert!(entities
            .iter()
            .any(|e| e.kind == EntityKind::Org && e.text == "Acme Widgets Ltd."));
    }

    #[test]
    fn test_recognize_money_and_date() {
        let entities = LexiconRecognizer.recognize("Paid $1,234.56 on 2024-03-01");
        assert!(entities
            .iter()
            .any(|e| e.kind == EntityKind::Money && e.text == "1,234.56"));
        assert!(entities
            .iter()
            .any(|e| e.kind == EntityKind::Date && e.text == "2024-03-01"));
    }

    #[test]
    fn test_entity_field_mapping() {
        assert_eq!(field_for(EntityKind::Org), FieldName::Supplier);
        assert_eq!(field_for(EntityKind::Money), FieldName::Total);
        assert_eq!(field_for(EntityKind::Date), FieldName::InvoiceDate);
    }
}
