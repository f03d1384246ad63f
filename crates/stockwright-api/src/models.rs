//! Wire models shared by the gateway, the store and the views.
//!
//! Field names follow the persistence service's camelCase JSON. Money and
//! quantities are [`Decimal`] and travel as JSON numbers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Raw materials
// ---------------------------------------------------------------------------

/// A stocked raw material.
///
/// `id == 0` means "not yet persisted"; the service assigns the real id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMaterial {
    #[serde(default)]
    pub id: i64,
    pub code: String,
    pub name: String,
    pub stock_quantity: Decimal,
}

impl RawMaterial {
    /// Whether the service has assigned this material an id.
    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }
}

/// Body for creating or updating a raw material. The id is never sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMaterialInput {
    pub code: String,
    pub name: String,
    pub stock_quantity: Decimal,
}

impl From<&RawMaterial> for RawMaterialInput {
    fn from(m: &RawMaterial) -> Self {
        Self {
            code: m.code.clone(),
            name: m.name.clone(),
            stock_quantity: m.stock_quantity,
        }
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// One edge of a product's bill of materials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductComposition {
    /// Edge id assigned by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub raw_material_id: i64,
    /// Display cache resolved server-side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_material_name: Option<String>,
    /// Quantity of the material needed for one unit of the product.
    pub quantity: Decimal,
}

/// A manufactured product together with its composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: i64,
    pub code: String,
    pub name: String,
    pub value: Decimal,
    #[serde(rename = "rawMaterials", default)]
    pub composition: Vec<ProductComposition>,
}

impl Product {
    /// Look up the composition edge for a raw material, if present.
    pub fn composition_entry(&self, raw_material_id: i64) -> Option<&ProductComposition> {
        self.composition
            .iter()
            .find(|c| c.raw_material_id == raw_material_id)
    }

    /// Whether the product's composition already lists `raw_material_id`.
    pub fn uses_material(&self, raw_material_id: i64) -> bool {
        self.composition_entry(raw_material_id).is_some()
    }
}

/// Base fields sent when creating or updating a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub code: String,
    pub name: String,
    pub value: Decimal,
}

/// Body of the attach/update (upsert) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachRequest {
    pub raw_material_id: i64,
    pub quantity: Decimal,
}

// ---------------------------------------------------------------------------
// Production planning
// ---------------------------------------------------------------------------

/// One line of the production suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionItem {
    pub product_code: String,
    pub product_name: String,
    pub quantity: i64,
    pub subtotal: Decimal,
}

/// The planning service's suggested production run. Opaque to this workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionSuggestion {
    #[serde(default)]
    pub items: Vec<SuggestionItem>,
    pub total_value: Decimal,
}

impl ProductionSuggestion {
    /// True when the service found nothing producible with current stock.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_reads_composition_from_raw_materials_key() {
        let json = r#"{
            "id": 7,
            "code": "P1",
            "name": "Chair",
            "value": 50.0,
            "rawMaterials": [
                {"id": 3, "rawMaterialId": 1, "rawMaterialName": "Wood", "quantity": 2}
            ]
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, 7);
        assert_eq!(product.value, Decimal::from(50));
        assert_eq!(product.composition.len(), 1);
        let edge = product.composition_entry(1).unwrap();
        assert_eq!(edge.raw_material_name.as_deref(), Some("Wood"));
        assert_eq!(edge.quantity, Decimal::from(2));
        assert!(!product.uses_material(2));
    }

    #[test]
    fn product_without_composition_key_defaults_to_empty() {
        let json = r#"{"id": 1, "code": "P", "name": "N", "value": 1}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert!(product.composition.is_empty());
    }

    #[test]
    fn raw_material_without_id_is_not_persisted() {
        let json = r#"{"code": "M1", "name": "Wood", "stockQuantity": 100}"#;
        let material: RawMaterial = serde_json::from_str(json).unwrap();
        assert_eq!(material.id, 0);
        assert!(!material.is_persisted());
    }

    #[test]
    fn attach_request_serializes_camel_case_numbers() {
        let req = AttachRequest {
            raw_material_id: 4,
            quantity: Decimal::new(25, 1),
        };
        let value = serde_json::to_value(req).unwrap();
        assert_eq!(value["rawMaterialId"], 4);
        assert_eq!(value["quantity"].as_f64(), Some(2.5));
    }

    #[test]
    fn long_decimals_keep_every_digit() {
        let json = r#"{"rawMaterialId": 1, "quantity": 12345678901234567.89}"#;
        let edge: ProductComposition = serde_json::from_str(json).unwrap();
        assert_eq!(edge.quantity, "12345678901234567.89".parse::<Decimal>().unwrap());

        let value = serde_json::to_string(&AttachRequest {
            raw_material_id: 1,
            quantity: edge.quantity,
        })
        .unwrap();
        assert!(value.contains(r#""quantity":12345678901234567.89"#), "{value}");
    }

    #[test]
    fn suggestion_emptiness() {
        let json = r#"{"items": [], "totalValue": 0}"#;
        let suggestion: ProductionSuggestion = serde_json::from_str(json).unwrap();
        assert!(suggestion.is_empty());
        assert_eq!(suggestion.total_value, Decimal::ZERO);
    }
}
