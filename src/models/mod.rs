/// Printful wire types.
///
/// Payloads are a tolerant subset of what the upstream returns: fields the
/// proxy never reads are simply not modeled, and optional upstream fields
/// default instead of failing the decode.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Printful wraps every response in `{code, result}`. A `code` other than
/// 200 is an application-level failure even when the transport status was
/// 200.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    pub result: T,
}

/// Lightweight catalog product summary, as returned by the full listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    #[serde(default)]
    pub main_category_id: i64,
    #[serde(default, rename = "type")]
    pub product_type: String,
    #[serde(default)]
    pub type_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub variant_count: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: i64,
    #[serde(default)]
    pub product_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub color_code: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub in_stock: bool,
}

/// Full product detail: the product plus every variant it offers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub product: Product,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

/// Full variant detail: the variant plus its parent product summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantInfo {
    pub variant: Variant,
    pub product: Product,
}

/// Print-area definition shared by one or more variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Printfile {
    pub printfile_id: i64,
    pub width: i64,
    pub height: i64,
    #[serde(default)]
    pub dpi: i64,
    #[serde(default)]
    pub fill_mode: String,
}

/// Placement name -> printfile id, for one variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantPrintfile {
    pub variant_id: i64,
    #[serde(default)]
    pub placements: HashMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintfileInfo {
    #[serde(default)]
    pub product_id: i64,
    #[serde(default)]
    pub available_placements: HashMap<String, String>,
    #[serde(default)]
    pub printfiles: Vec<Printfile>,
    #[serde(default)]
    pub variant_printfiles: Vec<VariantPrintfile>,
}

impl PrintfileInfo {
    /// Printfile used by `variant_id` at `placement`, if any.
    pub fn printfile_for(&self, variant_id: i64, placement: &str) -> Option<&Printfile> {
        let mapping = self
            .variant_printfiles
            .iter()
            .find(|v| v.variant_id == variant_id)?;
        let printfile_id = *mapping.placements.get(placement)?;
        self.printfiles.iter().find(|p| p.printfile_id == printfile_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub states: Option<Vec<State>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingRate {
    pub id: String,
    pub name: String,
    pub rate: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub min_delivery_days: Option<i64>,
    #[serde(default)]
    pub max_delivery_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxInfo {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub shipping_taxable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub address1: String,
    #[serde(default)]
    pub city: String,
    pub country_code: String,
    #[serde(default)]
    pub state_code: String,
    #[serde(default)]
    pub zip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingItem {
    pub variant_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingRatesRequest {
    pub recipient: Address,
    pub items: Vec<ShippingItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRateRequest {
    pub recipient: Address,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncProduct {
    pub id: i64,
    #[serde(default)]
    pub external_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub variants: i64,
    #[serde(default)]
    pub synced: i64,
    #[serde(default)]
    pub thumbnail_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncFile {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub preview_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncVariant {
    pub id: i64,
    #[serde(default)]
    pub external_id: String,
    #[serde(default)]
    pub sync_product_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub variant_id: i64,
    #[serde(default)]
    pub retail_price: String,
    #[serde(default)]
    pub files: Vec<SyncFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncProductInfo {
    pub sync_product: SyncProduct,
    #[serde(default)]
    pub sync_variants: Vec<SyncVariant>,
}

/// Sync-product creation with already-hosted artwork. Image resizing and
/// hosting happen outside this layer; only the resulting URLs travel here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSyncProductRequest {
    pub name: String,
    #[serde(default)]
    pub thumbnail: String,
    pub variants: Vec<CreateSyncVariant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSyncVariant {
    pub variant_id: i64,
    #[serde(default)]
    pub external_id: String,
    #[serde(default)]
    pub retail_price: String,
    pub file_url: String,
}
