//! Vendor product-catalog restructuring.
//!
//! Input is the generic markup tree produced by [`crate::conversion::markup::xml_to_value`]. A
//! generic tree cannot tell a single child from a list of one, so every child lookup here goes
//! through [`ensure_array`] before any field is read.

use serde::Serialize;
use serde_json::Value;

/// Top-level output document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogDocument {
    pub yandex_market_catalog: VendorCatalog,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorCatalog {
    pub shop_info: ShopInfo,
    pub currencies: Vec<Currency>,
    pub categories: Vec<Category>,
    pub offers: Vec<Offer>,
    pub statistics: CatalogStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShopInfo {
    pub name: String,
    pub company: String,
    pub url: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Currency {
    pub id: String,
    pub rate: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Offer {
    pub id: String,
    pub available: String,
    pub name: String,
    pub url: String,
    pub price: String,
    #[serde(rename = "currencyId")]
    pub currency_id: String,
    #[serde(rename = "categoryId")]
    pub category_id: String,
    pub vendor: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldprice: Option<String>,
    #[serde(rename = "vendorCode", skip_serializing_if = "Option::is_none")]
    pub vendor_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pictures: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<OfferParameter>>,
}

impl Offer {
    pub fn is_available(&self) -> bool {
        self.available == "true"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferParameter {
    pub name: String,
    pub value: String,
    pub unit: Option<String>,
}

/// Counts derived from the transformed lists; source-provided totals are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogStatistics {
    pub total_categories: usize,
    pub total_offers: usize,
    pub available_offers: usize,
    pub unavailable_offers: usize,
}

impl CatalogStatistics {
    pub fn compute(categories: &[Category], offers: &[Offer]) -> Self {
        Self {
            total_categories: categories.len(),
            total_offers: offers.len(),
            available_offers: offers.iter().filter(|o| o.is_available()).count(),
            unavailable_offers: offers.iter().filter(|o| o.available == "false").count(),
        }
    }
}

impl VendorCatalog {
    /// Warning text when the offer count exceeds `threshold`.
    pub fn size_warning(&self, threshold: usize) -> Option<String> {
        (self.offers.len() > threshold).then(|| format!("Large catalog: {} offers", self.offers.len()))
    }
}

/// Normalize a singular-or-repeated child into a list.
pub fn ensure_array(value: Option<&Value>) -> Vec<&Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(other) => vec![other],
    }
}

/// Whether `doc` has the catalog root with a shop element.
pub fn is_vendor_catalog(doc: &Value) -> bool {
    doc.get("yml_catalog")
        .and_then(|c| c.get("shop"))
        .is_some_and(|s| !s.is_null())
}

/// Restructure a catalog tree. Returns `None` when `doc` is not a catalog.
pub fn transform_catalog(doc: &Value) -> Option<CatalogDocument> {
    let catalog = doc.get("yml_catalog")?;
    let shop = ensure_array(catalog.get("shop")).into_iter().next()?;

    let shop_info = ShopInfo {
        name: child_text(shop, "name").unwrap_or_else(|| "Unknown Shop".to_string()),
        company: child_text(shop, "company").unwrap_or_default(),
        url: child_text(shop, "url").unwrap_or_default(),
        date: attr(catalog, "date")
            .or_else(|| child_text(catalog, "date"))
            .unwrap_or_default(),
    };

    let currencies = grandchildren(shop, "currencies", "currency")
        .into_iter()
        .map(|c| Currency {
            id: attr_or_child(c, "id").unwrap_or_default(),
            rate: attr_or_child(c, "rate").unwrap_or_else(|| "1".to_string()),
        })
        .collect();

    let categories: Vec<Category> = grandchildren(shop, "categories", "category")
        .into_iter()
        .map(|c| Category {
            id: attr_or_child(c, "id").unwrap_or_default(),
            name: text(c).unwrap_or_default(),
            parent_id: attr_or_child(c, "parentId"),
        })
        .collect();

    let offers: Vec<Offer> = grandchildren(shop, "offers", "offer")
        .into_iter()
        .map(offer_from_node)
        .collect();

    let statistics = CatalogStatistics::compute(&categories, &offers);
    Some(CatalogDocument {
        yandex_market_catalog: VendorCatalog {
            shop_info,
            currencies,
            categories,
            offers,
            statistics,
        },
    })
}

fn offer_from_node(node: &Value) -> Offer {
    let field = |name: &str| child_text(node, name).unwrap_or_default();

    let pictures = node.get("picture").map(|p| {
        ensure_array(Some(p))
            .into_iter()
            .map(|pic| text(pic).unwrap_or_default())
            .collect()
    });
    let parameters = node.get("param").map(|p| {
        ensure_array(Some(p))
            .into_iter()
            .map(|param| OfferParameter {
                name: attr_or_child(param, "name").unwrap_or_default(),
                value: text(param).unwrap_or_default(),
                unit: attr_or_child(param, "unit"),
            })
            .collect()
    });

    Offer {
        id: attr_or_child(node, "id").unwrap_or_default(),
        available: attr_or_child(node, "available").unwrap_or_else(|| "true".to_string()),
        name: field("name"),
        url: field("url"),
        price: field("price"),
        currency_id: field("currencyId"),
        category_id: field("categoryId"),
        vendor: field("vendor"),
        description: field("description"),
        oldprice: child_text(node, "oldprice"),
        vendor_code: child_text(node, "vendorCode"),
        barcode: child_text(node, "barcode"),
        sales_notes: child_text(node, "sales_notes"),
        delivery: child_text(node, "delivery"),
        pickup: child_text(node, "pickup"),
        pictures,
        parameters,
    }
}

/// `parent/<container>[0]/<item>*`
fn grandchildren<'a>(parent: &'a Value, container: &str, item: &str) -> Vec<&'a Value> {
    ensure_array(parent.get(container))
        .into_iter()
        .next()
        .map(|c| ensure_array(c.get(item)))
        .unwrap_or_default()
}

/// Character data of a node: the node itself when it is a bare string, otherwise its `_` member.
fn text(node: &Value) -> Option<String> {
    match node {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(m) => m.get("_").and_then(text),
        _ => None,
    }
}

fn attr(node: &Value, name: &str) -> Option<String> {
    node.get("$").and_then(|a| a.get(name)).and_then(text)
}

fn child_text(node: &Value, name: &str) -> Option<String> {
    ensure_array(node.get(name))
        .into_iter()
        .next()
        .and_then(text)
        .filter(|s| !s.is_empty())
}

fn attr_or_child(node: &Value, name: &str) -> Option<String> {
    attr(node, name).or_else(|| child_text(node, name))
}
