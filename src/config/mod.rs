//! Layout registry: which columns hold what, per product, section and extract.
//!
//! Layouts are declarative YAML. A built-in registry covering the known product
//! lines is embedded in the binary; `LayoutRegistry::from_path` loads a
//! replacement from disk. Every column map is checked for duplicate letters
//! when the registry is built, so reconcilers never need to.

mod column;

pub use column::Column;

use crate::error::{HotsheetError, HotsheetResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

const BUILTIN_LAYOUTS: &str = include_str!("layouts.yaml");

//==============================================================================
// Extract conventions
//==============================================================================

/// Where the numeric values sit relative to the row carrying the SKU.
///
/// Written in YAML as `{ fixed: 2 }` or
/// `{ probe: { column: K, at: 2, if_empty: 1, otherwise: 2 } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawValueOffset", into = "RawValueOffset")]
pub enum ValueOffset {
    /// Values are always `n` rows below the SKU row.
    Fixed(u32),
    /// Read `column` at `sku_row + at`; blank selects `if_empty`, otherwise `otherwise`.
    Probe(OffsetProbe),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetProbe {
    pub column: Column,
    pub at: u32,
    pub if_empty: u32,
    pub otherwise: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawValueOffset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fixed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    probe: Option<OffsetProbe>,
}

impl TryFrom<RawValueOffset> for ValueOffset {
    type Error = String;

    fn try_from(raw: RawValueOffset) -> Result<Self, Self::Error> {
        match (raw.fixed, raw.probe) {
            (Some(0), None) => Err("value_offset.fixed must be at least 1".to_string()),
            (Some(n), None) => Ok(ValueOffset::Fixed(n)),
            (None, Some(probe)) => {
                if probe.if_empty == 0 || probe.otherwise == 0 {
                    Err("value_offset.probe offsets must be at least 1".to_string())
                } else {
                    Ok(ValueOffset::Probe(probe))
                }
            }
            _ => Err("value_offset needs exactly one of `fixed` or `probe`".to_string()),
        }
    }
}

impl From<ValueOffset> for RawValueOffset {
    fn from(offset: ValueOffset) -> Self {
        match offset {
            ValueOffset::Fixed(n) => RawValueOffset {
                fixed: Some(n),
                probe: None,
            },
            ValueOffset::Probe(probe) => RawValueOffset {
                fixed: None,
                probe: Some(probe),
            },
        }
    }
}

/// Which entry survives when an extract lists the same SKU twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    #[default]
    LastWins,
    FirstWins,
}

fn default_sheet() -> String {
    "Sheet1".to_string()
}

/// Inventory extract: SKU row, then on-hand/PO/SO/BO/YTD figures below it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryExtract {
    #[serde(default = "default_sheet")]
    pub sheet: String,
    pub sku: Column,
    pub value_offset: ValueOffset,
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
    pub on_hand: Column,
    pub on_po: Column,
    pub on_so: Column,
    pub on_bo: Column,
    pub ytd_sold: Column,
    pub ytd_issued: Column,
}

/// BN overlay extract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BnExtract {
    #[serde(default = "default_sheet")]
    pub sheet: String,
    pub sku: Column,
    pub value_offset: ValueOffset,
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
    pub ytd_sold: Column,
}

/// Purchase-order extract: SKU row followed by one row per open PO line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrderExtract {
    #[serde(default = "default_sheet")]
    pub sheet: String,
    /// Holds the SKU on the header row and the PO number on each line row.
    pub sku: Column,
    pub status: Column,
    pub on_po: Column,
    pub backorder: Column,
    pub slot_offsets: [u32; 3],
    pub back_order_status: String,
    /// Lines 2 and 3 are real PO lines only when the number starts with this.
    pub po_number_prefix: String,
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
}

/// Legacy stock extract, matched by substring with a forward pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockExtract {
    #[serde(default = "default_sheet")]
    pub sheet: String,
    pub sku: Column,
    pub value_offset: ValueOffset,
    pub on_hand: Column,
    pub on_po: Column,
    pub on_so: Column,
    pub on_bo: Column,
    /// SKU cells that are header artifacts and never match.
    #[serde(default)]
    pub skip_skus: Vec<String>,
}

/// A cell at a fixed row offset from the SKU row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetCell {
    pub column: Column,
    pub offset: u32,
}

/// Legacy sales extract, matched exactly with a forward pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesExtract {
    #[serde(default = "default_sheet")]
    pub sheet: String,
    pub sku: Column,
    pub kit: OffsetCell,
    pub kit_flag: String,
    pub ytd: OffsetCell,
    pub kit_multiplier: i64,
    /// Kit SKUs starting with one of these are already counted per unit.
    pub kit_exempt_prefixes: Vec<String>,
}

impl SalesExtract {
    pub fn is_kit_exempt(&self, sku: &str) -> bool {
        let sku = sku.trim();
        self.kit_exempt_prefixes
            .iter()
            .any(|prefix| sku.starts_with(prefix.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractLayouts {
    pub inventory: InventoryExtract,
    pub bn: BnExtract,
    pub purchase_orders: PurchaseOrderExtract,
    pub stock: StockExtract,
    pub sales: SalesExtract,
}

//==============================================================================
// Hotsheet column maps
//==============================================================================

/// Hotsheet columns for one PO slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoSlotColumns {
    pub number: Column,
    pub quantity: Column,
}

/// Hotsheet columns written by the inventory and PO reconcilers.
///
/// Only the SKU, on-hand, on-PO total and SO+BO columns are required. YTD is
/// written either combined (`ytd_sold_issued`), split (`ytd_sold` and
/// `ytd_issued`), or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    pub sku: Column,
    pub on_hand: Column,
    /// Up to three PO slots; a section without slots runs no PO pass.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub po_slots: Vec<PoSlotColumns>,
    pub on_po_total: Column,
    pub on_so_bo: Column,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ytd_sold_issued: Option<Column>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ytd_sold: Option<Column>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ytd_issued: Option<Column>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_monthly: Option<Column>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bn_ytd_sold: Option<Column>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bn_average_monthly: Option<Column>,
}

pub const MAX_PO_SLOTS: usize = 3;

const SLOT_NAMES: [[&str; 2]; MAX_PO_SLOTS] = [
    ["po_slots[0].number", "po_slots[0].quantity"],
    ["po_slots[1].number", "po_slots[1].quantity"],
    ["po_slots[2].number", "po_slots[2].quantity"],
];

impl ColumnMap {
    fn named_columns(&self) -> Vec<(&'static str, Column)> {
        let mut cols = vec![("sku", self.sku), ("on_hand", self.on_hand)];
        for (slot, [number, quantity]) in self.po_slots.iter().zip(SLOT_NAMES) {
            cols.push((number, slot.number));
            cols.push((quantity, slot.quantity));
        }
        cols.push(("on_po_total", self.on_po_total));
        cols.push(("on_so_bo", self.on_so_bo));
        let optional = [
            ("ytd_sold_issued", self.ytd_sold_issued),
            ("ytd_sold", self.ytd_sold),
            ("ytd_issued", self.ytd_issued),
            ("average_monthly", self.average_monthly),
            ("bn_ytd_sold", self.bn_ytd_sold),
            ("bn_average_monthly", self.bn_average_monthly),
        ];
        cols.extend(
            optional
                .into_iter()
                .filter_map(|(name, col)| col.map(|col| (name, col))),
        );
        cols
    }

    pub fn has_po_slots(&self) -> bool {
        !self.po_slots.is_empty()
    }

    /// BN columns, only when both are mapped.
    pub fn bn_columns(&self) -> Option<(Column, Column)> {
        self.bn_ytd_sold.zip(self.bn_average_monthly)
    }

    /// Split YTD columns, only when both are mapped.
    pub fn split_ytd_columns(&self) -> Option<(Column, Column)> {
        self.ytd_sold.zip(self.ytd_issued)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockColumns {
    pub sku: Column,
    pub on_hand: Column,
    pub on_po: Column,
    pub on_so_bo: Column,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesColumns {
    pub sku: Column,
    pub ytd: Column,
}

fn default_first_row() -> u32 {
    2
}

/// One worksheet of a hotsheet workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionLayout {
    /// Worksheet name, exactly as it appears in the workbook.
    pub sheet: String,
    /// Short name used for selection and log file names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default = "default_first_row")]
    pub first_data_row: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<ColumnMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<StockColumns>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales: Option<SalesColumns>,
}

impl SectionLayout {
    pub fn slug(&self) -> String {
        match &self.slug {
            Some(slug) => slug.clone(),
            None => self
                .sheet
                .trim()
                .to_lowercase()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join("_"),
        }
    }

    pub fn matches(&self, selection: &str) -> bool {
        let selection = selection.trim();
        self.slug().eq_ignore_ascii_case(selection) || self.sheet.eq_ignore_ascii_case(selection)
    }

    /// Names of the reconcilers that apply to this section, in run order.
    pub fn reconcilers(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if let Some(map) = &self.inventory {
            names.push("inventory");
            if map.has_po_slots() {
                names.push("purchase-orders");
            }
        }
        if self.stock.is_some() {
            names.push("stock");
        }
        if self.sales.is_some() {
            names.push("sales");
        }
        names
    }

    fn validate(&self, product: &str) -> HotsheetResult<()> {
        let context = |what: &str| format!("{} / {} ({})", product, self.sheet, what);

        if self.first_data_row == 0 {
            return Err(HotsheetError::Config(format!(
                "{}: first_data_row must be at least 1",
                context("section")
            )));
        }
        if self.inventory.is_none() && self.stock.is_none() && self.sales.is_none() {
            return Err(HotsheetError::Config(format!(
                "{}: section declares no column maps",
                context("section")
            )));
        }
        if let Some(map) = &self.inventory {
            if map.bn_ytd_sold.is_some() != map.bn_average_monthly.is_some() {
                return Err(HotsheetError::Config(format!(
                    "{}: bn_ytd_sold and bn_average_monthly must be mapped together",
                    context("inventory")
                )));
            }
            if map.ytd_sold.is_some() != map.ytd_issued.is_some() {
                return Err(HotsheetError::Config(format!(
                    "{}: ytd_sold and ytd_issued must be mapped together",
                    context("inventory")
                )));
            }
            if map.po_slots.len() > MAX_PO_SLOTS {
                return Err(HotsheetError::Config(format!(
                    "{}: at most {} PO slots, found {}",
                    context("inventory"),
                    MAX_PO_SLOTS,
                    map.po_slots.len()
                )));
            }
            ensure_unique(&context("inventory"), &map.named_columns())?;
        }
        if let Some(map) = &self.stock {
            ensure_unique(
                &context("stock"),
                &[
                    ("sku", map.sku),
                    ("on_hand", map.on_hand),
                    ("on_po", map.on_po),
                    ("on_so_bo", map.on_so_bo),
                ],
            )?;
        }
        if let Some(map) = &self.sales {
            ensure_unique(&context("sales"), &[("sku", map.sku), ("ytd", map.ytd)])?;
        }
        Ok(())
    }
}

fn ensure_unique(context: &str, columns: &[(&'static str, Column)]) -> HotsheetResult<()> {
    let mut seen: HashSet<Column> = HashSet::new();
    for (name, col) in columns {
        if !seen.insert(*col) {
            return Err(HotsheetError::Config(format!(
                "{}: column {} is used more than once (again by {})",
                context, col, name
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductLayout {
    pub sections: Vec<SectionLayout>,
}

impl ProductLayout {
    /// Sections picked by `selection`: `"all"` (or empty) means every section.
    pub fn select(&self, product: &str, selection: &str) -> HotsheetResult<Vec<&SectionLayout>> {
        if is_all(selection) {
            return Ok(self.sections.iter().collect());
        }
        let picked: Vec<&SectionLayout> =
            self.sections.iter().filter(|s| s.matches(selection)).collect();
        if picked.is_empty() {
            return Err(HotsheetError::UnknownSection {
                product: product.to_string(),
                section: selection.to_string(),
            });
        }
        Ok(picked)
    }
}

pub fn is_all(selection: &str) -> bool {
    let selection = selection.trim();
    selection.is_empty() || selection.eq_ignore_ascii_case("all")
}

//==============================================================================
// Registry
//==============================================================================

/// All extract conventions and product layouts for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRegistry {
    pub extracts: ExtractLayouts,
    pub products: BTreeMap<String, ProductLayout>,
}

impl LayoutRegistry {
    /// The registry compiled into the binary.
    pub fn builtin() -> HotsheetResult<Self> {
        Self::from_yaml(BUILTIN_LAYOUTS)
    }

    pub fn from_path(path: &Path) -> HotsheetResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> HotsheetResult<Self> {
        let registry: LayoutRegistry = serde_yaml::from_str(content)?;
        registry.validate()?;
        Ok(registry)
    }

    /// Look a product up by name, ignoring case.
    pub fn product(&self, name: &str) -> HotsheetResult<(&str, &ProductLayout)> {
        self.products
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name.trim()))
            .map(|(key, layout)| (key.as_str(), layout))
            .ok_or_else(|| HotsheetError::UnknownProduct(name.to_string()))
    }

    fn validate(&self) -> HotsheetResult<()> {
        if self.products.is_empty() {
            return Err(HotsheetError::Config("no products declared".to_string()));
        }
        let po = &self.extracts.purchase_orders;
        if po.slot_offsets.contains(&0) {
            return Err(HotsheetError::Config(
                "purchase_orders.slot_offsets must all be at least 1".to_string(),
            ));
        }
        if self.extracts.sales.kit_multiplier == 0 {
            return Err(HotsheetError::Config(
                "sales.kit_multiplier must not be zero".to_string(),
            ));
        }
        for (name, product) in &self.products {
            if product.sections.is_empty() {
                return Err(HotsheetError::Config(format!(
                    "product {} declares no sections",
                    name
                )));
            }
            let mut slugs = HashSet::new();
            for section in &product.sections {
                section.validate(name)?;
                if !slugs.insert(section.slug()) {
                    return Err(HotsheetError::Config(format!(
                        "product {} has two sections with slug '{}'",
                        name,
                        section.slug()
                    )));
                }
            }
        }
        Ok(())
    }
}
