// src/specs/menu.rs
//! Reading the menu page's elements.
//!
//! - Rows in the item table are either section headers (marked by a row class)
//!   or item rows holding one or more item links.
//! - An item link's id comes from `data-itemid`, else from the digits in its
//!   `onclick` handler. No id means the item can only be opened by interaction.
//! - Labels (sections, meal periods, tabs) are whitespace-normalized and lose any
//!   trailing item count.

use crate::browser::ElementHandle;
use crate::core::sanitize::{first_digit_run, normalize_ws, strip_count_suffix};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemLink {
    pub handle: ElementHandle,
    pub name: String,
    pub item_id: Option<u64>,
}

/// Visible label with count suffix removed. Empty when nothing is left.
pub fn clean_label(raw: &str) -> String {
    normalize_ws(&strip_count_suffix(&normalize_ws(raw)))
}

pub fn item_id(handle: &ElementHandle) -> Option<u64> {
    if let Some(id) = handle.attr("data-itemid").and_then(|v| v.trim().parse::<u64>().ok()) {
        return Some(id);
    }
    handle.attr("onclick").and_then(first_digit_run).and_then(|d| d.parse::<u64>().ok())
}

pub fn item_link(handle: ElementHandle) -> Option<ItemLink> {
    let name = normalize_ws(&handle.text);
    if name.is_empty() { return None; }
    let item_id = item_id(&handle);
    Some(ItemLink { handle, name, item_id })
}

/// `Some(label)` when `row` is a section header row.
pub fn section_label(row: &ElementHandle, section_row_class: &str) -> Option<String> {
    row.has_class(section_row_class).then(|| clean_label(&row.text))
}
