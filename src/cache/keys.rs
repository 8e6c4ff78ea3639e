// Cache key utilities.
// Builds keys for the page and item families and normalizes page numbers.

/// Default number of items per upstream page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

const PAGE_PREFIX: &str = "page:";
const ITEM_PREFIX: &str = "item:";

/// Zero-based page index for a requested page number.
/// Pages at or below zero collapse onto page 0, page `p > 0` maps to `p - 1`.
pub fn normalize_page(page: i64) -> u64 {
    if page > 0 { (page - 1) as u64 } else { 0 }
}

/// Upstream offset for a requested page number.
pub fn page_offset(page: i64, page_size: u32) -> u64 {
    normalize_page(page).saturating_mul(u64::from(page_size))
}

/// Key holding the ordered id list of a page.
pub fn page_key(page: i64) -> String {
    format!("{}{}", PAGE_PREFIX, normalize_page(page))
}

/// Key holding a single serialized item.
pub fn item_key(id: u64) -> String {
    format!("{}{}", ITEM_PREFIX, id)
}
