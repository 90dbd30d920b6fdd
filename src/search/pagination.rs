//! Page arithmetic for the 10-results-per-page window.

/// Results per page; fixed by the Custom Search API.
pub const PAGE_SIZE: u32 = 10;

/// 1-based API `start` offset of the first result on `page`.
///
/// Page 0 is treated as page 1. Computed in `u64` so every `u32` page fits.
pub fn start_offset(page: u32) -> u64 {
    (u64::from(page.max(1)) - 1) * u64::from(PAGE_SIZE) + 1
}

/// Last page implied by `total` results. Zero results means zero pages.
pub fn last_page(total: u64) -> u64 {
    total.div_ceil(u64::from(PAGE_SIZE))
}

/// Whether a "next" control should be enabled.
pub fn has_next(page: u32, total: u64) -> bool {
    u64::from(page) * u64::from(PAGE_SIZE) < total
}

/// Whether a "previous" control should be enabled.
pub fn has_previous(page: u32) -> bool {
    page != 1
}

/// Label shown between the pagination controls, e.g. `Sida 2 av 5`.
pub fn page_label(page: u32, total: u64) -> String {
    format!("Sida {} av {}", page, last_page(total))
}
