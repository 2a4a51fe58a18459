//! Layout: units, line wrapping, measurement and pagination

mod engine;
mod line_wrap;
mod measure;
mod pagination;
pub mod units;

pub use engine::LayoutState;
pub use line_wrap::{line_index_of, pack_lines, pack_widths, remaining_width, section_width, Line};
pub use measure::{Debouncer, HeightCache};
pub use pagination::{compute_pages, page_of, paginate, Page};
pub use units::{mm_to_px, BoxSize, LayoutConfig, PageGeometry};
