pub mod footer;
pub mod header;
pub mod utils;

pub use footer::{draw_footer, StatusMessage};
pub use header::{draw_header, HeaderContext};
pub use utils::{department_color, format_date, truncate};
