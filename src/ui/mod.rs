pub mod icons;
pub mod output;
pub mod table;

pub use icons::Icons;
pub use output::{dim, error, header, info, success, summary_row, warn};
pub use table::{TableBuilder, customers_table, stats_table, suppliers_table};
