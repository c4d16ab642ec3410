//! Small helpers shared across modules.

pub mod dates;
pub mod encoding;

pub use dates::{default_stats_date, excel_serial_to_date, parse_date_text, today_in};
pub use encoding::{decode_text, DecodedText};
