pub mod any_datetime;
pub mod error;
pub mod fraction;
pub mod frequency;
pub mod fused_frame;
pub mod fused_table;
pub mod location;
pub mod source_kind;
pub mod time_range;
pub mod time_series;
