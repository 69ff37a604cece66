pub mod filter_summary;
pub mod status_bar;
