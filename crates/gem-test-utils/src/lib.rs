//! Helpers for end-to-end tests of the `gem` binary.

pub mod sandbox;

pub use insta::assert_snapshot;

/// A small catalog shared by the CLI tests.
pub const SAMPLE_CATALOG: &str = "\
stock_id,cut,carat,clarity,cut_quality,lab,total_sales_price,color
R1,Round,1.00,VS1,Excellent,GIA,5000.00,E
R2,Round,1.10,VS1,Excellent,GIA,5500.50,D
R3,Round,1.20,VS1,Excellent,GIA,6000.00,E
O1,Oval,0.90,VS2,Very Good,IGI,3000.00,G
O2,Oval,1.50,VS2,Very Good,IGI,4500.00,E
P1,Pear,2.00,SI1,Good,GIA,7000.00,G
";

/// Insta filters for values that change on every run.
const VOLATILE_FILTERS: &[(&str, &str)] = &[
    (
        r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}",
        "[ORDER_ID]",
    ),
    (r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z", "[TIMESTAMP]"),
];

/// Current insta settings with order ids and timestamps redacted.
pub fn volatile_settings() -> insta::Settings {
    let mut settings = insta::Settings::clone_current();
    for &(re, rep) in VOLATILE_FILTERS {
        settings.add_filter(re, rep);
    }
    settings
}
