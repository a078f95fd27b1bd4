//! Fixtures shared by unit tests.

use std::path::PathBuf;

use tempfile::TempDir;

pub(crate) const SAMPLE_CATALOG: &str = "\
stock_id,cut,carat,clarity,cut_quality,lab,total_sales_price,color
R1,Round,1.00,VS1,Excellent,GIA,5000.00,E
R2,Round,1.10,VS1,Excellent,GIA,5500.50,D
R3,Round,1.20,VS1,Excellent,GIA,6000.00,E
O1,Oval,0.90,VS2,Very Good,IGI,3000.00,G
O2,Oval,1.50,VS2,Very Good,IGI,4500.00,E
P1,Pear,2.00,SI1,Good,GIA,7000.00,G
";

/// Write `contents` as diamonds.csv in a fresh temp dir.
pub(crate) fn write_catalog(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("diamonds.csv");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}
