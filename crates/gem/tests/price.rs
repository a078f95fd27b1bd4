#![cfg(not(target_os = "windows"))]

use gem_test_utils::sandbox::Sandbox;
use gem_test_utils::{assert_snapshot, volatile_settings, SAMPLE_CATALOG};

/// sha256("s3cret")
const GEM_TOML: &str = r#"
[[managers]]
username = "ops"
password_sha256 = "1ec1c26b50d5d3c58d9583181af8076655fe00756bf7285940ba3670f99fcba0"
"#;

fn sandbox(password: &str) -> Sandbox {
    let mut sb = Sandbox::new();
    sb.write("diamonds.csv", SAMPLE_CATALOG)
        .write("gem.toml", GEM_TOML)
        .env("GEM_MANAGER_PASSWORD", password);
    sb
}

#[test]
fn test_price_adjust_rewrites_catalog_and_logs() {
    let sb = sandbox("s3cret");
    let output = sb
        .run(
            "gem",
            [
                "price", "adjust", "--percent", "10", "--reason", "market", "--username", "ops",
                "--yes",
            ],
        )
        .unwrap();
    assert!(output.contains("6 stones repriced by 10%"));

    assert_snapshot!(sb.read("diamonds.csv"), @r"
    stock_id,cut,carat,clarity,cut_quality,lab,total_sales_price,color
    R1,Round,1.00,VS1,Excellent,GIA,5500.00,E
    R2,Round,1.10,VS1,Excellent,GIA,6050.55,D
    R3,Round,1.20,VS1,Excellent,GIA,6600.00,E
    O1,Oval,0.90,VS2,Very Good,IGI,3300.00,G
    O2,Oval,1.50,VS2,Very Good,IGI,4950.00,E
    P1,Pear,2.00,SI1,Good,GIA,7700.00,G
    ");
    volatile_settings().bind(|| {
        assert_snapshot!(sb.read("adjustment_log.txt"), @"[TIMESTAMP] | Adjustment: 10% | Reason: market | Operator: ops");
    });
}

#[test]
fn test_price_adjust_negative_percent() {
    let sb = sandbox("s3cret");
    sb.run(
        "gem",
        [
            "price", "adjust", "--percent", "-12.5", "--reason", "clearance", "-u", "ops", "-y",
        ],
    )
    .unwrap();
    assert!(sb
        .read("diamonds.csv")
        .contains("O1,Oval,0.90,VS2,Very Good,IGI,2625.00,G"));
}

#[test]
fn test_wrong_password_leaves_catalog_untouched() {
    let sb = sandbox("guess");
    let output = sb.snapshot_run(
        "gem",
        [
            "price", "adjust", "--percent", "10", "--reason", "market", "--username", "ops",
            "--yes",
        ],
    );
    assert_snapshot!(output, @r"
    Exit Code: 1
    --- STDOUT ---
    --- STDERR ---
    Error: authentication failed for 'ops'
    ");
    assert_eq!(sb.read("diamonds.csv"), SAMPLE_CATALOG);
    assert!(!sb.exists("adjustment_log.txt"));
}

#[test]
fn test_adjustment_that_zeroes_prices_is_rejected() {
    let sb = sandbox("s3cret");
    let output = sb.snapshot_run(
        "gem",
        [
            "price", "adjust", "--percent", "-100", "--reason", "free", "--username", "ops",
            "--yes",
        ],
    );
    assert!(output.contains("would make prices non-positive"));
    assert_eq!(sb.read("diamonds.csv"), SAMPLE_CATALOG);
}

#[test]
fn test_unanswered_confirmation_writes_nothing() {
    let sb = sandbox("s3cret");
    // stdin is closed, so the confirmation prompt cannot be answered
    let output = sb.snapshot_run(
        "gem",
        [
            "price", "adjust", "--percent", "10", "--reason", "market", "--username", "ops",
        ],
    );
    assert!(output.starts_with("Exit Code: 1"), "{output}");
    assert!(
        output.contains("Error: Failed to read confirmation")
            || output.contains("Error: Price adjustment cancelled"),
        "{output}"
    );
    assert_eq!(sb.read("diamonds.csv"), SAMPLE_CATALOG);
    assert!(!sb.exists("adjustment_log.txt"));
}
