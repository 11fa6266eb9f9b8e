//! Behavioral tests for the field normalizers
//!
//! Covers:
//! - Sentinel returns for missing, blank and unparseable input
//! - Legacy data-entry artifacts in prices (`!` for `1`, mixed separators)
//! - Client-name suffix stripping and technician token cleanup
//! - Mixed French/English date formats
//! - Idempotence on canonical output

use ptm_ingest::normalizer::RawValue;
use ptm_ingest::{
    clean_client_name, clean_price, clean_price_str, normalize_technician_name,
    parse_flexible_date,
};

fn price(raw: &str) -> Option<f64> {
    clean_price(Some(&RawValue::from(raw)))
}

#[test]
fn test_price_sentinels() {
    assert_eq!(clean_price(None), None);
    assert_eq!(price(""), None);
    assert_eq!(price("   "), None);
    assert_eq!(price("abc"), None);
}

#[test]
fn test_price_legacy_formats() {
    assert_eq!(price("!00$"), Some(100.0));
    assert_eq!(price("1,234.56$"), Some(1234.56));
    assert_eq!(price("1.234,56"), Some(1234.56));
    assert_eq!(price(" 100 $ "), Some(100.0));
    assert_eq!(price("85,50"), Some(85.5));
}

#[test]
fn test_price_numeric_input_passes_through() {
    assert_eq!(clean_price(Some(&RawValue::Integer(125))), Some(125.0));
    assert_eq!(clean_price(Some(&RawValue::Number(99.5))), Some(99.5));
}

#[test]
fn test_price_idempotent() {
    for raw in ["100$", "1,234.56$", "1.234,56", "!5"] {
        let once = price(raw);
        let twice = clean_price(once.map(RawValue::from).as_ref());
        assert_eq!(twice, once, "re-cleaning {:?} changed the value", raw);
        assert_eq!(clean_price_str(&once.unwrap().to_string()), once);
    }
}

#[test]
fn test_technician_names() {
    assert_eq!(
        normalize_technician_name(Some("jean-philippe")),
        Some("jeanphilippe".to_string())
    );
    assert_eq!(normalize_technician_name(None), None);
    assert_eq!(normalize_technician_name(Some("")), None);

    let once = normalize_technician_name(Some("jean-philippe"));
    assert_eq!(normalize_technician_name(once.as_deref()), once);
}

#[test]
fn test_client_names() {
    assert_eq!(
        clean_client_name(Some("Client ABC, son historique")),
        Some("Client ABC".to_string())
    );
    assert_eq!(
        clean_client_name(Some("Entreprise XYZ")),
        Some("Entreprise XYZ".to_string())
    );
    assert_eq!(clean_client_name(None), None);

    let once = clean_client_name(Some("Client ABC, Historique des visites"));
    assert_eq!(once.as_deref(), Some("Client ABC"));
    assert_eq!(clean_client_name(once.as_deref()), once);
}

#[test]
fn test_dates() {
    assert_eq!(
        parse_flexible_date(Some("15 janvier 2024"), None),
        Some("2024-01-15".to_string())
    );
    assert_eq!(
        parse_flexible_date(Some("15 janvier"), Some(2024)),
        Some("2024-01-15".to_string())
    );
    assert_eq!(
        parse_flexible_date(Some("January 15, 2024"), None),
        Some("2024-01-15".to_string())
    );
    assert_eq!(parse_flexible_date(Some("not a date"), None), None);
    assert_eq!(parse_flexible_date(None, Some(2024)), None);
}

#[test]
fn test_dates_slash_form_is_day_first() {
    assert_eq!(
        parse_flexible_date(Some("03/04/2024"), None),
        Some("2024-04-03".to_string())
    );
    // Impossible day falls through every strategy
    assert_eq!(parse_flexible_date(Some("31/11/2024"), None), None);
}

#[test]
fn test_dates_idempotent() {
    for raw in ["15 janvier 2024", "January 15, 2024", "15/01/2024", "2024-01-15T08:00:00Z"] {
        let once = parse_flexible_date(Some(raw), Some(2024));
        assert_eq!(once.as_deref(), Some("2024-01-15"), "input {:?}", raw);
        assert_eq!(parse_flexible_date(once.as_deref(), None), once);
    }
}

#[test]
fn test_dates_outside_four_digit_years_are_rejected() {
    for raw in [
        "15/01/-5",
        "15/01/12345",
        "15/01/0",
        "15 janvier 0000",
        "January 15, 0000",
        "0000-01-15",
    ] {
        assert_eq!(parse_flexible_date(Some(raw), Some(2024)), None, "input {:?}", raw);
    }
}

#[test]
fn test_dates_always_render_as_padded_iso() {
    for raw in ["1/1/1", "7/3/999", "31/12/9999", "3 août 0042"] {
        let date = parse_flexible_date(Some(raw), Some(2024)).unwrap();
        assert_eq!(date.len(), 10, "{:?} rendered as {:?}", raw, date);
        assert!(date.as_bytes()[..4].iter().all(u8::is_ascii_digit));
        assert_eq!(parse_flexible_date(Some(&date), None).as_deref(), Some(date.as_str()));
    }
}
