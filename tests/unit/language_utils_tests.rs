/*!
 * Tests for language identifier utilities
 */

use subweave::language_utils::{Language, get_language_name};

/// Test that every internal identifier is distinct
#[test]
fn test_language_codes_shouldBeUnique() {
    let mut codes: Vec<&str> = Language::ALL.iter().map(|l| l.code()).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), Language::ALL.len());
}

/// Test language name lookup from assorted code styles
#[test]
fn test_getLanguageName_withIsoCodes_shouldReturnEnglishName() {
    assert_eq!(get_language_name("fr").unwrap(), "French");
    assert_eq!(get_language_name("deu").unwrap(), "German");
    assert_eq!(get_language_name("ZH_cn").unwrap(), "Chinese (Simplified)");
    assert!(get_language_name("klingon").is_err());
}

/// Test that languages serialize as their internal identifiers
#[test]
fn test_language_serde_shouldUseInternalCode() {
    let json = serde_json::to_string(&vec![Language::ZhTw, Language::En]).unwrap();
    assert_eq!(json, r#"["zh_TW","en"]"#);

    let parsed: Vec<Language> = serde_json::from_str(r#"["zh_TW","spa"]"#).unwrap();
    assert_eq!(parsed, vec![Language::ZhTw, Language::Es]);
}
