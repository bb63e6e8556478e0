/*!
 * Tests for provider request construction and error mapping
 */

use std::sync::Arc;

use subweave::app_config::TranslationProvider;
use subweave::database::MemoryStore;
use subweave::errors::ErrorKind;
use subweave::language_utils::Language;
use subweave::providers::signing::{md5_hex, sha256_hex};
use subweave::providers::{
    ali, azure, baidu, build_provider, deepl, http_client, huoshan, supported_languages, trim_text, youdao,
};

/// Every built adapter reports the provider it was built for
#[test]
fn test_buildProvider_forEveryProvider_shouldReportKind() {
    let store = Arc::new(MemoryStore::new());
    let client = http_client();

    for provider in TranslationProvider::ALL {
        let adapter = build_provider(provider, store.clone(), client.clone());
        assert_eq!(adapter.kind(), provider);
        assert_eq!(adapter.supported_languages(), supported_languages(provider));
    }
}

/// Menus exclude languages a provider cannot translate
#[test]
fn test_supportedLanguages_withUnmappedLanguage_shouldBeExcluded() {
    let store = Arc::new(MemoryStore::new());
    let deepl = build_provider(TranslationProvider::DeepL, store, http_client());

    assert!(deepl.language_code(Language::Th).is_none());
    assert_eq!(deepl.require_code(Language::Th).unwrap_err().kind(), ErrorKind::UnsupportedLanguage);
    assert!(!supported_languages(TranslationProvider::DeepL).contains(&Language::Th));
}

/// Per-provider tables rename the same internal language differently
#[test]
fn test_languageCodes_forChinese_shouldFollowEachTable() {
    assert_eq!(baidu::language_code(Language::ZhCn), Some("zh"));
    assert_eq!(youdao::language_code(Language::ZhCn), Some("zh-CHS"));
    assert_eq!(azure::language_code(Language::ZhCn), Some("zh-Hans"));
    assert_eq!(deepl::language_code(Language::ZhCn), Some("ZH"));
    assert_eq!(huoshan::language_code(Language::ZhCn), Some("zh"));
    assert_eq!(ali::language_code(Language::ZhCn), Some("zh"));
}

/// Request signatures digest the documented concatenations
#[test]
fn test_signatures_shouldDigestDocumentedInputs() {
    assert_eq!(
        baidu::sign("2015063000000001", "apple", "1435660288", "12345678"),
        md5_hex("2015063000000001apple143566028812345678")
    );

    let long = vec!["abcdefghij".to_string(), "klmnopqrstuvwxyz".to_string()];
    assert_eq!(youdao::truncate("abcdefghijklmnopqrstuvwxyz"), "abcdefghij26qrstuvwxyz");
    assert_eq!(
        youdao::sign("app", &long, "salt", "1700000000", "key"),
        sha256_hex("appabcdefghij26qrstuvwxyzsalt1700000000key".as_bytes())
    );
}

/// Back-end codes collapse onto the shared taxonomy
#[test]
fn test_errorMapping_acrossProviders_shouldAgreeOnKinds() {
    assert_eq!(baidu::map_error_code("54003", "").kind(), ErrorKind::RateLimited);
    assert_eq!(youdao::map_error_code("411").kind(), ErrorKind::RateLimited);
    assert_eq!(azure::map_error_code(429001, "").kind(), ErrorKind::RateLimited);
    assert_eq!(
        deepl::map_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "").kind(),
        ErrorKind::RateLimited
    );
    assert_eq!(huoshan::map_error_code(-429, "", "").kind(), ErrorKind::RateLimited);
    assert_eq!(ali::map_error_code("Throttling.User", "").kind(), ErrorKind::RateLimited);

    assert_eq!(baidu::map_error_code("54004", "").kind(), ErrorKind::QuotaExceeded);
    assert_eq!(
        deepl::map_status(reqwest::StatusCode::from_u16(456).unwrap(), "").kind(),
        ErrorKind::QuotaExceeded
    );
    assert_eq!(azure::map_error_code(401000, "").kind(), ErrorKind::Forbidden);
    assert_eq!(youdao::map_error_code("999").kind(), ErrorKind::UnrecognizedErrorCode);
}

/// Output trimming only removes one trailing CJK mark
#[test]
fn test_trimText_withTrailingMarks_shouldRemoveOne() {
    assert_eq!(trim_text("你好。"), "你好");
    assert_eq!(trim_text(" ok "), "ok");
}

/// Adapters fail cleanly when the store has no credentials
#[tokio::test]
async fn test_translate_withEmptyStore_shouldReportNoCredentials() {
    let store = Arc::new(MemoryStore::new());
    let request = subweave::providers::TranslateRequest::new(vec!["hi".to_string()], Language::En, Language::Fr);

    for provider in TranslationProvider::ALL {
        let adapter = build_provider(provider, store.clone(), http_client());
        let err = tokio_test::assert_err!(adapter.translate(&request).await);
        assert_eq!(err.kind(), ErrorKind::NoCredentials, "provider {}", provider);
    }
}
