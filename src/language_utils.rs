use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Language utilities for the internal language identifiers
///
/// Timelines, provider code tables and menus are all keyed by [`Language`].
/// Parsing also accepts ISO 639-1 and ISO 639-3 codes and resolves them
/// through isolang, so `fra`, `fr` and `FR` all name the same language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    En,
    ZhCn,
    ZhTw,
    Ja,
    Ko,
    Fr,
    Es,
    Ru,
    Ar,
    Th,
    De,
    Pt,
    It,
    Hi,
    Id,
    Tr,
    Vi,
    He,
    El,
    Pl,
    Nl,
    Hu,
    No,
    Sv,
    Fi,
    Cs,
    Da,
    Lt,
    Sk,
    Ms,
    Ro,
    Bg,
    Hr,
    Lo,
    Ur,
    Ta,
}

impl Language {
    /// Every internal language, in menu order
    pub const ALL: [Language; 36] = [
        Self::En,
        Self::ZhCn,
        Self::ZhTw,
        Self::Ja,
        Self::Ko,
        Self::Fr,
        Self::Es,
        Self::Ru,
        Self::Ar,
        Self::Th,
        Self::De,
        Self::Pt,
        Self::It,
        Self::Hi,
        Self::Id,
        Self::Tr,
        Self::Vi,
        Self::He,
        Self::El,
        Self::Pl,
        Self::Nl,
        Self::Hu,
        Self::No,
        Self::Sv,
        Self::Fi,
        Self::Cs,
        Self::Da,
        Self::Lt,
        Self::Sk,
        Self::Ms,
        Self::Ro,
        Self::Bg,
        Self::Hr,
        Self::Lo,
        Self::Ur,
        Self::Ta,
    ];

    // @returns: Internal identifier, as used in storage keys
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::ZhCn => "zh_CN",
            Self::ZhTw => "zh_TW",
            Self::Ja => "ja",
            Self::Ko => "ko",
            Self::Fr => "fr",
            Self::Es => "es",
            Self::Ru => "ru",
            Self::Ar => "ar",
            Self::Th => "th",
            Self::De => "de",
            Self::Pt => "pt",
            Self::It => "it",
            Self::Hi => "hi",
            Self::Id => "id",
            Self::Tr => "tr",
            Self::Vi => "vi",
            Self::He => "he",
            Self::El => "el",
            Self::Pl => "pl",
            Self::Nl => "nl",
            Self::Hu => "hu",
            Self::No => "no",
            Self::Sv => "sv",
            Self::Fi => "fi",
            Self::Cs => "cs",
            Self::Da => "da",
            Self::Lt => "lt",
            Self::Sk => "sk",
            Self::Ms => "ms",
            Self::Ro => "ro",
            Self::Bg => "bg",
            Self::Hr => "hr",
            Self::Lo => "lo",
            Self::Ur => "ur",
            Self::Ta => "ta",
        }
    }

    // @returns: ISO 639-1 code of the underlying language
    pub fn iso_639_1(&self) -> &'static str {
        match self {
            Self::ZhCn | Self::ZhTw => "zh",
            other => other.code(),
        }
    }

    /// English display name
    pub fn english_name(&self) -> String {
        match self {
            Self::ZhCn => "Chinese (Simplified)".to_string(),
            Self::ZhTw => "Chinese (Traditional)".to_string(),
            other => isolang::Language::from_639_1(other.iso_639_1())
                .map(|lang| lang.to_name().to_string())
                .unwrap_or_else(|| other.code().to_string()),
        }
    }

    fn from_iso(code: &str) -> Option<Self> {
        let lang = match code.len() {
            2 => isolang::Language::from_639_1(code),
            3 => isolang::Language::from_639_3(code),
            _ => None,
        }?;
        let part1 = lang.to_639_1()?;
        match part1 {
            "zh" => Some(Self::ZhCn),
            "nb" | "nn" => Some(Self::No),
            other => Self::ALL.iter().copied().find(|l| l.code() == other),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().replace('-', "_").to_lowercase();
        match normalized.as_str() {
            "zh_cn" | "zh_hans" | "zh_sg" => return Ok(Self::ZhCn),
            "zh_tw" | "zh_hant" | "zh_hk" => return Ok(Self::ZhTw),
            _ => {}
        }
        if let Some(lang) = Self::ALL.iter().copied().find(|l| l.code() == normalized) {
            return Ok(lang);
        }
        Self::from_iso(&normalized).ok_or_else(|| anyhow!("Unsupported language code: {}", s))
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Get the English language name from any accepted code
pub fn get_language_name(code: &str) -> Result<String> {
    Ok(code.parse::<Language>()?.english_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fromStr_withInternalCodes_shouldRoundTrip() {
        for lang in Language::ALL {
            assert_eq!(lang.code().parse::<Language>().unwrap(), lang);
        }
    }

    #[test]
    fn test_fromStr_withIsoAliases_shouldResolve() {
        assert_eq!("fra".parse::<Language>().unwrap(), Language::Fr);
        assert_eq!("zh-TW".parse::<Language>().unwrap(), Language::ZhTw);
        assert_eq!("zho".parse::<Language>().unwrap(), Language::ZhCn);
        assert_eq!("nb".parse::<Language>().unwrap(), Language::No);
        assert!("xx".parse::<Language>().is_err());
    }

    #[test]
    fn test_englishName_shouldUseIsolang() {
        assert_eq!(Language::De.english_name(), "German");
        assert_eq!(Language::ZhTw.english_name(), "Chinese (Traditional)");
    }
}
