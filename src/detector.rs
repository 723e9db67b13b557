//! Source language detection.
//!
//! Uses the whatlang crate for trigram-based detection and maps its
//! ISO 639-3 codes to the upper-case ISO 639-1 codes the upstream expects.

use whatlang::Lang;

/// Code returned when no language could be detected.
///
/// An empty source language is forwarded as-is and lets the upstream
/// provider detect the language itself.
pub const UNKNOWN_LANGUAGE: &str = "";

/// Detect the language of `text` and return its upper-case ISO 639-1 code.
///
/// Never fails: empty text, or text without any recognisable script
/// (digits, punctuation), yields [`UNKNOWN_LANGUAGE`]. Very short text that
/// has letters still gets whatlang's best guess, however unreliable.
pub fn detect(text: &str) -> String {
    match whatlang::detect_lang(text) {
        Some(lang) => iso_639_1(lang).to_uppercase(),
        None => UNKNOWN_LANGUAGE.to_string(),
    }
}

/// Map a whatlang language to its two-letter code
fn iso_639_1(lang: Lang) -> &'static str {
    match lang.code() {
        "afr" => "af",
        "aka" => "ak",
        "amh" => "am",
        "ara" => "ar",
        "aze" => "az",
        "bel" => "be",
        "ben" => "bn",
        "bul" => "bg",
        "cat" => "ca",
        "ces" => "cs",
        "cmn" => "zh", // whatlang uses Cmn for Mandarin
        "dan" => "da",
        "deu" => "de",
        "ell" => "el",
        "eng" => "en",
        "epo" => "eo",
        "est" => "et",
        "fin" => "fi",
        "fra" => "fr",
        "guj" => "gu",
        "heb" => "he",
        "hin" => "hi",
        "hrv" => "hr",
        "hun" => "hu",
        "hye" => "hy",
        "ind" => "id",
        "ita" => "it",
        "jav" => "jv",
        "jpn" => "ja",
        "kan" => "kn",
        "kat" => "ka",
        "khm" => "km",
        "kor" => "ko",
        "lat" => "la",
        "lav" => "lv",
        "lit" => "lt",
        "mal" => "ml",
        "mar" => "mr",
        "mkd" => "mk",
        "mya" => "my",
        "nep" => "ne",
        "nld" => "nl",
        "nob" => "nb",
        "ori" => "or",
        "pan" => "pa",
        "pes" => "fa",
        "pol" => "pl",
        "por" => "pt",
        "ron" => "ro",
        "rus" => "ru",
        "sin" => "si",
        "slk" => "sk",
        "slv" => "sl",
        "sna" => "sn",
        "spa" => "es",
        "srp" => "sr",
        "swe" => "sv",
        "tam" => "ta",
        "tel" => "te",
        "tgl" => "tl",
        "tha" => "th",
        "tuk" => "tk",
        "tur" => "tr",
        "ukr" => "uk",
        "urd" => "ur",
        "uzb" => "uz",
        "vie" => "vi",
        "yid" => "yi",
        "zul" => "zu",
        // Languages without a two-letter code are treated as undetected
        _ => UNKNOWN_LANGUAGE,
    }
}
