use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref NON_ALNUM: Regex = Regex::new(r"[^a-z0-9\s]").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "ada","adalah","agar","akan","anda","antara","atau",
            "bahwa","belum","bisa",
            "dalam","dan","dapat","dari","dengan","di","dia","dua",
            "hal","harus",
            "ia","ini","itu",
            "jika",
            "karena","ke","kembali","ketika","kami","kita",
            "lebih",
            "masih","menurut","mereka",
            "namun",
            "oleh",
            "pada","para",
            "saat","saja","sangat","saya","se","sebagai","sebuah","seperti","sehingga","sudah",
            "telah","ter","tersebut","tidak",
            "untuk",
            "yang"
        ];
        words.iter().copied().collect()
    };
}

const MIN_TERM_LEN: usize = 3;

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

fn keep(token: &str) -> bool {
    if is_numeric(token) {
        return true;
    }
    !is_stopword(token) && token.len() >= MIN_TERM_LEN
}

/// Normalize raw text into a space-separated string of index terms.
///
/// NFKC-folds and lower-cases the input, replaces every character other than
/// `a-z`, `0-9` and whitespace with a space, then drops stop words and terms
/// shorter than three characters. Purely numeric tokens are always kept.
/// Indexing and querying must both go through this function.
pub fn normalize(text: &str) -> String {
    let folded = text.nfkc().collect::<String>().to_lowercase();
    let cleaned = NON_ALNUM.replace_all(&folded, " ");
    cleaned
        .split_whitespace()
        .filter(|t| keep(t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split already-normalized text into its terms.
pub fn terms(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split_whitespace()
}
