//! Destination paths for direct-to-store uploads
//!
//! Paths have the form `{YYYY-MM-DD}/{uuid}_{slug}.{ext}`. The raw filename never
//! reaches the store; only its slug and lowercased extension do.

use chrono::{NaiveDate, Utc};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

const FALLBACK_SLUG: &str = "file";
const MAX_SLUG_CHARS: usize = 80;
const MAX_EXTENSION_CHARS: usize = 10;

/// Strip diacritics, collapse every non-alphanumeric run into one hyphen and lowercase.
///
/// Characters with no ASCII decomposition (for example the dotless `ı`) are mapped by
/// hand so Turkish names keep their letters.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for c in input.nfkd().filter(|c| !is_combining_mark(*c)) {
        let c = match c {
            'ı' => 'i',
            'İ' => 'i',
            'ß' => 's',
            'ø' | 'Ø' => 'o',
            'æ' | 'Æ' => 'a',
            'đ' | 'Đ' => 'd',
            'ł' | 'Ł' => 'l',
            other => other,
        };
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.len() > MAX_SLUG_CHARS {
        slug.truncate(MAX_SLUG_CHARS);
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Split a filename into its base name and lowercased alphanumeric extension.
fn split_extension(filename: &str) -> (&str, Option<String>) {
    match filename.rfind('.') {
        Some(dot) if dot > 0 => {
            let ext: String = filename[dot + 1..]
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .take(MAX_EXTENSION_CHARS)
                .collect::<String>()
                .to_ascii_lowercase();
            let ext = if ext.is_empty() { None } else { Some(ext) };
            (&filename[..dot], ext)
        }
        _ => (filename, None),
    }
}

/// Derive a fresh destination path for `filename`, dated today (UTC).
pub fn derive_upload_path(filename: &str) -> String {
    derive_upload_path_on(filename, Utc::now().date_naive(), Uuid::new_v4())
}

pub fn derive_upload_path_on(filename: &str, date: NaiveDate, id: Uuid) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let (base, ext) = split_extension(name);
    let slug = slugify(base);
    match ext {
        Some(ext) => format!("{}/{}_{}.{}", date.format("%Y-%m-%d"), id, slug, ext),
        None => format!("{}/{}_{}", date.format("%Y-%m-%d"), id, slug),
    }
}

/// Whether `path` has the shape produced by [`derive_upload_path`].
pub fn is_issued_path(path: &str) -> bool {
    let Some((date, file)) = path.split_once('/') else {
        return false;
    };
    if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() || date.len() != 10 {
        return false;
    }
    let Some((id, rest)) = file.split_once('_') else {
        return false;
    };
    if Uuid::parse_str(id).is_err() || id.len() != 36 {
        return false;
    }
    !rest.is_empty()
        && rest
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
        && !rest.starts_with('.')
        && !rest.contains("..")
}
