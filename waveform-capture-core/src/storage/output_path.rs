//! Output file location for a new recording.
//!
//! An explicit path wins; otherwise the file is named after the current
//! local time, formatted with the host's Unicode date pattern, inside the
//! platform documents directory.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone};

use crate::models::error::CaptureError;

/// Translate a Unicode date pattern (`yyyyMMdd_HHmmss`) into a `chrono`
/// strftime string (`%Y%m%d_%H%M%S`).
///
/// Quoted runs (`'at'`) are literal, `''` is a single quote, and letters
/// without a mapping are copied through.
pub fn translate_date_pattern(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        out.push('\'');
                        i += 2;
                        continue;
                    }
                    break;
                }
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }

        if !c.is_ascii_alphabetic() {
            push_literal(&mut out, c);
            i += 1;
            continue;
        }

        let run = chars[i..].iter().take_while(|&&n| n == c).count();
        match strftime_field(c, run) {
            Some(field) => out.push_str(field),
            None => (0..run).for_each(|_| out.push(c)),
        }
        i += run;
    }
    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

fn strftime_field(letter: char, run: usize) -> Option<&'static str> {
    let field = match (letter, run) {
        ('y', 2) => "%y",
        ('y', _) => "%Y",
        ('M', 1) => "%-m",
        ('M', 2) => "%m",
        ('M', 3) => "%b",
        ('M', _) => "%B",
        ('d', 1) => "%-d",
        ('d', _) => "%d",
        ('H', 1) => "%-H",
        ('H', _) => "%H",
        ('h', 1) => "%-I",
        ('h', _) => "%I",
        ('m', 1) => "%-M",
        ('m', _) => "%M",
        ('s', 1) => "%-S",
        ('s', _) => "%S",
        ('S', 1..=3) => "%3f",
        ('S', 4..=6) => "%6f",
        ('S', _) => "%9f",
        ('a', _) => "%p",
        ('E', 1..=3) => "%a",
        ('E', _) => "%A",
        ('Z', _) => "%z",
        _ => return None,
    };
    Some(field)
}

/// Format `now` with a Unicode date pattern into a file-name-safe stem.
pub fn format_file_stem<Tz>(now: &DateTime<Tz>, file_name_format: &str) -> Result<String, CaptureError>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let strftime = translate_date_pattern(file_name_format);
    if StrftimeItems::new(&strftime).any(|item| matches!(item, Item::Error)) {
        return Err(CaptureError::PathResolutionFailure(format!(
            "unsupported file name format: {}",
            file_name_format
        )));
    }

    let mut stem = String::new();
    write!(stem, "{}", now.format(&strftime)).map_err(|_| {
        CaptureError::PathResolutionFailure(format!("cannot format file name with {}", file_name_format))
    })?;

    let stem = stem.replace(['/', '\\'], "-");
    if stem.trim().is_empty() {
        return Err(CaptureError::PathResolutionFailure("file name format produced an empty name".into()));
    }
    Ok(stem)
}

/// Resolve where a recording is written.
pub fn resolve_output_path<Tz>(
    explicit: Option<&Path>,
    documents_dir: Option<PathBuf>,
    file_name_format: &str,
    extension: &str,
    now: &DateTime<Tz>,
) -> Result<PathBuf, CaptureError>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    if let Some(path) = explicit {
        return prepare_explicit_path(path);
    }

    let dir = documents_dir
        .filter(|d| !d.as_os_str().is_empty())
        .ok_or_else(|| CaptureError::PathResolutionFailure("the document directory path is empty".into()))?;
    if !dir.is_dir() {
        return Err(CaptureError::PathResolutionFailure(format!(
            "the document directory does not exist: {}",
            dir.display()
        )));
    }

    let stem = format_file_stem(now, file_name_format)?;
    Ok(first_free_path(&dir, &stem, extension))
}

/// `stem.ext`, or `stem-1.ext`, `stem-2.ext`, ... when taken, so two starts
/// within one tick of the date pattern never truncate each other.
fn first_free_path(dir: &Path, stem: &str, extension: &str) -> PathBuf {
    let candidate = dir.join(format!("{}.{}", stem, extension));
    if !candidate.exists() {
        return candidate;
    }
    (1u32..)
        .map(|n| dir.join(format!("{}-{}.{}", stem, n, extension)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

fn prepare_explicit_path(path: &Path) -> Result<PathBuf, CaptureError> {
    if path.as_os_str().is_empty() {
        return Err(CaptureError::PathResolutionFailure("output path is empty".into()));
    }
    if path.file_name().is_none() {
        return Err(CaptureError::PathResolutionFailure(format!(
            "output path has no file name: {}",
            path.display()
        )));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            CaptureError::PathResolutionFailure(format!("cannot create {}: {}", parent.display(), e))
        })?;
    }
    Ok(path.to_path_buf())
}
