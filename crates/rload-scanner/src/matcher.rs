//! Token-aware matching
//!
//! Pattern matching over script text that ignores anything inside strings,
//! comments, regex literals and template text.

use crate::lex_error::LexError;
use crate::region::MaskedRegion;
use crate::scanner::scan;
use regex::{Captures, Regex};

/// Run `pattern` over `source`, reporting only matches that begin in code.
///
/// `on_match` receives the capture groups, the byte offset of the match and
/// the whole source. With `global == false` matching stops after the first
/// accepted match. Returns the number of accepted matches.
///
/// A match that starts inside a masked region is rejected, except when it
/// starts on the region's first character and covers the whole region: such
/// a match is about the token itself (a regex literal matched as a regex
/// literal) rather than about its contents.
pub fn match_outside_masked<F>(
    source: &str,
    pattern: &Regex,
    global: bool,
    mut on_match: F,
) -> Result<usize, LexError>
where
    F: FnMut(&Captures<'_>, usize, &str),
{
    let regions = scan(source)?;
    let mut cursor = 0;
    let mut accepted = 0;

    for captures in pattern.captures_iter(source) {
        let Some(whole) = captures.get(0) else {
            continue;
        };

        while regions
            .get(cursor)
            .is_some_and(|region| region.end <= whole.start())
        {
            cursor += 1;
        }

        let masked = regions.get(cursor).is_some_and(|region| {
            region.start <= whole.start()
                && !(region.start == whole.start() && whole.end() >= region.end)
        });
        if masked {
            continue;
        }

        on_match(&captures, whole.start(), source);
        accepted += 1;
        if !global {
            break;
        }
    }

    Ok(accepted)
}

/// Replace matches of `pattern` that begin in code with the output of
/// `replacer`; matches inside masked regions are left untouched.
pub fn replace_outside_masked<F>(
    source: &str,
    pattern: &Regex,
    global: bool,
    mut replacer: F,
) -> Result<String, LexError>
where
    F: FnMut(&Captures<'_>) -> String,
{
    let mut replacements = Vec::new();
    match_outside_masked(source, pattern, global, |captures, offset, _| {
        let len = captures.get(0).map_or(0, |m| m.len());
        replacements.push((offset, offset + len, replacer(captures)));
    })?;

    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    for (start, end, replacement) in replacements {
        out.push_str(&source[last..start]);
        out.push_str(&replacement);
        last = end;
    }
    out.push_str(&source[last..]);
    Ok(out)
}

/// Scan `source` and blank out every masked region.
///
/// The result has the same byte length and the same newline positions as
/// `source`. String, regex and template delimiters are kept; comments are
/// blanked entirely. Plain pattern matching on the erased text can only hit
/// real code.
pub fn erase_masked(source: &str) -> Result<String, LexError> {
    let regions = scan(source)?;
    Ok(erase_regions(source, &regions))
}

/// Blank out `regions` (in ascending order) of `source`.
pub fn erase_regions(source: &str, regions: &[MaskedRegion]) -> String {
    let mut erased = String::with_capacity(source.len());
    let mut last = 0;

    for region in regions {
        if region.start < last || region.end > source.len() {
            continue;
        }
        erased.push_str(&source[last..region.start]);
        region.erase_into(source, &mut erased);
        last = region.end;
    }

    erased.push_str(&source[last..]);
    erased
}
