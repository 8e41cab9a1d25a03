//! Template preprocessing: turn marker colors into template slots.
//!
//! Template authors draw the card backgrounds in Inkscape with a distinct
//! placeholder color per card position. Before rendering, each placeholder
//! literal is swapped for `{{ colors.i }}` so that card `i` gets the color of
//! its guest's food choice.
//!
//! Replacement is textual over the whole file, not limited to `fill`/`style`
//! attributes: a marker literal appearing anywhere else in the SVG is
//! replaced as well. Markers are matched ignoring ASCII case, since editors
//! disagree on `#FF0000` vs `#ff0000`.

use tracing::{debug, warn};

/// Replace every occurrence of `markers[i]` in `source` with `{{ colors.i }}`.
///
/// Idempotent: the slots contain no hex literal, so a second pass changes
/// nothing.
pub fn preprocess_template<S: AsRef<str>>(source: &str, markers: &[S]) -> String {
    let mut out = source.to_string();
    for (index, marker) in markers.iter().enumerate() {
        let marker = marker.as_ref();
        if marker.is_empty() {
            continue;
        }
        let slot = format!("{{{{ colors.{index} }}}}");
        let (replaced, hits) = replace_ignore_ascii_case(&out, marker, &slot);
        if hits == 0 {
            warn!("Marker color {marker} (card {}) not found in template", index + 1);
            continue;
        }
        debug!("Marker {marker} → colors.{index} ({hits} occurrences)");
        out = replaced;
    }
    out
}

/// Literal, non-overlapping, left-to-right replacement ignoring ASCII case.
///
/// ASCII lower-casing keeps byte offsets, so match positions found in the
/// lowered copy are valid char boundaries in `haystack`.
fn replace_ignore_ascii_case(haystack: &str, needle: &str, with: &str) -> (String, usize) {
    let lowered = haystack.to_ascii_lowercase();
    let needle = needle.to_ascii_lowercase();
    let mut out = String::with_capacity(haystack.len());
    let mut last = 0;
    let mut hits = 0;
    for (start, _) in lowered.match_indices(&needle) {
        out.push_str(&haystack[last..start]);
        out.push_str(with);
        last = start + needle.len();
        hits += 1;
    }
    out.push_str(&haystack[last..]);
    (out, hits)
}
