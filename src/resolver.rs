//! Annotation discovery
//!
//! Archives pair images and annotations inconsistently: names differ in case
//! or punctuation, get truncated, or share one annotation per batch prefix.
//! Matching is therefore a chain of strategies tried in order. Each strategy
//! is a pure function of the image path and the listing of its directory, so
//! the policy can be tested without touching the file system.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{AnnotationCandidate, ANNOTATION_FORMATS};

/// Number of leading characters tried by the prefix fallback
pub const PREFIX_LEN: usize = 8;

/// A strategy that picks an annotation for an image out of a directory listing.
pub trait AnnotationMatcher {
    fn find(&self, image_path: &Path, listing: &[PathBuf]) -> Option<PathBuf>;
}

/// Same base name as the image with an `.xml` or `.txt` extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactStem;

/// Base names equal after dropping non-alphanumerics and lower-casing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NormalizedName;

/// Base name before the first underscore, then the first few characters.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrefixFallback;

impl AnnotationMatcher for ExactStem {
    fn find(&self, image_path: &Path, listing: &[PathBuf]) -> Option<PathBuf> {
        let stem = file_stem(image_path)?;
        find_named(listing, stem)
    }
}

impl AnnotationMatcher for NormalizedName {
    fn find(&self, image_path: &Path, listing: &[PathBuf]) -> Option<PathBuf> {
        let target = normalize_filename(file_stem(image_path)?);

        let mut matches: Vec<(usize, &PathBuf)> = listing
            .iter()
            .filter_map(|path| {
                let rank = annotation_rank(path)?;
                let stem = file_stem(path)?;
                (normalize_filename(stem) == target).then_some((rank, path))
            })
            .collect();
        matches.sort_by(|(a_rank, a), (b_rank, b)| {
            a_rank.cmp(b_rank).then_with(|| a.file_name().cmp(&b.file_name()))
        });
        matches.first().map(|(_, path)| (*path).clone())
    }
}

impl AnnotationMatcher for PrefixFallback {
    fn find(&self, image_path: &Path, listing: &[PathBuf]) -> Option<PathBuf> {
        let stem = file_stem(image_path)?;
        let before_underscore = stem.split('_').next().unwrap_or(stem);
        let leading = match stem.char_indices().nth(PREFIX_LEN) {
            Some((end, _)) => &stem[..end],
            None => stem,
        };

        [before_underscore, leading]
            .into_iter()
            .find_map(|prefix| find_named(listing, prefix))
    }
}

/// Run the matchers in order against a directory listing; first hit wins.
pub fn resolve_in(image_path: &Path, listing: &[PathBuf]) -> Option<AnnotationCandidate> {
    let matchers: [&dyn AnnotationMatcher; 3] = [&ExactStem, &NormalizedName, &PrefixFallback];
    matchers
        .iter()
        .find_map(|matcher| matcher.find(image_path, listing))
        .and_then(AnnotationCandidate::from_path)
}

/// Find the annotation of an image by listing its directory.
///
/// Returns `Ok(None)` when no strategy matches. Only a failure to list the
/// directory is an error.
pub fn resolve(image_path: &Path) -> std::io::Result<Option<AnnotationCandidate>> {
    let listing = list_directory(parent_dir(image_path))?;
    Ok(resolve_in(image_path, &listing))
}

/// Directory listings memoized for the length of a run.
///
/// Every image of a class shares one directory, so listing it once per image
/// would make the scan quadratic.
#[derive(Debug, Default)]
pub struct ListingCache {
    listings: HashMap<PathBuf, Vec<PathBuf>>,
}

impl ListingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, image_path: &Path) -> std::io::Result<Option<AnnotationCandidate>> {
        let dir = parent_dir(image_path).to_path_buf();
        if !self.listings.contains_key(&dir) {
            let listing = list_directory(&dir)?;
            self.listings.insert(dir.clone(), listing);
        }
        Ok(self
            .listings
            .get(&dir)
            .and_then(|listing| resolve_in(image_path, listing)))
    }
}

/// Files and symlinks directly inside `dir`, sorted by name
pub fn list_directory(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_file() || file_type.is_symlink() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Strip everything but ASCII letters and digits, then lower-case.
pub fn normalize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn file_stem(path: &Path) -> Option<&str> {
    path.file_stem()?.to_str()
}

// Look up `<base>.xml`, then `<base>.txt`, by exact file name
fn find_named(listing: &[PathBuf], base: &str) -> Option<PathBuf> {
    if base.is_empty() {
        return None;
    }
    ANNOTATION_FORMATS.iter().find_map(|ext| {
        let wanted = format!("{}.{}", base, ext);
        listing
            .iter()
            .find(|path| path.file_name().and_then(|n| n.to_str()) == Some(wanted.as_str()))
            .cloned()
    })
}

// Position of the extension in ANNOTATION_FORMATS, ignoring case
fn annotation_rank(path: &Path) -> Option<usize> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    ANNOTATION_FORMATS.iter().position(|known| *known == ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AnnotationKind;

    fn listing(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|name| Path::new("fox").join(name)).collect()
    }

    #[test]
    fn exact_stem_prefers_xml() {
        let files = listing(&["fox_001.jpg", "fox_001.txt", "fox_001.xml"]);
        let found = ExactStem.find(Path::new("fox/fox_001.jpg"), &files);
        assert_eq!(found, Some(PathBuf::from("fox/fox_001.xml")));
    }

    #[test]
    fn exact_stem_keeps_inner_dots() {
        let files = listing(&["img.v2.jpg", "img.v2.txt"]);
        let found = ExactStem.find(Path::new("fox/img.v2.jpg"), &files);
        assert_eq!(found, Some(PathBuf::from("fox/img.v2.txt")));
    }

    #[test]
    fn exact_stem_is_case_sensitive() {
        let files = listing(&["Fox-01.JPG", "fox01.xml"]);
        assert_eq!(ExactStem.find(Path::new("fox/Fox-01.JPG"), &files), None);
    }

    #[test]
    fn normalized_name_ignores_case_and_punctuation() {
        let files = listing(&["Fox-01.JPG", "fox01.xml"]);
        let found = NormalizedName.find(Path::new("fox/Fox-01.JPG"), &files);
        assert_eq!(found, Some(PathBuf::from("fox/fox01.xml")));
    }

    #[test]
    fn normalized_name_accepts_upper_case_extension() {
        let files = listing(&["Fox 01.png", "FOX_01.TXT"]);
        let found = NormalizedName.find(Path::new("fox/Fox 01.png"), &files);
        assert_eq!(found, Some(PathBuf::from("fox/FOX_01.TXT")));
    }

    #[test]
    fn normalized_name_prefers_xml_over_txt() {
        let files = listing(&["fox-01.txt", "Fox_01.xml", "fox01.jpg"]);
        let found = NormalizedName.find(Path::new("fox/fox01.jpg"), &files);
        assert_eq!(found, Some(PathBuf::from("fox/Fox_01.xml")));
    }

    #[test]
    fn normalized_name_skips_other_formats() {
        let files = listing(&["fox01.jpg", "fox-01.json", "fox_01.png"]);
        assert_eq!(NormalizedName.find(Path::new("fox/fox01.jpg"), &files), None);
    }

    #[test]
    fn prefix_before_underscore() {
        let files = listing(&["batch7_0001.jpg", "batch7.txt"]);
        let found = PrefixFallback.find(Path::new("fox/batch7_0001.jpg"), &files);
        assert_eq!(found, Some(PathBuf::from("fox/batch7.txt")));
    }

    #[test]
    fn prefix_first_eight_characters() {
        let files = listing(&["abcdefgh-long-name.jpg", "abcdefgh.xml"]);
        let found = PrefixFallback.find(Path::new("fox/abcdefgh-long-name.jpg"), &files);
        assert_eq!(found, Some(PathBuf::from("fox/abcdefgh.xml")));
    }

    #[test]
    fn prefix_counts_characters_not_bytes() {
        let files = listing(&["épreuves-numéro-1.jpg", "épreuves.txt"]);
        let found = PrefixFallback.find(Path::new("fox/épreuves-numéro-1.jpg"), &files);
        assert_eq!(found, Some(PathBuf::from("fox/épreuves.txt")));
    }

    #[test]
    fn prefix_underscore_wins_over_leading_characters() {
        let files = listing(&["ab_cdefghij.jpg", "ab.txt", "ab_cdefg.xml"]);
        let found = PrefixFallback.find(Path::new("fox/ab_cdefghij.jpg"), &files);
        assert_eq!(found, Some(PathBuf::from("fox/ab.txt")));
    }

    #[test]
    fn prefix_ignores_leading_underscore() {
        let files = listing(&["_hidden.jpg", ".xml"]);
        assert_eq!(PrefixFallback.find(Path::new("fox/_hidden.jpg"), &files), None);
    }

    #[test]
    fn resolve_in_walks_tiers_in_order() {
        let files = listing(&["Fox-01.jpg", "fox01.txt", "Fox.xml"]);
        let found = resolve_in(Path::new("fox/Fox-01.jpg"), &files).unwrap();
        assert_eq!(found.path, PathBuf::from("fox/fox01.txt"));
        assert_eq!(found.kind, AnnotationKind::Text);
    }

    #[test]
    fn resolve_in_reports_no_candidate() {
        let files = listing(&["fox_001.jpg", "bear.xml"]);
        assert_eq!(resolve_in(Path::new("fox/fox_001.jpg"), &files), None);
    }

    #[test]
    fn resolve_lists_the_image_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let image = temp_dir.path().join("Fox-01.JPG");
        fs::write(&image, b"jpeg").unwrap();
        fs::write(temp_dir.path().join("fox01.xml"), b"<annotation/>").unwrap();
        fs::create_dir(temp_dir.path().join("Fox01.txt")).unwrap();

        let found = resolve(&image).unwrap().unwrap();
        assert_eq!(found.path, temp_dir.path().join("fox01.xml"));
        assert_eq!(found.kind, AnnotationKind::Xml);

        let mut cache = ListingCache::new();
        assert_eq!(cache.resolve(&image).unwrap(), Some(found));
    }

    #[test]
    fn normalize_filename_strips_punctuation() {
        assert_eq!(normalize_filename("Fox-01 (copy)"), "fox01copy");
        assert_eq!(normalize_filename("__"), "");
    }
}
