//! URL slug generation shared by products, categories, classes and ranges.

/// Lower-case, ASCII-only slug: runs of anything that is not a letter or a
/// digit collapse into a single `-`, and leading/trailing dashes are trimmed.
///
/// Non-ASCII letters are dropped rather than transliterated, so a title made
/// only of such characters yields an empty slug.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;

    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch == '-' || ch == '_' || ch.is_ascii_punctuation() {
            pending_dash = true;
        }
    }

    slug
}

/// Make `base` unique by appending `-2`, `-3`, ... until `taken` says no.
pub fn unique_slug(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    let mut n = 2u32;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Nice  T-Shirt!"), "nice-t-shirt");
        assert_eq!(slugify("  Books & DVDs "), "books-dvds");
        assert_eq!(slugify("already-a-slug"), "already-a-slug");
    }

    #[test]
    fn slugify_drops_non_ascii() {
        assert_eq!(slugify("Kopfhörer"), "kopfhrer");
        assert_eq!(slugify("ｍϻϒ"), "");
    }

    #[test]
    fn unique_slug_appends_counter() {
        let taken = ["foo", "foo-2"];
        assert_eq!(unique_slug("foo", |s| taken.contains(&s)), "foo-3");
        assert_eq!(unique_slug("bar", |s| taken.contains(&s)), "bar");
    }

    proptest! {
        #[test]
        fn slugs_never_start_or_end_with_dash(input in ".{0,64}") {
            let slug = slugify(&input);
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
        }
    }
}
