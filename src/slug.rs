/// Lowercase ASCII slug: alphanumerics kept, runs of anything else collapse to
/// a single `-`, no leading or trailing dash.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_dash = true;
        }
    }

    slug
}

/// First candidate of `base`, `base-1`, `base-2`, ... for which `taken` is false.
pub fn unique_slug(base: &str, mut taken: impl FnMut(&str) -> bool) -> String {
    let base = if base.is_empty() { "item" } else { base };
    if !taken(base) {
        return base.to_string();
    }
    let mut counter = 1u32;
    loop {
        let candidate = format!("{base}-{counter}");
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Dried Apricots"), "dried-apricots");
        assert_eq!(slugify("  Hunza   Honey -- 500g "), "hunza-honey-500g");
        assert_eq!(slugify("Chai & Biscuits!"), "chai-biscuits");
        assert_eq!(slugify("___"), "");
    }

    #[test]
    fn unique_slug_appends_counter() {
        let existing = ["walnuts", "walnuts-1"];
        let slug = unique_slug("walnuts", |s| existing.contains(&s));
        assert_eq!(slug, "walnuts-2");
        assert_eq!(unique_slug("almonds", |s| existing.contains(&s)), "almonds");
    }
}
