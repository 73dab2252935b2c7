/// Category restriction parsed from a comma-separated slug list. An empty
/// scope filters nothing. The same scope value is bound into both the page
/// query and the count query so the two predicates cannot drift apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryScope {
    slugs: Vec<String>,
}

impl CategoryScope {
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let slugs = raw
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|slug| !slug.is_empty())
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Self { slugs }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slugs.is_empty()
    }

    #[must_use]
    pub fn slugs(&self) -> &[String] {
        &self.slugs
    }
}

#[cfg(test)]
mod tests {
    use super::CategoryScope;

    #[test]
    fn absent_and_blank_input_yield_the_universal_scope() {
        assert!(CategoryScope::parse(None).is_empty());
        assert!(CategoryScope::parse(Some("")).is_empty());
        assert!(CategoryScope::parse(Some(" , ,")).is_empty());
    }

    #[test]
    fn slugs_are_split_on_commas_and_trimmed() {
        let scope = CategoryScope::parse(Some(" technology, business ,sports"));
        assert_eq!(scope.slugs(), ["technology", "business", "sports"]);
    }
}
