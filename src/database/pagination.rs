use serde::{Deserialize, Serialize};

/// Paginated listing envelope: total row count plus relative links to the
/// neighbouring pages. Totals come from a `COUNT(*) OVER()` window in the
/// listing query itself, so building a page never needs a second query.
#[derive(Serialize, Deserialize, Debug)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// `query` is the request's raw query pairs; everything except the
    /// pagination parameters is carried over into the links, so filtered
    /// listings keep their filters across pages.
    pub fn from_rows(
        rows: Vec<T>,
        count: i64,
        page_size: i64,
        page: i64,
        path: &str,
        query: &[(String, String)],
    ) -> Self {
        let page = page.max(1);
        let extra = extra_params(query);

        let next = if page * page_size < count {
            Some(page_url(path, page + 1, page_size, &extra))
        } else {
            None
        };
        let previous = if page > 1 {
            Some(page_url(path, page - 1, page_size, &extra))
        } else {
            None
        };

        Self {
            count,
            next,
            previous,
            results: rows,
        }
    }

    pub fn offset(page: i64, page_size: i64) -> i64 {
        (page.max(1) - 1) * page_size
    }

    /// Maps the results while keeping count and links intact.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

fn extra_params(query: &[(String, String)]) -> String {
    let kept: Vec<&(String, String)> = query
        .iter()
        .filter(|(k, _)| k != "page" && k != "limit")
        .collect();

    serde_urlencoded::to_string(kept).unwrap_or_default()
}

fn page_url(path: &str, page: i64, limit: i64, extra: &str) -> String {
    if extra.is_empty() {
        format!("{path}?page={page}&limit={limit}")
    } else {
        format!("{path}?page={page}&limit={limit}&{extra}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn first_page_has_no_previous() {
        let page = Page::from_rows(vec![1, 2, 3], 7, 3, 1, "/api/recipes", &[]);
        assert_eq!(page.count, 7);
        assert_eq!(page.previous, None);
        assert_eq!(page.next.as_deref(), Some("/api/recipes?page=2&limit=3"));
    }

    #[test]
    fn middle_page_links_both_ways() {
        let page = Page::from_rows(vec![4, 5, 6], 7, 3, 2, "/api/recipes", &[]);
        assert_eq!(page.previous.as_deref(), Some("/api/recipes?page=1&limit=3"));
        assert_eq!(page.next.as_deref(), Some("/api/recipes?page=3&limit=3"));
    }

    #[test]
    fn last_page_has_no_next() {
        let page = Page::from_rows(vec![7], 7, 3, 3, "/api/recipes", &[]);
        assert_eq!(page.next, None);
        assert_eq!(page.previous.as_deref(), Some("/api/recipes?page=2&limit=3"));
    }

    #[test]
    fn exact_fit_has_no_next() {
        let page = Page::from_rows(vec![1, 2, 3], 3, 3, 1, "/api/users", &[]);
        assert_eq!(page.next, None);
        assert_eq!(page.previous, None);
    }

    #[test]
    fn links_keep_active_filters() {
        let query = query(&[
            ("page", "1"),
            ("limit", "3"),
            ("tags", "vegan"),
            ("is_favorited", "1"),
        ]);
        let page = Page::from_rows(vec![1, 2, 3], 7, 3, 1, "/api/recipes", &query);
        assert_eq!(
            page.next.as_deref(),
            Some("/api/recipes?page=2&limit=3&tags=vegan&is_favorited=1")
        );
    }

    #[test]
    fn repeated_filter_keys_survive_in_links() {
        let query = query(&[("tags", "vegan"), ("tags", "breakfast")]);
        let page = Page::from_rows(vec![4, 5, 6], 7, 3, 2, "/api/recipes", &query);
        assert_eq!(
            page.previous.as_deref(),
            Some("/api/recipes?page=1&limit=3&tags=vegan&tags=breakfast")
        );
    }

    #[test]
    fn filter_values_are_url_encoded() {
        let query = query(&[("name", "сахар ванильный")]);
        let page = Page::from_rows(vec![1], 4, 1, 2, "/api/ingredients", &query);
        let previous = page.previous.unwrap();
        assert!(previous.starts_with("/api/ingredients?page=1&limit=1&name="));
        assert!(!previous.contains(' '));
    }

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(Page::<()>::offset(1, 6), 0);
        assert_eq!(Page::<()>::offset(3, 6), 12);
        assert_eq!(Page::<()>::offset(0, 6), 0);
    }
}
