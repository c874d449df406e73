use std::str::FromStr;

use super::error::TypeError;

/// Raw query pairs as decoded from the URL; keys may repeat.
pub type QueryData = Vec<(String, String)>;

/// Loosely-typed accessor over query parameters. Absent keys are `None`,
/// present-but-malformed values are errors.
pub struct QueryForm {
    inner: QueryData,
}

impl QueryForm {
    pub fn from_data(data: QueryData) -> Self {
        Self { inner: data }
    }

    /// The raw pairs, for carrying active parameters into pagination links.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.inner
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<String> {
        self.inner
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.to_owned())
            .collect()
    }

    pub fn get_number<T>(&self, key: &str) -> Result<Option<T>, TypeError>
    where
        T: FromStr,
    {
        match self.get_str(key) {
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_e| TypeError::new("Invalid numeric parameter")),
            None => Ok(None),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, TypeError> {
        match self.get_str(key) {
            Some("1") | Some("true") | Some("True") => Ok(Some(true)),
            Some("0") | Some("false") | Some("False") => Ok(Some(false)),
            Some(_) => Err(TypeError::new("Invalid boolean parameter")),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> QueryForm {
        QueryForm::from_data(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn repeated_keys_collect_in_order() {
        let form = form(&[("tags", "breakfast"), ("page", "2"), ("tags", "vegan")]);
        assert_eq!(form.get_all("tags"), vec!["breakfast", "vegan"]);
        assert_eq!(form.get_str("tags"), Some("breakfast"));
    }

    #[test]
    fn numbers_parse_or_error() {
        let form = form(&[("page", "3"), ("limit", "x")]);
        assert_eq!(form.get_number::<i64>("page").unwrap(), Some(3));
        assert!(form.get_number::<i64>("limit").is_err());
        assert_eq!(form.get_number::<i64>("missing").unwrap(), None);
    }

    #[test]
    fn booleans_accept_numeric_and_word_forms() {
        assert!(form(&[("flag", "maybe")]).get_bool("flag").is_err());

        let query = form(&[("is_favorited", "1"), ("is_in_shopping_cart", "False")]);
        assert_eq!(query.get_bool("is_favorited").unwrap(), Some(true));
        assert_eq!(query.get_bool("is_in_shopping_cart").unwrap(), Some(false));
        assert_eq!(query.get_bool("missing").unwrap(), None);
    }
}
