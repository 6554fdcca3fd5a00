//! Query-string builder for the content backend
//!
//! The backend reads nested filter/pagination/field/populate parameters in bracket notation,
//! e.g. `filters[category][id][$eq]=3&pagination[page]=1&fields[0]=originalname`. Keys are
//! emitted verbatim and only values are percent-encoded.

use vodcat_core::PageRequest;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrapiQuery {
    pairs: Vec<(String, String)>,
}

impl StrapiQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// `filters[path..][op]=value`
    pub fn filter(mut self, path: &[&str], op: &str, value: impl ToString) -> Self {
        let key = format!("filters{}[{}]", brackets(path), op);
        self.pairs.push((key, value.to_string()));
        self
    }

    pub fn filter_eq(self, path: &[&str], value: impl ToString) -> Self {
        self.filter(path, "$eq", value)
    }

    /// `filters[path..][$in][i]=value` for every value
    pub fn filter_in<T: ToString>(mut self, path: &[&str], values: &[T]) -> Self {
        let prefix = format!("filters{}[$in]", brackets(path));
        for (i, value) in values.iter().enumerate() {
            self.pairs.push((format!("{}[{}]", prefix, i), value.to_string()));
        }
        self
    }

    pub fn page(mut self, request: PageRequest) -> Self {
        self.pairs
            .push(("pagination[page]".to_string(), request.page().to_string()));
        self.pairs.push((
            "pagination[pageSize]".to_string(),
            request.page_size().to_string(),
        ));
        self
    }

    /// At most `limit` items, no page arithmetic
    pub fn limit(mut self, limit: u32) -> Self {
        self.pairs
            .push(("pagination[limit]".to_string(), limit.to_string()));
        self
    }

    pub fn fields(mut self, fields: &[&str]) -> Self {
        for (i, field) in fields.iter().enumerate() {
            self.pairs.push((format!("fields[{}]", i), field.to_string()));
        }
        self
    }

    /// `populate[relation][fields][i]=field`
    pub fn populate_fields(mut self, relation: &str, fields: &[&str]) -> Self {
        for (i, field) in fields.iter().enumerate() {
            self.pairs.push((
                format!("populate[{}][fields][{}]", relation, i),
                field.to_string(),
            ));
        }
        self
    }

    /// `populate[relation][populate][i]=nested`
    pub fn populate_nested(mut self, relation: &str, nested: &[&str]) -> Self {
        for (i, inner) in nested.iter().enumerate() {
            self.pairs.push((
                format!("populate[{}][populate][{}]", relation, i),
                inner.to_string(),
            ));
        }
        self
    }

    /// `populate=*`
    pub fn populate_all(mut self) -> Self {
        self.pairs.push(("populate".to_string(), "*".to_string()));
        self
    }

    /// Appends `sort[i]=order`, e.g. `createdAt:desc`
    pub fn sort(mut self, order: &str) -> Self {
        let index = self
            .pairs
            .iter()
            .filter(|(key, _)| key.starts_with("sort["))
            .count();
        self.pairs
            .push((format!("sort[{}]", index), order.to_string()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Values of every key starting with `prefix`, in insertion order
    pub fn values_with_prefix(&self, prefix: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn brackets(path: &[&str]) -> String {
    path.iter().map(|segment| format!("[{}]", segment)).collect()
}
