use vodcat_core::{CatalogError, Result};

/// `[slug, page]` path segments of a listing route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRoute {
    /// Percent-decoded key
    pub slug: String,
    pub page: u32,
}

impl PageRoute {
    pub fn new(slug: impl Into<String>, page: u32) -> Self {
        Self {
            slug: slug.into(),
            page: page.max(1),
        }
    }

    /// Parse raw, still percent-encoded segments
    pub fn parse(slug: &str, page: Option<&str>) -> Result<Self> {
        let slug = urlencoding::decode(slug)
            .map_err(|e| CatalogError::InvalidRequest(format!("bad slug encoding: {}", e)))?;
        Self::decoded(&slug, page)
    }

    /// Build from segments the router has already decoded. A missing, unparseable or zero page
    /// is page 1.
    pub fn decoded(slug: &str, page: Option<&str>) -> Result<Self> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Err(CatalogError::InvalidRequest("missing slug".to_string()));
        }

        let page = page
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(1);

        Ok(Self {
            slug: slug.to_string(),
            page,
        })
    }

    /// Parse `slug[/page]`
    pub fn from_path(path: &str) -> Result<Self> {
        let mut segments = path.trim_matches('/').splitn(2, '/');
        let slug = segments.next().unwrap_or_default();
        Self::parse(slug, segments.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults() {
        assert_eq!(PageRoute::parse("horror", None).unwrap().page, 1);
        assert_eq!(PageRoute::parse("horror", Some("abc")).unwrap().page, 1);
        assert_eq!(PageRoute::parse("horror", Some("0")).unwrap().page, 1);
        assert_eq!(PageRoute::parse("horror", Some("5")).unwrap().page, 5);
    }

    #[test]
    fn test_slug_is_decoded() {
        let route = PageRoute::from_path("/%E5%B1%B1%E7%94%B0%E8%8A%B1%E5%AD%90/2").unwrap();
        assert_eq!(route.slug, "山田花子");
        assert_eq!(route.page, 2);
    }

    #[test]
    fn test_decoded_segments_are_taken_verbatim() {
        let route = PageRoute::decoded("100%", Some("2")).unwrap();
        assert_eq!(route.slug, "100%");
        assert_eq!(route.page, 2);
    }

    #[test]
    fn test_missing_slug() {
        assert!(PageRoute::from_path("/").is_err());
        assert!(PageRoute::parse("%20", None).is_err());
    }
}
