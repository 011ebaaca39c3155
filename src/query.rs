//! Search parameters and their query-string encoding.
//!
//! A [`Query`] is built once with chained setters and rendered with
//! [`Query::to_query_string`] before each search request. Only parameters
//! that differ from their default are emitted, always in the same order.
//!
//! ```rust
//! use algoliasearch::{Query, QueryType};
//!
//! let query = Query::with_text("jimmie paint")
//!     .attributes_to_retrieve(["firstname", "lastname"])
//!     .hits_per_page(50)
//!     .query_type(QueryType::PrefixAll);
//!
//! assert_eq!(
//!     query.to_query_string(),
//!     "attributes=firstname%2Clastname&hitsPerPage=50&query=jimmie%20paint&queryType=prefixAll"
//! );
//! ```

use std::fmt;

use serde_json::Value;

const DEFAULT_MIN_WORD_SIZE_FOR_1_TYPO: u32 = 3;
const DEFAULT_MIN_WORD_SIZE_FOR_2_TYPOS: u32 = 7;
const DEFAULT_HITS_PER_PAGE: u32 = 20;

/// How query words are interpreted as prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueryType {
    /// Every query word is a prefix.
    PrefixAll,
    /// Only the last word is a prefix.
    #[default]
    PrefixLast,
    /// No word is a prefix. Not recommended.
    PrefixNone,
}

impl QueryType {
    fn param(&self) -> Option<&'static str> {
        match self {
            QueryType::PrefixAll => Some("prefixAll"),
            QueryType::PrefixLast => None,
            QueryType::PrefixNone => Some("prefixNone"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct BoundingBox {
    lat1: f64,
    lng1: f64,
    lat2: f64,
    lng2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct AroundLatLng {
    lat: f64,
    lng: f64,
    radius: u32,
    precision: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    attributes: Option<Vec<String>>,
    attributes_to_highlight: Option<Vec<String>>,
    attributes_to_snippet: Option<Vec<String>>,
    min_word_size_for_1_typo: u32,
    min_word_size_for_2_typos: u32,
    get_ranking_info: bool,
    distinct: bool,
    page: u32,
    hits_per_page: u32,
    tag_filters: Option<String>,
    numeric_filters: Option<String>,
    inside_bounding_box: Option<BoundingBox>,
    around_lat_lng: Option<AroundLatLng>,
    query: Option<String>,
    facets: Option<String>,
    facet_filters: Option<String>,
    max_number_of_facets: u32,
    optional_words: Option<String>,
    query_type: QueryType,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            attributes: None,
            attributes_to_highlight: None,
            attributes_to_snippet: None,
            min_word_size_for_1_typo: DEFAULT_MIN_WORD_SIZE_FOR_1_TYPO,
            min_word_size_for_2_typos: DEFAULT_MIN_WORD_SIZE_FOR_2_TYPOS,
            get_ranking_info: false,
            distinct: false,
            page: 0,
            hits_per_page: DEFAULT_HITS_PER_PAGE,
            tag_filters: None,
            numeric_filters: None,
            inside_bounding_box: None,
            around_lat_lng: None,
            query: None,
            facets: None,
            facet_filters: None,
            max_number_of_facets: 0,
            optional_words: None,
            query_type: QueryType::default(),
        }
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new().text(text)
    }

    /// Sets the full-text query.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.query = Some(text.into());
        self
    }

    pub fn query_type(mut self, query_type: QueryType) -> Self {
        self.query_type = query_type;
        self
    }

    /// Attributes to return in hits. All attributes are returned when unset.
    pub fn attributes_to_retrieve<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = Some(collect(attributes));
        self
    }

    /// Attributes to highlight. Indexed attributes are highlighted when unset.
    pub fn attributes_to_highlight<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes_to_highlight = Some(collect(attributes));
        self
    }

    /// Attributes to snippet, each as `attributeName:nbWords`.
    pub fn attributes_to_snippet<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes_to_snippet = Some(collect(attributes));
        self
    }

    pub fn min_word_size_to_allow_one_typo(mut self, chars: u32) -> Self {
        self.min_word_size_for_1_typo = chars;
        self
    }

    pub fn min_word_size_to_allow_two_typos(mut self, chars: u32) -> Self {
        self.min_word_size_for_2_typos = chars;
        self
    }

    /// Adds `_rankingInfo` to every hit.
    pub fn get_ranking_info(mut self, enabled: bool) -> Self {
        self.get_ranking_info = enabled;
        self
    }

    /// Drops hits sharing a value of the index's `attributeForDistinct`.
    pub fn distinct(mut self, enabled: bool) -> Self {
        self.distinct = enabled;
        self
    }

    /// Zero-based page to retrieve.
    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Zero leaves the server default in place.
    pub fn hits_per_page(mut self, hits_per_page: u32) -> Self {
        self.hits_per_page = hits_per_page;
        self
    }

    /// Tag filter expression: `tag1,(tag2,tag3)` means tag1 AND (tag2 OR tag3).
    pub fn tag_filters(mut self, tags: impl Into<String>) -> Self {
        self.tag_filters = Some(tags.into());
        self
    }

    /// Numeric filter expression such as `price>100,price<1000`.
    pub fn numeric_filters(mut self, numerics: impl Into<String>) -> Self {
        self.numeric_filters = Some(numerics.into());
        self
    }

    pub fn numeric_filter_list<I, S>(mut self, numerics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numeric_filters = Some(collect(numerics).join(","));
        self
    }

    /// Restricts hits to a rectangle given by two opposite corners.
    ///
    /// Takes priority over [`Query::around_lat_lng`] when both are set.
    pub fn inside_bounding_box(mut self, lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> Self {
        self.inside_bounding_box = Some(BoundingBox {
            lat1,
            lng1,
            lat2,
            lng2,
        });
        self
    }

    /// Restricts hits to `radius` meters around a point.
    pub fn around_lat_lng(mut self, lat: f64, lng: f64, radius: u32) -> Self {
        self.around_lat_lng = Some(AroundLatLng {
            lat,
            lng,
            radius,
            precision: None,
        });
        self
    }

    /// Like [`Query::around_lat_lng`]; hits closer than `precision` meters to
    /// each other rank as equally distant.
    pub fn around_lat_lng_with_precision(
        mut self,
        lat: f64,
        lng: f64,
        radius: u32,
        precision: u32,
    ) -> Self {
        self.around_lat_lng = Some(AroundLatLng {
            lat,
            lng,
            radius,
            precision: Some(precision),
        });
        self
    }

    /// Facets to compute, `*` for every faceted attribute.
    pub fn facets<I, S>(mut self, facets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facets = Some(json_array(facets));
        self
    }

    /// Facet filters, each as `attributeName:value`.
    pub fn facet_filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facet_filters = Some(json_array(filters));
        self
    }

    /// Zero leaves the server default in place.
    pub fn max_number_of_facets(mut self, max: u32) -> Self {
        self.max_number_of_facets = max;
        self
    }

    /// Comma-separated words treated as optional.
    pub fn optional_words(mut self, words: impl Into<String>) -> Self {
        self.optional_words = Some(words.into());
        self
    }

    pub fn optional_word_list<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.optional_words = Some(collect(words).join(","));
        self
    }

    /// Renders the parameters as an ampersand-joined query string without a
    /// leading `?`. Empty when every parameter is at its default.
    pub fn to_query_string(&self) -> String {
        let mut params: Vec<String> = Vec::new();

        if let Some(attributes) = &self.attributes {
            params.push(format!("attributes={}", encode_list(attributes)));
        }
        if let Some(attributes) = &self.attributes_to_highlight {
            params.push(format!("attributesToHighlight={}", encode_list(attributes)));
        }
        if let Some(attributes) = &self.attributes_to_snippet {
            params.push(format!("attributesToSnippet={}", encode_list(attributes)));
        }
        if self.min_word_size_for_1_typo != DEFAULT_MIN_WORD_SIZE_FOR_1_TYPO {
            params.push(format!(
                "minWordSizefor1Typo={}",
                self.min_word_size_for_1_typo
            ));
        }
        if self.min_word_size_for_2_typos != DEFAULT_MIN_WORD_SIZE_FOR_2_TYPOS {
            params.push(format!(
                "minWordSizefor2Typos={}",
                self.min_word_size_for_2_typos
            ));
        }
        if self.get_ranking_info {
            params.push("getRankingInfo=1".to_string());
        }
        if self.distinct {
            params.push("distinct=1".to_string());
        }
        if self.page > 0 {
            params.push(format!("page={}", self.page));
        }
        if self.hits_per_page > 0 && self.hits_per_page != DEFAULT_HITS_PER_PAGE {
            params.push(format!("hitsPerPage={}", self.hits_per_page));
        }
        if let Some(tags) = &self.tag_filters {
            params.push(format!("tagFilters={}", urlencoding::encode(tags)));
        }
        if let Some(numerics) = &self.numeric_filters {
            params.push(format!("numericFilters={}", urlencoding::encode(numerics)));
        }
        if let Some(bbox) = &self.inside_bounding_box {
            params.push(format!(
                "insideBoundingBox={},{},{},{}",
                bbox.lat1, bbox.lng1, bbox.lat2, bbox.lng2
            ));
        } else if let Some(around) = &self.around_lat_lng {
            let mut geo = format!(
                "aroundLatLng={},{}&aroundRadius={}",
                around.lat, around.lng, around.radius
            );
            if let Some(precision) = around.precision {
                geo.push_str(&format!("&aroundPrecision={precision}"));
            }
            params.push(geo);
        }
        if let Some(query) = &self.query {
            params.push(format!("query={}", urlencoding::encode(query)));
        }
        if let Some(facets) = &self.facets {
            params.push(format!("facets={}", urlencoding::encode(facets)));
        }
        if let Some(filters) = &self.facet_filters {
            params.push(format!("facetFilters={}", urlencoding::encode(filters)));
        }
        if self.max_number_of_facets > 0 {
            params.push(format!("maxNumberOfFacets={}", self.max_number_of_facets));
        }
        if let Some(words) = &self.optional_words {
            params.push(format!("optionalWords={}", urlencoding::encode(words)));
        }
        if let Some(query_type) = self.query_type.param() {
            params.push(format!("queryType={query_type}"));
        }

        params.join("&")
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

fn collect<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

fn json_array<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Value::from(collect(items)).to_string()
}

fn encode_list(items: &[String]) -> String {
    urlencoding::encode(&items.join(",")).into_owned()
}
