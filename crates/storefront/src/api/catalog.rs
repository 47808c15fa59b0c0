//! Catalog endpoints, cached via `moka` (5-minute TTL).
//!
//! Search queries bypass the cache; everything else is keyed by its paging
//! and filter parameters.

use tracing::{debug, instrument};

use super::cache::CacheValue;
use super::types::{Category, ListEnvelope, Paginated, Product};
use super::{ApiClient, ApiError};

/// Query parameters for the product list endpoint.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Free-text search. Responses for searches are never cached.
    pub search: Option<String>,
    /// Category slug filter.
    pub category: Option<String>,
    /// Sort key understood by the backend (e.g., `-created_at`, `base_price`).
    pub ordering: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
}

impl ProductQuery {
    fn cache_key(&self) -> String {
        format!(
            "products:{}:{}:{}",
            self.page.unwrap_or(1),
            self.category.as_deref().unwrap_or(""),
            self.ordering.as_deref().unwrap_or("")
        )
    }
}

/// Response shape of `GET /search/suggestions/`.
#[derive(serde::Deserialize)]
struct SuggestionsResponse {
    #[serde(default)]
    suggestions: Vec<String>,
}

impl ApiClient {
    /// Get a page of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, query: &ProductQuery) -> Result<Paginated<Product>, ApiError> {
        let cache_key = query.cache_key();

        // Check cache (search results are not cached)
        if query.search.is_none()
            && let Some(CacheValue::Products(products)) = self.cache().get(&cache_key).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let mut url = self.url("products/")?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(search) = &query.search {
                pairs.append_pair("search", search);
            }
            if let Some(category) = &query.category {
                pairs.append_pair("category", category);
            }
            if let Some(ordering) = &query.ordering {
                pairs.append_pair("ordering", ordering);
            }
            if let Some(page) = query.page {
                pairs.append_pair("page", &page.to_string());
            }
        }

        let page: Paginated<Product> = self.get_json_at(url).await?;

        if query.search.is_none() {
            self.cache()
                .insert(cache_key, CacheValue::Products(page.clone()))
                .await;
        }

        Ok(page)
    }

    /// Get a product by its slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn product(&self, slug: &str) -> Result<Product, ApiError> {
        let cache_key = format!("product:{slug}");

        if let Some(CacheValue::Product(product)) = self.cache().get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self.get_json(&format!("products/{slug}/")).await?;

        self.cache()
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get recommendations for a product. Not cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn product_recommendations(&self, slug: &str) -> Result<Vec<Product>, ApiError> {
        self.get_json(&format!("products/{slug}/recommendations/"))
            .await
    }

    /// Get all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        let cache_key = "categories".to_string();

        if let Some(CacheValue::Categories(categories)) = self.cache().get(&cache_key).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let envelope: ListEnvelope<Category> = self.get_json("categories/").await?;
        let categories = envelope.into_vec();

        self.cache()
            .insert(cache_key, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    /// Get search-box suggestions for a partial query. Not cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(q = %q))]
    pub async fn search_suggestions(&self, q: &str) -> Result<Vec<String>, ApiError> {
        let mut url = self.url("search/suggestions/")?;
        url.query_pairs_mut().append_pair("q", q);

        let response: SuggestionsResponse = self.get_json_at(url).await?;
        Ok(response.suggestions)
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate a cached product.
    pub async fn invalidate_product(&self, slug: &str) {
        self.cache().invalidate(&format!("product:{slug}")).await;
    }

    /// Invalidate all cached catalog data.
    pub async fn invalidate_catalog(&self) {
        self.cache().invalidate_all();
        self.cache().run_pending_tasks().await;
    }
}
