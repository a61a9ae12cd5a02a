/// High-level Printful client: the public operations of the access layer.
///
/// Every read goes through the tiered cache first; only misses (and, for the
/// warmer, staleness) reach the rate-limited dispatcher. Successful upstream
/// fetches are written back through to the entity store.
///
/// Staleness policy: foreground reads serve stale records as-is ("usable but
/// should be refreshed"); only the warmer path forces a refresh. Staleness
/// degrades trust, not availability.
use crate::cache::{CatalogCache, CatalogSnapshot, EntityCache, Lookup};
use crate::config::PrintfulConfig;
use crate::dispatcher::{Dispatcher, ReqwestTransport, Transport, UpstreamResponse};
use crate::endpoints::{Endpoint, EndpointRegistry};
use crate::errors::{ProxyError, ProxyResult};
use crate::logger::{log, LogTag};
use crate::models::{
    Country, CreateSyncProductRequest, Envelope, PrintfileInfo, Product, ProductInfo,
    ShippingRate, ShippingRatesRequest, SyncProduct, SyncProductInfo, TaxInfo, TaxRateRequest,
    VariantInfo,
};
use crate::store::EntityStore;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct PrintfulClient {
    dispatcher: Dispatcher,
    catalog: CatalogCache,
    entities: EntityCache,
    bearer: HeaderValue,
}

impl PrintfulClient {
    pub fn new(
        config: &PrintfulConfig,
        registry: Arc<EndpointRegistry>,
        store: EntityStore,
    ) -> ProxyResult<Self> {
        let transport = Arc::new(ReqwestTransport::new(config.request_timeout_secs)?);
        Self::assemble(transport, registry, store, &config.access_token)
    }

    pub(crate) fn assemble(
        transport: Arc<dyn Transport>,
        registry: Arc<EndpointRegistry>,
        store: EntityStore,
        access_token: &str,
    ) -> ProxyResult<Self> {
        let bearer = HeaderValue::from_str(&format!("Bearer {}", access_token))
            .map_err(|_| ProxyError::Config("access token is not a valid header value".into()))?;
        Ok(Self {
            dispatcher: Dispatcher::new(transport, registry),
            catalog: CatalogCache::new(),
            entities: EntityCache::new(store),
            bearer,
        })
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, self.bearer.clone());
        headers
    }

    async fn request_envelope<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: Endpoint,
        path: &str,
        headers: HeaderMap,
        body: Option<Value>,
    ) -> ProxyResult<T> {
        let response = self
            .dispatcher
            .dispatch(method, endpoint, path, headers, body)
            .await?;
        decode_envelope(&response)
    }

    /// Full catalog listing, refreshed from upstream at most once per
    /// refresh interval. First call always fetches.
    pub async fn get_catalog(&self) -> ProxyResult<Arc<CatalogSnapshot>> {
        if let Some(snapshot) = self.catalog.fresh() {
            return Ok(snapshot);
        }

        log(LogTag::Cache, "INFO", "catalog missing or stale, refreshing from upstream");
        let products: Vec<Product> = self
            .request_envelope(Method::GET, Endpoint::Products, "", HeaderMap::new(), None)
            .await?;
        Ok(self.catalog.replace(products))
    }

    /// Product detail by id. Serves cached records, stale or not; misses
    /// fetch from upstream and write through.
    pub async fn get_product(&self, product_id: i64) -> ProxyResult<ProductInfo> {
        match self.entities.find_product(product_id) {
            Lookup::Found { record, .. } => Ok(record),
            Lookup::NotFound => self.fetch_product(product_id).await,
        }
    }

    /// Freshness-requiring product read, used by the warmer: stale records
    /// are refetched. The flag reports whether upstream was actually hit.
    pub async fn warm_product(&self, product_id: i64) -> ProxyResult<(ProductInfo, bool)> {
        match self.entities.find_product(product_id) {
            Lookup::Found {
                record,
                stale: false,
            } => Ok((record, false)),
            _ => Ok((self.fetch_product(product_id).await?, true)),
        }
    }

    async fn fetch_product(&self, product_id: i64) -> ProxyResult<ProductInfo> {
        let info: ProductInfo = self
            .request_envelope(
                Method::GET,
                Endpoint::Products,
                &format!("/{}", product_id),
                HeaderMap::new(),
                None,
            )
            .await?;
        self.entities.upsert_product(product_id, &info);
        Ok(info)
    }

    /// Variant detail by id; same caching discipline as products.
    pub async fn get_variant(&self, variant_id: i64) -> ProxyResult<VariantInfo> {
        match self.entities.find_variant(variant_id) {
            Lookup::Found { record, .. } => Ok(record),
            Lookup::NotFound => self.fetch_variant(variant_id).await,
        }
    }

    pub async fn warm_variant(&self, variant_id: i64) -> ProxyResult<(VariantInfo, bool)> {
        match self.entities.find_variant(variant_id) {
            Lookup::Found {
                record,
                stale: false,
            } => Ok((record, false)),
            _ => Ok((self.fetch_variant(variant_id).await?, true)),
        }
    }

    async fn fetch_variant(&self, variant_id: i64) -> ProxyResult<VariantInfo> {
        let info: VariantInfo = self
            .request_envelope(
                Method::GET,
                Endpoint::Products,
                &format!("/variant/{}", variant_id),
                HeaderMap::new(),
                None,
            )
            .await?;
        self.entities.upsert_variant(variant_id, &info);
        Ok(info)
    }

    /// Variant keys (including the input) sharing identical print-area
    /// dimensions for `placement`. Three lookups, no extra round trips;
    /// O(variants-in-product).
    pub async fn get_similar_variants(
        &self,
        variant_id: i64,
        placement: &str,
    ) -> ProxyResult<Vec<i64>> {
        let variant_info = self.get_variant(variant_id).await?;
        let product_info = self.get_product(variant_info.product.id).await?;
        let printfiles = self.get_printfiles(variant_info.product.id).await?;

        let reference = printfiles.printfile_for(variant_id, placement);

        let mut similar = Vec::new();
        for variant in &product_info.variants {
            if variant.id == variant_id {
                similar.push(variant.id);
                continue;
            }
            if let (Some(own), Some(other)) =
                (reference, printfiles.printfile_for(variant.id, placement))
            {
                if own.width == other.width && own.height == other.height {
                    similar.push(variant.id);
                }
            }
        }
        Ok(similar)
    }

    /// Printfile map for a product. Dispatched fresh on every call; only the
    /// catalog and entity caches are tiered.
    pub async fn get_printfiles(&self, product_id: i64) -> ProxyResult<PrintfileInfo> {
        self.request_envelope(
            Method::GET,
            Endpoint::MockupGenerator,
            &format!("/printfiles/{}", product_id),
            self.auth_headers(),
            None,
        )
        .await
    }

    /// Mockup templates for a product. Relayed untyped; the proxy neither
    /// keys nor caches templates.
    pub async fn get_templates(&self, product_id: i64) -> ProxyResult<Value> {
        self.request_envelope(
            Method::GET,
            Endpoint::MockupGenerator,
            &format!("/templates/{}", product_id),
            self.auth_headers(),
            None,
        )
        .await
    }

    pub async fn get_countries(&self) -> ProxyResult<Vec<Country>> {
        self.request_envelope(Method::GET, Endpoint::Countries, "", HeaderMap::new(), None)
            .await
    }

    pub async fn get_sync_product(&self, sync_product_id: i64) -> ProxyResult<SyncProductInfo> {
        self.request_envelope(
            Method::GET,
            Endpoint::Store,
            &format!("/products/{}", sync_product_id),
            self.auth_headers(),
            None,
        )
        .await
    }

    pub async fn create_sync_product(
        &self,
        request: &CreateSyncProductRequest,
    ) -> ProxyResult<SyncProduct> {
        let sync_variants: Vec<Value> = request
            .variants
            .iter()
            .map(|variant| {
                json!({
                    "variant_id": variant.variant_id,
                    "external_id": variant.external_id,
                    "retail_price": variant.retail_price,
                    "files": [{"url": variant.file_url}],
                })
            })
            .collect();
        let body = json!({
            "sync_product": {
                "name": request.name,
                "thumbnail": request.thumbnail,
            },
            "sync_variants": sync_variants,
        });

        self.request_envelope(
            Method::POST,
            Endpoint::Store,
            "/products",
            self.auth_headers(),
            Some(body),
        )
        .await
    }

    pub async fn calculate_shipping_rates(
        &self,
        request: &ShippingRatesRequest,
    ) -> ProxyResult<Vec<ShippingRate>> {
        let body = serde_json::to_value(request)?;
        self.request_envelope(
            Method::POST,
            Endpoint::Shipping,
            "/rates",
            self.auth_headers(),
            Some(body),
        )
        .await
    }

    pub async fn calculate_tax_rate(&self, request: &TaxRateRequest) -> ProxyResult<TaxInfo> {
        let body = serde_json::to_value(request)?;
        self.request_envelope(
            Method::POST,
            Endpoint::Tax,
            "/rates",
            self.auth_headers(),
            Some(body),
        )
        .await
    }

    /// Order submission passthrough. Order payloads are relayed untyped;
    /// their schema is the upstream's concern.
    pub async fn create_order(&self, order: Value) -> ProxyResult<Value> {
        self.request_envelope(
            Method::POST,
            Endpoint::Orders,
            "",
            self.auth_headers(),
            Some(order),
        )
        .await
    }
}

/// Decode the `{code, result}` envelope. The code is checked before the
/// result is shaped, so an application-level failure (code != 200) is
/// reported as such rather than as a decode error on its error payload.
fn decode_envelope<T: DeserializeOwned>(response: &UpstreamResponse) -> ProxyResult<T> {
    let envelope: Envelope<Value> =
        serde_json::from_str(&response.body).map_err(|e| ProxyError::Decode(e.to_string()))?;
    if envelope.code != 200 {
        return Err(ProxyError::UpstreamCode {
            code: envelope.code,
        });
    }
    serde_json::from_value(envelope.result).map_err(|e| ProxyError::Decode(e.to_string()))
}
