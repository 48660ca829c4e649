//! A client for fetching crypto spot prices from the CoinGecko API.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::{AppState, Error};

const COINGECKO_API: &str = "https://api.coingecko.com/api/v3";

/// How long a fetched price is served from the cache before it is considered
/// stale.
const CACHE_TTL: Duration = Duration::from_secs(60);

/// The timeout for a single price API request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// A client for looking up the spot price of cryptocurrencies.
///
/// Prices are quoted in USD and cached for a short period so that refreshing
/// a page full of holdings does not hammer the API.
#[derive(Debug, Clone)]
pub struct PriceClient {
    http_client: reqwest::Client,
    base_url: String,
    cache: Arc<Mutex<HashMap<String, CachedPrice>>>,
}

#[derive(Debug, Clone, Copy)]
struct CachedPrice {
    price: f64,
    fetched_at: Instant,
}

impl PriceClient {
    /// Create a price client that talks to the public CoinGecko API.
    pub fn new() -> Self {
        Self::with_base_url(COINGECKO_API)
    }

    /// Create a price client that talks to the API at `base_url`.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get the USD spot price for a single coin.
    ///
    /// # Errors
    /// Returns an error if the API cannot be reached or has no price for
    /// `coin_id`.
    pub async fn get_price(&self, coin_id: &str) -> Result<f64, Error> {
        let prices = self.get_prices(&[coin_id.to_owned()]).await?;

        prices
            .get(coin_id)
            .copied()
            .ok_or_else(|| Error::PriceNotFound(coin_id.to_owned()))
    }

    /// Get the USD spot prices for a batch of coins.
    ///
    /// Prices that were fetched within the last minute are served from the
    /// cache, the rest are fetched in a single API request.
    ///
    /// Coins the API has no price for are omitted from the result.
    ///
    /// # Errors
    /// Returns [Error::PriceApi] if the API cannot be reached or returns an
    /// unusable response.
    pub async fn get_prices(&self, coin_ids: &[String]) -> Result<HashMap<String, f64>, Error> {
        let mut prices = HashMap::new();
        let mut to_fetch = Vec::new();

        {
            let cache = self
                .cache
                .lock()
                .map_err(|error| Error::PriceApi(error.to_string()))?;

            for coin_id in coin_ids {
                match cache.get(coin_id) {
                    Some(cached) if cached.fetched_at.elapsed() < CACHE_TTL => {
                        prices.insert(coin_id.clone(), cached.price);
                    }
                    _ => to_fetch.push(coin_id.clone()),
                }
            }
        }

        if to_fetch.is_empty() {
            return Ok(prices);
        }

        let fetched = self.fetch_prices(&to_fetch).await?;

        let mut cache = self
            .cache
            .lock()
            .map_err(|error| Error::PriceApi(error.to_string()))?;

        for coin_id in &to_fetch {
            let Some(price) = fetched
                .get(coin_id)
                .and_then(|quotes| quotes.get("usd"))
                .copied()
            else {
                continue;
            };

            cache.insert(
                coin_id.clone(),
                CachedPrice {
                    price,
                    fetched_at: Instant::now(),
                },
            );
            prices.insert(coin_id.clone(), price);
        }

        Ok(prices)
    }

    async fn fetch_prices(
        &self,
        coin_ids: &[String],
    ) -> Result<HashMap<String, HashMap<String, f64>>, Error> {
        let url = format!("{}/simple/price", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("ids", coin_ids.join(",")), ("vs_currencies", "usd".to_owned())])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|error| Error::PriceApi(error.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::PriceApi(format!(
                "the price API responded with status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|error| Error::PriceApi(error.to_string()))
    }
}

impl Default for PriceClient {
    fn default() -> Self {
        Self::new()
    }
}

/// The state needed for the crypto price lookup endpoints.
#[derive(Debug, Clone)]
pub struct CryptoPriceState {
    pub price_client: PriceClient,
}

impl FromRef<AppState> for CryptoPriceState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            price_client: state.price_client.clone(),
        }
    }
}

/// The query parameters for a single coin price lookup.
#[derive(Debug, Deserialize)]
pub struct CryptoPriceQuery {
    /// The CoinGecko ID of the coin to look up.
    pub coin_id: String,
}

/// The response body for a single coin price lookup.
#[derive(Debug, Serialize)]
pub struct CryptoPriceResponse {
    /// The CoinGecko ID of the coin.
    pub coin_id: String,
    /// The USD spot price.
    pub price: f64,
}

/// The request body for a batch price lookup.
#[derive(Debug, Deserialize)]
pub struct CryptoPricesRequest {
    /// The CoinGecko IDs of the coins to look up.
    pub coin_ids: Vec<String>,
}

/// The response body for a batch price lookup.
#[derive(Debug, Serialize)]
pub struct CryptoPricesResponse {
    /// The USD spot price for each requested coin.
    pub prices: HashMap<String, f64>,
}

/// A route handler that returns the USD spot price of one coin as JSON.
pub async fn get_crypto_price(
    State(state): State<CryptoPriceState>,
    Query(query): Query<CryptoPriceQuery>,
) -> Result<Json<CryptoPriceResponse>, Error> {
    let price = state
        .price_client
        .get_price(&query.coin_id)
        .await
        .inspect_err(|error| tracing::error!("Failed to fetch price: {error}"))?;

    Ok(Json(CryptoPriceResponse {
        coin_id: query.coin_id,
        price,
    }))
}

/// A route handler that returns the USD spot prices of a batch of coins as
/// JSON.
pub async fn post_crypto_prices(
    State(state): State<CryptoPriceState>,
    Json(request): Json<CryptoPricesRequest>,
) -> Result<Json<CryptoPricesResponse>, Error> {
    let prices = state
        .price_client
        .get_prices(&request.coin_ids)
        .await
        .inspect_err(|error| tracing::error!("Failed to fetch prices: {error}"))?;

    Ok(Json(CryptoPricesResponse { prices }))
}

#[cfg(test)]
mod price_client_tests {
    use std::collections::HashMap;

    use axum::{Json, Router, extract::Query, routing::get};
    use serde_json::json;

    use crate::Error;

    use super::PriceClient;

    async fn spawn_price_api(prices: HashMap<&'static str, f64>) -> String {
        let router = Router::new().route(
            "/simple/price",
            get(move |Query(query): Query<HashMap<String, String>>| {
                let ids = query.get("ids").cloned().unwrap_or_default();
                let body = ids
                    .split(',')
                    .filter_map(|coin_id| {
                        prices
                            .get(coin_id)
                            .map(|price| (coin_id.to_owned(), json!({ "usd": price })))
                    })
                    .collect::<serde_json::Map<_, _>>();

                async move { Json(serde_json::Value::Object(body)) }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Could not bind test listener");
        let address = listener.local_addr().expect("Could not get local address");

        tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Test price API stopped");
        });

        format!("http://{address}")
    }

    #[tokio::test]
    async fn fetches_price_for_coin() {
        let base_url = spawn_price_api(HashMap::from([("bitcoin", 60000.0)])).await;
        let client = PriceClient::with_base_url(&base_url);

        let price = client.get_price("bitcoin").await.unwrap();

        assert_eq!(price, 60000.0);
    }

    #[tokio::test]
    async fn fetches_prices_for_batch() {
        let base_url =
            spawn_price_api(HashMap::from([("bitcoin", 60000.0), ("ethereum", 3000.0)])).await;
        let client = PriceClient::with_base_url(&base_url);

        let prices = client
            .get_prices(&["bitcoin".to_owned(), "ethereum".to_owned()])
            .await
            .unwrap();

        assert_eq!(prices.get("bitcoin"), Some(&60000.0));
        assert_eq!(prices.get("ethereum"), Some(&3000.0));
    }

    #[tokio::test]
    async fn unknown_coin_returns_price_not_found() {
        let base_url = spawn_price_api(HashMap::from([("bitcoin", 60000.0)])).await;
        let client = PriceClient::with_base_url(&base_url);

        let result = client.get_price("dogecoin").await;

        assert_eq!(result, Err(Error::PriceNotFound("dogecoin".to_owned())));
    }

    #[tokio::test]
    async fn unreachable_api_returns_price_api_error() {
        // A port nothing is listening on.
        let client = PriceClient::with_base_url("http://127.0.0.1:1");

        let result = client.get_price("bitcoin").await;

        assert!(matches!(result, Err(Error::PriceApi(_))));
    }

    #[tokio::test]
    async fn cached_prices_are_served_without_the_api() {
        let base_url = spawn_price_api(HashMap::from([("bitcoin", 60000.0)])).await;
        let client = PriceClient::with_base_url(&base_url);

        client.get_price("bitcoin").await.unwrap();

        // Swap in an unreachable base URL, the cached price must still be
        // returned.
        let offline_client = PriceClient {
            base_url: "http://127.0.0.1:1".to_owned(),
            ..client
        };
        let price = offline_client.get_price("bitcoin").await.unwrap();

        assert_eq!(price, 60000.0);
    }
}
