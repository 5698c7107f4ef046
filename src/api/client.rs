// ============================================================================
// API Client : optimiseur de portefeuille
// ============================================================================
// Appelle l'API REST distante qui exécute l'optimisation QAOA
//
// Endpoints :
// - GET  /health                        : état du service
// - GET  /api/stocks                    : actions disponibles
// - GET  /api/stocks/search             : recherche par ticker ou nom
// - GET  /api/stocks/{ticker}/metrics   : métriques historiques d'une action
// - POST /api/optimize                  : lance l'optimisation
//
// CONCEPTS RUST :
// 1. async/await : appels réseau non-bloquants
// 2. anyhow::Context : messages d'erreur avec contexte
// 3. #[instrument] : spans tracing automatiques
// ============================================================================

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument, warn};

use crate::config::Config;
use crate::models::{
    demo_stocks, ApiErrorBody, HealthStatus, OptimizationRequest, OptimizationResponse,
    SearchResponse, StockInfo, StockListResponse, TickerMetrics,
};

/// Nombre de résultats demandés à la recherche
pub const SEARCH_LIMIT: usize = 10;

/// Client de l'API d'optimisation
///
/// CONCEPT : Un seul reqwest::Client réutilisé
/// - Garde le pool de connexions entre les appels
/// - Clone bon marché (Arc interne)
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

/// Origine de la liste d'actions affichée
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockSource {
    /// Liste renvoyée par l'API
    Api,
    /// Liste de démo (API injoignable)
    Demo,
}

impl ApiClient {
    /// Crée le client à partir de la configuration
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("qfolio/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build the HTTP client")?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL de base utilisée par le client
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Récupère la liste des actions disponibles
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn fetch_stocks(&self) -> Result<Vec<StockInfo>> {
        let url = self.url("/api/stocks");
        debug!(url = %url, "Fetching stock list");

        let response: StockListResponse = self.get_json(&url).await?;

        info!(count = response.stocks.len(), "Loaded stocks");
        Ok(response.stocks)
    }

    /// Recherche des actions par ticker ou nom
    ///
    /// Une requête vide ne déclenche pas d'appel
    #[instrument(skip(self))]
    pub async fn search_stocks(&self, query: &str, limit: usize) -> Result<Vec<StockInfo>> {
        let query = query.trim();
        if query.is_empty() {
            debug!("Empty search query, skipping request");
            return Ok(Vec::new());
        }

        let response = self
            .http
            .get(self.url("/api/stocks/search"))
            .query(&[("query", query.to_string()), ("limit", limit.to_string())])
            .send()
            .await
            .context("Search request failed")?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, "Search returned error status");
            anyhow::bail!("HTTP error! status: {}", status.as_u16());
        }

        let results: SearchResponse = response
            .json()
            .await
            .context("Failed to parse search response")?;

        debug!(count = results.stocks.len(), query = %results.query, "Search completed");
        Ok(results.stocks)
    }

    /// Envoie la requête d'optimisation et attend le résultat
    ///
    /// En cas d'erreur HTTP, le message vient du champ "detail" de la réponse
    #[instrument(skip(self, request), fields(stocks = request.stocks.len(), k = request.k))]
    pub async fn optimize(&self, request: &OptimizationRequest) -> Result<OptimizationResponse> {
        let url = self.url("/api/optimize");
        info!(?request, "Starting optimization");

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .context("Failed to reach the optimization API")?;

        let status = response.status();
        debug!(status = %status, "Received optimization response");

        if !status.is_success() {
            let message = error_message(status, response.text().await.unwrap_or_default());
            error!(status = %status, message = %message, "Optimization rejected");
            anyhow::bail!(message);
        }

        let result: OptimizationResponse = response
            .json()
            .await
            .context("Failed to parse optimization response")?;

        info!(
            selected = ?result.portfolio.selected_stocks,
            seconds = result.computation_time,
            "Optimization complete"
        );
        Ok(result)
    }

    /// Vérifie l'état du service
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<HealthStatus> {
        self.get_json(&self.url("/health")).await
    }

    /// Métriques historiques d'une action
    ///
    /// Le ticker est encodé comme segment de chemin ('/', '?', '#' compris)
    #[instrument(skip(self))]
    pub async fn stock_metrics(&self, ticker: &str) -> Result<TickerMetrics> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("Invalid API URL: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("API URL cannot be a base: {}", self.base_url))?
            .pop_if_empty()
            .extend(["api", "stocks", ticker, "metrics"]);

        self.get_json(url.as_str()).await
    }

    /// GET + vérification du statut + parsing JSON
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("HTTP request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, url = %url, "API returned error status");
            anyhow::bail!("HTTP error! status: {}", status.as_u16());
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON from {}", url))
    }
}

/// Message d'erreur d'une réponse non-2xx de /api/optimize
fn error_message(status: StatusCode, body: String) -> String {
    serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|b| b.message())
        .unwrap_or_else(|| {
            debug!(status = %status, "No detail in error body");
            "Optimization failed".to_string()
        })
}

/// Charge les actions depuis l'API, ou la liste de démo en cas d'échec
///
/// CONCEPT : Dégradation gracieuse
/// - L'appelant affiche un toast quand la source est StockSource::Demo
pub async fn load_stocks_or_demo(client: &ApiClient) -> (Vec<StockInfo>, StockSource) {
    match client.fetch_stocks().await {
        Ok(stocks) => (stocks, StockSource::Api),
        Err(e) => {
            error!(error = ?e, "Failed to load stocks, falling back to demo data");
            (demo_stocks(), StockSource::Demo)
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serveur HTTP minimal : répond une seule fois et renvoie la requête reçue
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut data = Vec::new();
            let mut buf = [0u8; 4096];

            // Lit les headers puis le corps selon Content-Length
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                data.extend_from_slice(&buf[..n]);

                let text = String::from_utf8_lossy(&data).to_string();
                if let Some(pos) = text.find("\r\n\r\n") {
                    let content_length = text[..pos]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .and_then(|v| v.trim().parse::<usize>().ok())
                        })
                        .unwrap_or(0);
                    if data.len() >= pos + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            let _ = tx.send(String::from_utf8_lossy(&data).to_string());
        });

        (format!("http://{}", addr), rx)
    }

    fn client_for(url: &str) -> ApiClient {
        ApiClient::new(&Config::default().with_api_url(url)).unwrap()
    }

    #[test]
    fn test_base_url_has_no_trailing_slash() {
        let client = client_for("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_fetch_stocks() {
        let (url, request) = serve_once(
            "200 OK",
            r#"{"stocks":[{"ticker":"TCS","name":"Tata Consultancy Services","sector":"IT","symbol":"TCS.NS"}],"count":1}"#,
        )
        .await;

        let stocks = client_for(&url).fetch_stocks().await.unwrap();
        assert_eq!(stocks.len(), 1);
        assert_eq!(stocks[0].ticker, "TCS");

        let raw = request.await.unwrap();
        assert!(raw.starts_with("GET /api/stocks HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_fetch_stocks_http_error() {
        let (url, _request) = serve_once("503 Service Unavailable", "{}").await;
        let err = client_for(&url).fetch_stocks().await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP error! status: 503");
    }

    #[tokio::test]
    async fn test_search_encodes_query() {
        let (url, request) = serve_once(
            "200 OK",
            r#"{"stocks":[{"ticker":"LT","name":"Larsen & Toubro","sector":"Infrastructure","symbol":"LT.NS"}],"count":1,"query":"L&T"}"#,
        )
        .await;

        let stocks = client_for(&url).search_stocks("L&T", SEARCH_LIMIT).await.unwrap();
        assert_eq!(stocks[0].name, "Larsen & Toubro");

        let raw = request.await.unwrap();
        assert!(raw.starts_with("GET /api/stocks/search?query=L%26T&limit=10 "));
    }

    #[tokio::test]
    async fn test_search_empty_query_skips_request() {
        let client = client_for("http://127.0.0.1:1");
        let stocks = client.search_stocks("   ", SEARCH_LIMIT).await.unwrap();
        assert!(stocks.is_empty());
    }

    #[tokio::test]
    async fn test_optimize_posts_json() {
        let (url, request) = serve_once(
            "200 OK",
            r#"{"success":true,
                "portfolio":{"selected_stocks":["TCS","INFY"],"num_selected":2,"expected_return":0.2,"portfolio_risk":0.1,"sharpe_ratio":1.5,"weights":[0.5,0.5]},
                "qaoa_metrics":{"num_qubits":3,"circuit_depth":9,"qaoa_layers":1,"iterations":50,"optimal_cost":-0.3},
                "stock_metrics":{"TCS":{"expected_return":0.2,"volatility":0.1,"selected":true}},
                "computation_time":1.25}"#,
        )
        .await;

        let req = OptimizationRequest {
            stocks: vec!["TCS".into(), "INFY".into(), "LT".into()],
            k: 2,
            lambda_param: 0.5,
            p: 1,
            maxiter: 50,
            shots: 1024,
        };

        let result = client_for(&url).optimize(&req).await.unwrap();
        assert_eq!(result.portfolio.selected_stocks, vec!["TCS", "INFY"]);
        assert_eq!(result.qaoa_metrics.num_qubits, 3);

        let raw = request.await.unwrap();
        assert!(raw.starts_with("POST /api/optimize HTTP/1.1"));
        assert!(raw.contains(r#""stocks":["TCS","INFY","LT"]"#));
        assert!(raw.contains(r#""lambda_param":0.5"#));
    }

    #[tokio::test]
    async fn test_optimize_error_uses_detail() {
        let (url, _request) = serve_once(
            "400 Bad Request",
            r#"{"detail":"k (5) cannot exceed number of stocks (3)"}"#,
        )
        .await;

        let req = OptimizationRequest {
            stocks: vec!["TCS".into(), "INFY".into(), "LT".into()],
            k: 5,
            lambda_param: 0.5,
            p: 1,
            maxiter: 50,
            shots: 1024,
        };

        let err = client_for(&url).optimize(&req).await.unwrap_err();
        assert_eq!(err.to_string(), "k (5) cannot exceed number of stocks (3)");
    }

    #[test]
    fn test_error_message_fallback() {
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, "not json".to_string()),
            "Optimization failed"
        );
    }

    #[tokio::test]
    async fn test_load_stocks_falls_back_to_demo() {
        // Port 1 : connexion refusée
        let client = client_for("http://127.0.0.1:1");
        let (stocks, source) = load_stocks_or_demo(&client).await;
        assert_eq!(source, StockSource::Demo);
        assert_eq!(stocks.len(), 10);
    }

    #[tokio::test]
    async fn test_stock_metrics_encodes_ticker() {
        let (url, request) = serve_once(
            "200 OK",
            r#"{"ticker":"A/B?C","expected_return":0.12,"volatility":0.2,"sharpe_ratio":0.6}"#,
        )
        .await;

        let metrics = client_for(&url).stock_metrics("A/B?C").await.unwrap();
        assert_eq!(metrics.ticker, "A/B?C");

        let raw = request.await.unwrap();
        assert!(raw.starts_with("GET /api/stocks/A%2FB%3FC/metrics HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_health() {
        let (url, request) = serve_once(
            "200 OK",
            r#"{"status":"healthy","version":"1.0.0","quantum_ready":true}"#,
        )
        .await;

        let health = client_for(&url).health().await.unwrap();
        assert_eq!(health.status, "healthy");
        assert!(health.quantum_ready);
        assert!(request.await.unwrap().starts_with("GET /health "));
    }
}
