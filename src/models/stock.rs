// ============================================================================
// Structure : StockInfo
// ============================================================================
// Représente une action proposée par l'API (ticker NSE + métadonnées)
//
// CONCEPTS RUST :
// 1. #[derive(Serialize, Deserialize)] : conversion JSON automatique
// 2. String vs &str : StockInfo possède ses données (String)
// ============================================================================

use serde::{Deserialize, Serialize};

/// Action disponible pour l'optimisation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockInfo {
    /// Ticker court (ex: "RELIANCE", "TCS")
    pub ticker: String,

    /// Nom complet (ex: "Reliance Industries")
    pub name: String,

    /// Secteur (ex: "Energy", "IT")
    pub sector: String,

    /// Symbole Yahoo Finance (ex: "RELIANCE.NS")
    pub symbol: String,
}

impl StockInfo {
    /// Crée une nouvelle action
    pub fn new(ticker: &str, name: &str, sector: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            name: name.to_string(),
            sector: sector.to_string(),
            symbol: format!("{}.NS", ticker),
        }
    }

    /// Action ajoutée depuis la recherche avant que ses infos soient connues
    pub fn placeholder(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            name: "Loading...".to_string(),
            sector: "Unknown".to_string(),
            symbol: format!("{}.NS", ticker),
        }
    }

    /// Formatte l'action pour une ligne de liste
    ///
    /// Format : "RELIANCE   Reliance Industries      Energy"
    ///
    /// Note : Le nom est tronqué à 24 caractères pour éviter le débordement
    pub fn display(&self) -> String {
        let truncated_name = if self.name.chars().count() <= 24 {
            self.name.clone()
        } else {
            let truncated: String = self.name.chars().take(23).collect();
            format!("{}…", truncated)
        };

        format!("{:<11} {:<24} {}", self.ticker, truncated_name, self.sector)
    }
}

/// Réponse de GET /api/stocks
#[derive(Debug, Clone, Deserialize)]
pub struct StockListResponse {
    pub stocks: Vec<StockInfo>,
    #[serde(default)]
    pub count: usize,
}

/// Réponse de GET /api/stocks/search
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub stocks: Vec<StockInfo>,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub query: String,
}

/// Liste de secours quand l'API est injoignable
pub fn demo_stocks() -> Vec<StockInfo> {
    vec![
        StockInfo::new("RELIANCE", "Reliance Industries", "Energy"),
        StockInfo::new("TCS", "Tata Consultancy Services", "IT"),
        StockInfo::new("INFY", "Infosys", "IT"),
        StockInfo::new("HDFCBANK", "HDFC Bank", "Banking"),
        StockInfo::new("ICICIBANK", "ICICI Bank", "Banking"),
        StockInfo::new("HINDUNILVR", "Hindustan Unilever", "FMCG"),
        StockInfo::new("SBIN", "State Bank of India", "Banking"),
        StockInfo::new("BHARTIARTL", "Bharti Airtel", "Telecom"),
        StockInfo::new("KOTAKBANK", "Kotak Mahindra Bank", "Banking"),
        StockInfo::new("LT", "Larsen & Toubro", "Infrastructure"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_stocks() {
        let stocks = demo_stocks();
        assert_eq!(stocks.len(), 10);
        assert_eq!(stocks[0].ticker, "RELIANCE");
        assert_eq!(stocks[0].symbol, "RELIANCE.NS");
        assert_eq!(stocks[9].name, "Larsen & Toubro");
    }

    #[test]
    fn test_placeholder() {
        let stock = StockInfo::placeholder("WIPRO");
        assert_eq!(stock.name, "Loading...");
        assert_eq!(stock.sector, "Unknown");
        assert_eq!(stock.symbol, "WIPRO.NS");
    }

    #[test]
    fn test_parse_stock_list() {
        let json = r#"{"stocks":[{"ticker":"TCS","name":"Tata Consultancy Services","sector":"IT","symbol":"TCS.NS"}],"count":1}"#;
        let response: StockListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.count, 1);
        assert_eq!(response.stocks[0].sector, "IT");
    }

    #[test]
    fn test_display_truncates_long_names() {
        let stock = StockInfo::new("X", "A very long company name that overflows", "IT");
        let line = stock.display();
        assert!(line.contains('…'));
        assert!(line.ends_with("IT"));
    }
}
