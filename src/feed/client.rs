use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

const FEED_API_BASE: &str = "https://api.tushare.pro";

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed rejected request: {0}")]
    Api(String),

    #[error("instrument not found: {0}")]
    NotFound(String),

    #[error("no price available for {0}")]
    Unavailable(String),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// Instrument metadata as resolved by the feed.
#[derive(Debug, Clone)]
pub struct Instrument {
    pub code: String,
    pub name: String,
    pub industry: Option<String>,
    pub list_date: Option<String>,
}

/// A live price with the decimal precision the feed quoted it at.
#[derive(Debug, Clone, Copy)]
pub struct Quote {
    pub price: Decimal,
    pub precision: u32,
}

/// The feed's column-oriented response envelope: a `fields` array of
/// column names and an `items` array of rows.
#[derive(Debug, Deserialize)]
struct FeedResponse {
    code: i64,
    msg: Option<String>,
    data: Option<ResultSet>,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    fields: Vec<String>,
    items: Vec<Vec<Value>>,
}

impl ResultSet {
    fn column(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    fn str_at(&self, row: &[Value], name: &str) -> Option<String> {
        self.column(name)
            .and_then(|i| row.get(i))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    fn decimal_at(&self, row: &[Value], name: &str) -> Option<Decimal> {
        let v = self.column(name).and_then(|i| row.get(i))?;
        match v {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.to_string().parse().ok(),
            _ => None,
        }
    }
}

/// Client for a Tushare-style stock data API. All operations are
/// read-only POSTs carrying an `api_name`, the account token, and a
/// parameter map.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: Client,
    base_url: String,
    token: String,
}

impl FeedClient {
    pub fn new(token: String) -> Self {
        Self::with_base_url(FEED_API_BASE.into(), token)
    }

    pub fn with_base_url(base_url: String, token: String) -> Self {
        Self {
            http: Client::new(),
            base_url,
            token,
        }
    }

    async fn call(&self, api_name: &str, params: Value, fields: &str) -> Result<ResultSet, FeedError> {
        let body = json!({
            "api_name": api_name,
            "token": self.token,
            "params": params,
            "fields": fields,
        });

        let resp = self
            .http
            .post(&self.base_url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let parsed: FeedResponse = resp.json().await?;
        if parsed.code != 0 {
            return Err(FeedError::Api(
                parsed.msg.unwrap_or_else(|| format!("code {}", parsed.code)),
            ));
        }

        parsed
            .data
            .ok_or_else(|| FeedError::Unexpected("missing data section".into()))
    }

    /// Resolve instrument metadata for a code. Used once at position
    /// creation to pin the display name.
    pub async fn lookup_instrument(&self, code: &str) -> Result<Instrument, FeedError> {
        let data = self
            .call(
                "stock_basic",
                json!({ "ts_code": code }),
                "ts_code,symbol,name,area,industry,list_date",
            )
            .await?;

        let row = data
            .items
            .first()
            .ok_or_else(|| FeedError::NotFound(code.into()))?;

        Ok(Instrument {
            code: data.str_at(row, "ts_code").unwrap_or_else(|| code.into()),
            name: data
                .str_at(row, "name")
                .ok_or_else(|| FeedError::Unexpected("row without name".into()))?,
            industry: data.str_at(row, "industry"),
            list_date: data.str_at(row, "list_date"),
        })
    }

    /// Latest close for a code. The quote's precision is the number of
    /// decimal places the feed printed the price with.
    pub async fn current_price(&self, code: &str) -> Result<Quote, FeedError> {
        let data = self
            .call("daily", json!({ "ts_code": code }), "ts_code,trade_date,close")
            .await?;

        let row = data
            .items
            .first()
            .ok_or_else(|| FeedError::Unavailable(code.into()))?;

        let price = data
            .decimal_at(row, "close")
            .ok_or_else(|| FeedError::Unavailable(code.into()))?;

        Ok(Quote {
            price,
            precision: price.scale(),
        })
    }

    /// Fuzzy search over instrument names and codes. May return an empty
    /// list; never an error for an unmatched query.
    pub async fn search(&self, query: &str) -> Result<Vec<Instrument>, FeedError> {
        let data = self
            .call(
                "stock_basic",
                json!({ "name": query }),
                "ts_code,symbol,name,area,industry,list_date",
            )
            .await?;

        let results = data
            .items
            .iter()
            .filter_map(|row| {
                Some(Instrument {
                    code: data.str_at(row, "ts_code")?,
                    name: data.str_at(row, "name")?,
                    industry: data.str_at(row, "industry"),
                    list_date: data.str_at(row, "list_date"),
                })
            })
            .collect();

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_set_column_access() {
        let data = ResultSet {
            fields: vec!["ts_code".into(), "close".into()],
            items: vec![vec![Value::String("600000.SH".into()), json!(12.35)]],
        };

        let row = &data.items[0];
        assert_eq!(data.str_at(row, "ts_code").as_deref(), Some("600000.SH"));
        assert_eq!(data.decimal_at(row, "close"), Some("12.35".parse().unwrap()));
        assert_eq!(data.decimal_at(row, "missing"), None);
    }

    #[test]
    fn test_decimal_accepts_string_cells() {
        let data = ResultSet {
            fields: vec!["close".into()],
            items: vec![vec![Value::String("8.05".into())]],
        };
        assert_eq!(
            data.decimal_at(&data.items[0], "close"),
            Some("8.05".parse().unwrap())
        );
    }
}
