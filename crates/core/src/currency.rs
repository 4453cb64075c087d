/// Ticker-to-slug table used by the price feed and search queries. Matching is
/// exact and case-sensitive; unknown tickers pass through unchanged.
const TICKER_TABLE: &[(&str, &str)] = &[
    ("BTC", "bitcoin"),
    ("ETH", "ethereum"),
    ("BCH", "bitcoin-cash"),
    ("XRP", "ripple"),
    ("LTC", "litecoin"),
];

pub fn normalize(ticker: &str) -> &str {
    TICKER_TABLE
        .iter()
        .find(|(known, _)| *known == ticker)
        .map(|(_, slug)| *slug)
        .unwrap_or(ticker)
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn table_tickers_map_to_slugs() {
        assert_eq!(normalize("BTC"), "bitcoin");
        assert_eq!(normalize("ETH"), "ethereum");
        assert_eq!(normalize("BCH"), "bitcoin-cash");
        assert_eq!(normalize("XRP"), "ripple");
        assert_eq!(normalize("LTC"), "litecoin");
    }

    #[test]
    fn unknown_tickers_are_identity() {
        assert_eq!(normalize("DOGE"), "DOGE");
        assert_eq!(normalize(""), "");
        // case-sensitive by design
        assert_eq!(normalize("btc"), "btc");
    }
}
