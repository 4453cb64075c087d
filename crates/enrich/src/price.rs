use tracing::debug;

use coinbot_core::template::{substitute, TemplateParam};
use coinbot_core::DialogResponse;

use crate::clients::PriceFeed;
use crate::error::PriceFeedError;

/// Fills the price template with the current USD price and a directional 24h
/// change ("up 5" / "down -3.2"). A quote without `price_usd` leaves the
/// template text untouched; unparseable numbers keep their placeholder
/// literal rather than substituting garbage.
pub(crate) async fn apply(
    feed: &dyn PriceFeed,
    slug: &str,
    response: &mut DialogResponse,
) -> Result<(), PriceFeedError> {
    let Some(quote) = feed.ticker(slug).await? else {
        debug!(event_name = "enrich.price.no_quote", asset = slug, "price feed had no entry");
        return Ok(());
    };

    let Some(price) = quote.price_usd.as_deref().and_then(|raw| raw.parse::<f64>().ok()) else {
        debug!(event_name = "enrich.price.no_price", asset = slug, "quote carried no usable price");
        return Ok(());
    };

    let mut params = vec![TemplateParam::Number(price)];
    if let Some(percent) = quote.percent_change_24h.as_deref().and_then(|raw| raw.parse::<f64>().ok())
    {
        let direction = if percent < 0.0 { "down" } else { "up" };
        params.push(TemplateParam::Text(format!("{direction} {percent}")));
    }

    let output = response.ensure_output();
    output.text = substitute(&output.text, &params);
    Ok(())
}
