//! Price-alert evaluation and the periodic alert check.
//!
//! An alert fires when the freshly fetched lowest price for its query is at
//! or below the target and differs from the last price the user was told
//! about by at least one rupee.

use std::collections::BTreeMap;

use futures::stream::{self, StreamExt};
use pricenest_core::{format_inr, NormalizedOffer};
use pricenest_db::AlertRow;
use pricenest_scraper::{compare_product, FetchPool, ScraperError, SearchClient};
use sqlx::PgPool;

use crate::notify::Notifier;

/// Smallest change, in rupees, that counts as a new price for an alert.
const MIN_PRICE_CHANGE: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceDirection {
    Dropped,
    Risen,
}

impl PriceDirection {
    fn title(self) -> &'static str {
        match self {
            PriceDirection::Dropped => "Dropped",
            PriceDirection::Risen => "Risen",
        }
    }

    fn verb(self) -> &'static str {
        match self {
            PriceDirection::Dropped => "dropped",
            PriceDirection::Risen => "risen",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub subject: String,
    pub body: String,
}

/// Counters for one alert-check pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertCheckSummary {
    pub active_alerts: usize,
    pub queries_refreshed: usize,
    pub queries_failed: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
}

/// Whether an alert with `target` should fire for `current`, given the price
/// it last reported.
#[must_use]
pub fn should_notify(target: i64, last_alerted: Option<i64>, current: i64) -> bool {
    if current > target {
        return false;
    }
    last_alerted.is_none_or(|last| (current - last).abs() >= MIN_PRICE_CHANGE)
}

/// A first notification always reads as a drop.
#[must_use]
pub fn price_direction(last_alerted: Option<i64>, current: i64) -> PriceDirection {
    match last_alerted {
        Some(last) if current >= last => PriceDirection::Risen,
        _ => PriceDirection::Dropped,
    }
}

/// Renders the notification for `alert` given the cheapest current offer.
#[must_use]
pub fn render_alert(alert: &AlertRow, cheapest: &NormalizedOffer) -> AlertMessage {
    let direction = price_direction(alert.last_alerted_price, cheapest.price);
    let price = format_inr(cheapest.price);

    let subject = format!(
        "Price {}: {} is now {price}",
        direction.title(),
        alert.query
    );
    let body = format!(
        "The price for \"{query}\" has {verb} to {price}.\n\n\
         Your target price: {target}\n\
         Store: {store}\n\
         Link: {link}\n\n\
         - PriceNest",
        query = alert.query,
        verb = direction.verb(),
        target = format_inr(alert.target_price),
        store = cheapest.store,
        link = cheapest.link,
    );

    AlertMessage { subject, body }
}

/// Runs one alert-check pass.
///
/// Each distinct query among the active alerts is refreshed once through
/// `fetch_pool` and persisted. Alerts are then evaluated against the
/// cheapest fresh offer. A failed refresh skips that query's alerts. A
/// failed send is logged and the price is still recorded as alerted, so
/// the next pass does not resend it.
///
/// # Errors
///
/// Returns an error only if the active alerts cannot be loaded.
pub async fn run_alert_check(
    pool: &PgPool,
    search: &SearchClient,
    fetch_pool: &FetchPool,
    notifier: &dyn Notifier,
) -> anyhow::Result<AlertCheckSummary> {
    let alerts = pricenest_db::list_active_alerts(pool).await?;
    let mut summary = AlertCheckSummary {
        active_alerts: alerts.len(),
        ..AlertCheckSummary::default()
    };

    if alerts.is_empty() {
        tracing::info!("alert check: no active alerts");
        return Ok(summary);
    }

    let mut by_query: BTreeMap<&str, Vec<&AlertRow>> = BTreeMap::new();
    for alert in &alerts {
        by_query.entry(alert.query.as_str()).or_default().push(alert);
    }

    let refreshes: Vec<_> = by_query
        .keys()
        .copied()
        .map(|query| async move {
            let result = compare_product(search, fetch_pool, query)
                .await
                .map(|comparison| comparison.offers);
            (query, result)
        })
        .collect();
    let refreshed: Vec<(&str, Result<Vec<NormalizedOffer>, ScraperError>)> =
        stream::iter(refreshes)
            .buffer_unordered(fetch_pool.workers())
            .collect()
            .await;

    for (query, result) in refreshed {
        let offers = match result {
            Ok(offers) => offers,
            Err(e) => {
                summary.queries_failed += 1;
                tracing::error!(query, error = %e, "alert check: refresh failed");
                continue;
            }
        };

        if let Err(e) = pricenest_db::upsert_offers(pool, query, &offers).await {
            summary.queries_failed += 1;
            tracing::error!(query, error = %e, "alert check: failed to store offers");
            continue;
        }
        summary.queries_refreshed += 1;

        let Some(cheapest) = offers.first() else {
            tracing::info!(query, "alert check: no offers found");
            continue;
        };

        for alert in by_query.get(query).into_iter().flatten() {
            if !should_notify(alert.target_price, alert.last_alerted_price, cheapest.price) {
                continue;
            }
            if notify_alert(pool, notifier, alert, cheapest).await {
                summary.notifications_sent += 1;
            } else {
                summary.notifications_failed += 1;
            }
        }
    }

    tracing::info!(
        active_alerts = summary.active_alerts,
        queries_refreshed = summary.queries_refreshed,
        queries_failed = summary.queries_failed,
        notifications_sent = summary.notifications_sent,
        notifications_failed = summary.notifications_failed,
        "alert check complete"
    );
    Ok(summary)
}

/// Sends one alert and records the price it reported, whether or not the
/// send succeeded. Returns `false` if the send failed.
async fn notify_alert(
    pool: &PgPool,
    notifier: &dyn Notifier,
    alert: &AlertRow,
    cheapest: &NormalizedOffer,
) -> bool {
    let message = render_alert(alert, cheapest);
    let sent = match notifier
        .send(&alert.email, &message.subject, &message.body)
        .await
    {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(alert_id = alert.id, error = %e, "alert check: send failed");
            false
        }
    };

    if let Err(e) = pricenest_db::record_alerted_price(pool, alert.id, cheapest.price).await {
        tracing::error!(
            alert_id = alert.id,
            error = %e,
            "alert check: failed to record alerted price"
        );
    }
    sent
}

#[cfg(test)]
#[path = "alerts_test.rs"]
mod tests;
