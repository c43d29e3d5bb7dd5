//! Command handlers that drive the feed controller and print its snapshot.

use tourmap_core::{AreaCode, ContentType};
use tourmap_feed::{FeedController, FeedSnapshot, FilterState, LoadOutcome};
use tourmap_tourapi::{ListingRecord, TourApiClient};

const TITLE_WIDTH: usize = 30;

/// Loads up to `pages` pages for `filter` and `search`, then prints the
/// visible list.
///
/// # Errors
///
/// Returns an error if the first page cannot be loaded. A failure on a later
/// page is reported on stderr and the records loaded so far are printed.
pub(crate) async fn run_feed(
    controller: &FeedController,
    filter: &FilterState,
    search: Option<String>,
    pages: u32,
    json: bool,
) -> anyhow::Result<()> {
    let mut outcome = controller.set_query(filter.clone(), search).await;
    let mut loaded = 1;
    while loaded < pages && matches!(outcome, LoadOutcome::Applied { .. }) {
        outcome = controller.load_more().await;
        loaded += 1;
    }

    let snapshot = controller.snapshot();
    tracing::debug!(
        pages = snapshot.page,
        visible = snapshot.items.len(),
        phase = ?snapshot.phase,
        "feed loaded"
    );
    if let Some(err) = &snapshot.error {
        if snapshot.items.is_empty() {
            anyhow::bail!("{}", err.user_message());
        }
        eprintln!("warning: stopped early: {}", err.user_message());
    }

    if json {
        print_json(&snapshot)?;
    } else {
        print_table(&snapshot);
    }
    Ok(())
}

fn print_json(snapshot: &FeedSnapshot) -> anyhow::Result<()> {
    for record in &snapshot.items {
        println!("{}", serde_json::to_string(record)?);
    }
    Ok(())
}

fn print_table(snapshot: &FeedSnapshot) {
    if snapshot.items.is_empty() {
        println!("no records found");
        return;
    }

    println!(
        "{:<10}{:<10}{:<32}{:<22}ADDRESS",
        "ID", "TYPE", "TITLE", "COORDINATES"
    );
    for record in &snapshot.items {
        println!(
            "{:<10}{:<10}{:<32}{:<22}{}",
            record.content_id,
            record.content_type.label(),
            truncate(&record.title),
            fmt_position(record),
            record.full_address().unwrap_or_else(|| "\u{2014}".to_string()),
        );
    }

    let total = snapshot
        .total_count
        .map_or_else(|| "?".to_string(), |t| t.to_string());
    println!();
    println!(
        "{} shown, page {}, {} total upstream{}",
        snapshot.items.len(),
        snapshot.page,
        total,
        if snapshot.has_more { ", more available" } else { "" }
    );
}

fn truncate(title: &str) -> String {
    if title.chars().count() > TITLE_WIDTH {
        format!("{}...", title.chars().take(TITLE_WIDTH - 3).collect::<String>())
    } else {
        title.to_string()
    }
}

fn fmt_position(record: &ListingRecord) -> String {
    record.position().map_or_else(
        || "\u{2014}".to_string(),
        |p| format!("{:.5},{:.5}", p.latitude, p.longitude),
    )
}

/// Prints the codes `--region` and `--category` accept. Needs no service key.
pub(crate) fn print_codes() {
    println!("{:<8}REGION", "CODE");
    for area in AreaCode::all() {
        println!("{:<8}{}", area.as_str(), area.name());
    }
    println!();
    println!("{:<8}CATEGORY", "CODE");
    for content_type in ContentType::ALL {
        println!(
            "{:<8}{}",
            content_type.code().unwrap_or("\u{2014}"),
            content_type.label()
        );
    }
}

/// Prints the pet policy for one record.
///
/// # Errors
///
/// Returns an error if the lookup fails.
pub(crate) async fn run_pet(client: &TourApiClient, content_id: &str) -> anyhow::Result<()> {
    let Some(policy) = client
        .detail_pet_tour(content_id)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e.user_message()))?
    else {
        println!("no pet policy published for {content_id}");
        return Ok(());
    };

    let dash = || "\u{2014}".to_string();
    println!("Content: {}", policy.content_id);
    println!(
        "Pets allowed: {}",
        if policy.allows_accompaniment() { "yes" } else { "no" }
    );
    println!("Type: {}", policy.accompaniment_type.clone().unwrap_or_else(dash));
    println!("Scope: {}", policy.allowed_scope.clone().unwrap_or_else(dash));
    println!("Requirements: {}", policy.requirements.clone().unwrap_or_else(dash));
    println!("Other: {}", policy.extra_info.clone().unwrap_or_else(dash));
    println!(
        "Facilities: {}",
        policy.related_facilities.clone().unwrap_or_else(dash)
    );
    Ok(())
}
