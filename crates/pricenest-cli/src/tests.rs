use super::*;
use pricenest_core::NormalizedOffer;

#[test]
fn parses_db_ping_command() {
    let cli =
        Cli::try_parse_from(["pricenest-cli", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["pricenest-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["pricenest-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_compare_with_defaults() {
    let cli = Cli::try_parse_from(["pricenest-cli", "compare", "iphone 15"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Compare {
            ref query,
            dry_run: false,
            json: false,
        }) if query == "iphone 15"
    ));
}

#[test]
fn parses_compare_dry_run_and_json() {
    let cli = Cli::try_parse_from([
        "pricenest-cli",
        "compare",
        "galaxy s24",
        "--dry-run",
        "--json",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Compare {
            dry_run: true,
            json: true,
            ..
        })
    ));
}

#[test]
fn compare_requires_a_query() {
    assert!(Cli::try_parse_from(["pricenest-cli", "compare"]).is_err());
}

#[test]
fn parses_analyze_command() {
    let cli = Cli::try_parse_from(["pricenest-cli", "analyze", "pixel 8"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Analyze { ref query }) if query == "pixel 8"
    ));
}

#[test]
fn parses_alerts_check_command() {
    let cli = Cli::try_parse_from(["pricenest-cli", "alerts", "check"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Alerts {
            command: AlertsCommands::Check
        })
    ));
}

#[test]
fn unknown_alerts_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["pricenest-cli", "alerts", "send"]).is_err());
}

fn offer(store: &str, price: i64) -> NormalizedOffer {
    NormalizedOffer {
        title: format!("Apple iPhone 15 at {store}"),
        store: store.to_string(),
        link: format!("https://{store}/iphone-15"),
        price,
        image: None,
        store_logo: None,
    }
}

#[test]
fn render_table_lists_offers_and_price_band() {
    let table = compare::render_table(&[offer("amazon.in", 64_900), offer("croma.com", 66_490)]);
    let lines: Vec<&str> = table.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("₹64,900"));
    assert!(lines[0].contains("amazon.in"));
    assert!(lines[1].contains("croma.com"));
    assert_eq!(lines[2], "2 offer(s), ₹64,900 – ₹66,490");
}

#[test]
fn render_table_reports_empty_results() {
    assert_eq!(compare::render_table(&[]), "no offers found\n");
}
