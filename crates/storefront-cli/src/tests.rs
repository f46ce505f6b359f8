use super::*;

#[test]
fn parses_migrate_command() {
    let cli = Cli::try_parse_from(["storefront-cli", "migrate"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Migrate));
}

#[test]
fn parses_sheets_sync_command() {
    let cli = Cli::try_parse_from(["storefront-cli", "sheets", "sync"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Sheets {
            command: SheetsCommands::Sync
        }
    ));
}

#[test]
fn parses_tokens_cleanup_command() {
    let cli = Cli::try_parse_from(["storefront-cli", "tokens", "cleanup"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Tokens {
            command: TokensCommands::Cleanup
        }
    ));
}

#[test]
fn subcommand_is_required() {
    assert!(Cli::try_parse_from(["storefront-cli"]).is_err());
}

#[test]
fn unknown_sheets_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["storefront-cli", "sheets", "pull"]).is_err());
}
