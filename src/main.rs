//! AdoteMe Entry Point
//!
//! `adoteme [--config FILE] [CATEGORY]` loads the catalog and lists the pets
//! of one category.

use std::path::PathBuf;
use std::process::ExitCode;

use adoteme::{App, AppConfig, ALL_LABEL};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "adoteme")]
#[command(about = "List the pets of the adoption catalog", long_about = None)]
struct Cli {
    /// TOML settings file; ADOTEME_* variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Category to list (All, Dog, Cat, Fish, Bird)
    #[arg(default_value = ALL_LABEL)]
    category: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let Cli { config, category } = Cli::parse();

    let config = match AppConfig::load_with_env(config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let app = match App::bootstrap(config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = app.catalog.refresh().await {
        rolling_logger::error(&format!("catalog unavailable: {}", e));
        return ExitCode::FAILURE;
    }
    if let Err(e) = app.catalog.set_category(&category).await {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    let view = app.catalog.filtered_view().await;
    if view.is_empty() {
        println!("No pets in {}", category);
    }
    for pet in view.iter() {
        println!(
            "{:<8} {:<12} {:<10} {:<4} {:<14} {}",
            pet.id,
            pet.display_name(),
            pet.display_breed(),
            pet.display_age(),
            pet.display_location(),
            if pet.favorited { "*" } else { "" }
        );
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_all() {
        let cli = Cli::try_parse_from(["adoteme"]).unwrap();
        assert_eq!(cli.category, ALL_LABEL);
        assert_eq!(cli.config, None);
    }

    #[test]
    fn test_config_and_category() {
        let cli = Cli::try_parse_from(["adoteme", "--config", "adoteme.toml", "Dog"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("adoteme.toml")));
        assert_eq!(cli.category, "Dog");
    }

    #[test]
    fn test_extra_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["adoteme", "Dog", "Cat"]).is_err());
    }
}
