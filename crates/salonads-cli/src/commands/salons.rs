use anyhow::Result;
use colored::Colorize;
use salonads_client::SalonService;

use super::parse_params;
use crate::cli::{OutputFormat, SalonsCommands};
use crate::output::{print_success, print_value};

pub async fn run(salons: &SalonService, command: &SalonsCommands, format: OutputFormat) -> Result<()> {
    match command {
        SalonsCommands::List => print_value(&salons.list().await?, format),
        SalonsCommands::Page(args) => {
            let mut params = vec![
                ("page".to_string(), args.page.to_string()),
                ("limit".to_string(), args.limit.to_string()),
            ];
            params.extend(parse_params(&args.params));
            print_value(&salons.list_paged(&params).await?, format);
        }
        SalonsCommands::Delete(args) => {
            salons.delete(&args.id).await?;
            print_success(&format!("Deleted salon {}", args.id.cyan()));
        }
    }
    Ok(())
}
