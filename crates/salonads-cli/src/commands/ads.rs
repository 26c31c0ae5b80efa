use anyhow::Result;
use colored::Colorize;
use salonads_client::{AdService, AdStatus};
use serde_json::Value;

use super::{parse_params, read_body};
use crate::cli::{AdsCommands, OutputFormat, TabletCommands};
use crate::output::{print_success, print_value};

/// Replaces raw `status` values with their display labels.
fn label_statuses(value: &mut Value) {
    let rows = match value {
        Value::Array(rows) => rows,
        Value::Object(obj) => match obj.get_mut("data") {
            Some(Value::Array(rows)) => rows,
            _ => return,
        },
        _ => return,
    };
    for row in rows {
        if let Some(status) = row.get_mut("status") {
            if let Some(raw) = status.as_str() {
                *status = Value::from(AdStatus::parse(raw).label());
            }
        }
    }
}

fn show(mut value: Value, format: OutputFormat) {
    if matches!(format, OutputFormat::Table) {
        label_statuses(&mut value);
    }
    print_value(&value, format);
}

pub async fn run(ads: &AdService, command: &AdsCommands, format: OutputFormat) -> Result<()> {
    match command {
        AdsCommands::List(args) => show(ads.list(&parse_params(&args.params)).await?, format),
        AdsCommands::Page(args) => {
            let mut params = vec![
                ("page".to_string(), args.page.to_string()),
                ("limit".to_string(), args.limit.to_string()),
            ];
            params.extend(parse_params(&args.params));
            show(ads.list_paged(&params).await?, format);
        }
        AdsCommands::Search(args) => show(ads.search(&parse_params(&args.params)).await?, format),
        AdsCommands::Public(args) => show(ads.public(&parse_params(&args.params)).await?, format),
        AdsCommands::Get(args) => print_value(&ads.get(&args.id).await?, format),
        AdsCommands::Create(args) => {
            let created = ads.create(&read_body(args.file.as_deref())?).await?;
            let id = created.get("id").map_or_else(|| "?".to_string(), Value::to_string);
            print_success(&format!("Created ad {}", id.cyan()));
            print_value(&created, format);
        }
        AdsCommands::Update(args) => {
            let updated = ads.update(&args.id, &read_body(args.file.as_deref())?).await?;
            print_success(&format!("Updated ad {}", args.id.cyan()));
            print_value(&updated, format);
        }
        AdsCommands::Delete(args) => {
            ads.delete(&args.id).await?;
            print_success(&format!("Deleted ad {}", args.id.cyan()));
        }
        AdsCommands::Activate(args) => {
            ads.set_active(&args.id, true).await?;
            print_success(&format!("Ad {} is now {}", args.id.cyan(), AdStatus::Active.label()));
        }
        AdsCommands::Deactivate(args) => {
            ads.set_active(&args.id, false).await?;
            print_success(&format!("Ad {} is now {}", args.id.cyan(), AdStatus::Inactive.label()));
        }
        AdsCommands::Schedule(args) => {
            let scheduled = ads.schedule(&read_body(args.file.as_deref())?).await?;
            print_success("Ad scheduled");
            print_value(&scheduled, format);
        }
        AdsCommands::Display => show(ads.display().await?, format),
        AdsCommands::Tablet(args) => tablet(ads, &args.command, format).await?,
    }
    Ok(())
}

async fn tablet(ads: &AdService, command: &TabletCommands, format: OutputFormat) -> Result<()> {
    match command {
        TabletCommands::List => show(ads.tablet_list().await?, format),
        TabletCommands::Active => show(ads.tablet_active().await?, format),
        TabletCommands::Get(args) => print_value(&ads.tablet_get(&args.id).await?, format),
        TabletCommands::Create(args) => {
            let created = ads.tablet_create(&read_body(args.file.as_deref())?).await?;
            print_success("Created tablet ad");
            print_value(&created, format);
        }
        TabletCommands::Update(args) => {
            let updated = ads
                .tablet_update(&args.id, &read_body(args.file.as_deref())?)
                .await?;
            print_success(&format!("Updated tablet ad {}", args.id.cyan()));
            print_value(&updated, format);
        }
        TabletCommands::Delete(args) => {
            ads.tablet_delete(&args.id).await?;
            print_success(&format!("Deleted tablet ad {}", args.id.cyan()));
        }
    }
    Ok(())
}
