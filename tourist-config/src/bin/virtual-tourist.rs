use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use futures::{FutureExt, StreamExt};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tourist_config::{ConfigLoad, EnvConfig, TouristApp};
use tourist_core::{
    TouristError,
    acquisition::AcquisitionOutcome,
    lifecycle::LifecycleOutcome,
    store::{PhotoStore, PinStore},
};
use tourist_model::{Coordinate, InboundEvent, PhotoID, PinID, TouristEvent};
use tracing::warn;
use tracing_subscriber::{
    EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(
    name = "virtual-tourist",
    about = "Drop pins on the map and collect nearby photos"
)]
struct Cli {
    /// Config file to use instead of $TOURIST_CONFIG_PATH / default files
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Place a pin and acquire its photos
    #[command(allow_negative_numbers = true)]
    Place { latitude: f64, longitude: f64 },
    /// Replace a pin's photos with a new selection
    Refresh { pin_id: PinID },
    /// Delete a pin and its photos
    Delete { pin_id: PinID },
    /// Delete every pin
    Clear,
    /// Remove a single photo
    RemovePhoto { photo_id: PhotoID },
    /// List pins and their photos
    List,
}

impl Command {
    /// Listing reads the local store only and needs no API key.
    fn is_offline(&self) -> bool {
        matches!(self, Command::List)
    }

    fn into_inbound(self) -> Result<Option<InboundEvent>> {
        Ok(Some(match self {
            Command::Place {
                latitude,
                longitude,
            } => InboundEvent::PinPlaced {
                coordinate: Coordinate::new(latitude, longitude)?,
            },
            Command::Refresh { pin_id } => {
                InboundEvent::RefreshRequested { pin_id }
            }
            Command::Delete { pin_id } => {
                InboundEvent::PinDeleteRequested { pin_id }
            }
            Command::Clear => InboundEvent::AllPinsClearRequested,
            Command::RemovePhoto { photo_id } => {
                InboundEvent::PhotoRemoveRequested { photo_id }
            }
            Command::List => return Ok(None),
        }))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "virtual_tourist=info,tourist_core=info".into()
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut env = EnvConfig::gather();
    if let Some(path) = cli.config {
        env.config_path = Some(path);
    }
    let loaded = if cli.command.is_offline() {
        ConfigLoad::load_offline(&env)?
    } else {
        ConfigLoad::load(&env)?
    };
    let app = TouristApp::build(&loaded.config).await?;

    let Some(request) = cli.command.into_inbound()? else {
        list(&app);
        return Ok(());
    };

    let mut events = app.bus.stream();
    let handled = app.lifecycle.handle(request);
    tokio::pin!(handled);
    let result = loop {
        tokio::select! {
            result = &mut handled => break result,
            Some(event) = events.next() => print_event(event),
        }
    };
    while let Some(Some(event)) = events.next().now_or_never() {
        print_event(event);
    }

    match result {
        Ok(outcome) => {
            report(&outcome);
            Ok(())
        }
        Err(err) => Err(user_facing(err)),
    }
}

fn user_facing(err: TouristError) -> anyhow::Error {
    warn!("[cli] request failed: {}", err);
    anyhow!(err.user_message())
}

fn print_event(item: Result<TouristEvent, BroadcastStreamRecvError>) {
    match item {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(line) => println!("{line}"),
            Err(err) => warn!("[cli] could not encode event: {}", err),
        },
        Err(err) => warn!("[cli] missed events: {}", err),
    }
}

fn report(outcome: &LifecycleOutcome) {
    match outcome {
        LifecycleOutcome::Placed(placed) => {
            eprintln!(
                "pin {}: {}",
                placed.pin_id,
                describe(&placed.outcome)
            );
        }
        LifecycleOutcome::Refreshed { pin_id, outcome } => {
            eprintln!("pin {pin_id}: {}", describe(outcome));
        }
        LifecycleOutcome::PinDeleted(receipt)
        | LifecycleOutcome::PinsCleared(receipt)
        | LifecycleOutcome::PhotoRemoved(receipt) => {
            eprintln!(
                "committed {} changes (version {})",
                receipt.changes.len(),
                receipt.version
            );
        }
    }
}

fn describe(outcome: &AcquisitionOutcome) -> String {
    match outcome {
        AcquisitionOutcome::Complete {
            success_count,
            failure_count,
            ..
        } if *success_count == 0 => {
            format!("no photo could be downloaded ({failure_count} failed)")
        }
        AcquisitionOutcome::Complete {
            success_count,
            failure_count,
            ..
        } => {
            format!("{success_count} photos acquired, {failure_count} failed")
        }
        AcquisitionOutcome::Aborted { reason } => format!("aborted: {reason}"),
    }
}

fn list(app: &TouristApp) {
    let store = app.store.as_ref();
    for pin in PinStore::pins(store) {
        let photos = PhotoStore::photos_for(store, pin.id());
        println!(
            "{}  {}  {} photos",
            pin.id(),
            pin.coordinate(),
            photos.len()
        );
        for photo in photos {
            println!(
                "    {}  {}  ({} bytes)",
                photo.id,
                photo.display_title(),
                photo.byte_len()
            );
        }
    }
}
