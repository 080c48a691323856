//! `address` - one reverse-geocode lookup.

use clap::Args;

use crate::error::CliError;
use crate::runner::CliRunner;
use fleetview::telemetry::TelemetryClient;

/// Arguments for the address command.
#[derive(Debug, Args)]
pub struct AddressArgs {
    /// Latitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,
}

/// Run the address command.
///
/// Unlike the tracker, lookup failures are reported as errors here.
pub async fn run(runner: &CliRunner, args: AddressArgs) -> Result<(), CliError> {
    runner.log_startup("address");

    if !(-90.0..=90.0).contains(&args.lat) || !(-180.0..=180.0).contains(&args.lon) {
        return Err(CliError::InvalidArgument(format!(
            "coordinates out of range: {}, {}",
            args.lat, args.lon
        )));
    }

    let client = runner.create_client()?;
    let address = client.reverse_geocode(args.lat, args.lon).await?;
    println!("{}", address);

    Ok(())
}
