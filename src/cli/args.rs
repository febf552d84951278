use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "iftar", version, author, about = "Prayer times and Iftar countdown for Malaysia, in your terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show today's prayer times, the next prayer and the Iftar countdown
    Times {
        /// Latitude to use instead of looking up the current location
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,
        /// Longitude to use instead of looking up the current location
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },
    /// Inspect or override the remembered location
    Location {
        #[command(subcommand)]
        action: LocationCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum LocationCommands {
    /// Show the remembered location and how old it is
    Show,
    /// Remember a location manually
    Set {
        #[arg(allow_hyphen_values = true)]
        latitude: f64,
        #[arg(allow_hyphen_values = true)]
        longitude: f64,
    },
    /// Forget the remembered location and cached prayer times
    Clear,
}
