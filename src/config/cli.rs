//! CLI argument parsing and configuration

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// eightcount - Beat and eight-count annotations for dancers
///
/// Declare a song's tempo and first beat, fix up the count where the music
/// shifts, tag sections, breaks and accents, and export it all as JSON.
#[derive(Parser, Debug)]
#[command(name = "eightcount")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Annotation store file (defaults to the per-user data directory)
    #[arg(long, global = true, value_name = "PATH", env = "EIGHTCOUNT_STORE")]
    pub store: Option<PathBuf>,

    /// Seed file loaded into an empty store on first use
    #[arg(long, global = true, value_name = "PATH")]
    pub seed: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the song catalogue
    #[command(subcommand)]
    Song(SongCommand),

    /// Declare a song's tempo (0 clears it)
    Tempo {
        /// Song id or Spotify id
        song: String,
        bpm: f64,
    },

    /// Set a song's tempo from tap timestamps in milliseconds
    Tap {
        song: String,
        /// Tap positions in ms, at least two
        #[arg(required = true, num_args = 2..)]
        taps: Vec<u64>,
        /// Also use the first tap as the first beat
        #[arg(long, default_value = "false")]
        first_beat: bool,
    },

    /// Set the position of beat 0
    FirstBeat { song: String, ms: u64 },

    /// Manage count resets
    #[command(subcommand)]
    Reset(ResetCommand),

    /// Manage markers
    #[command(subcommand)]
    Marker(MarkerCommand),

    /// Print a song's structure with counts
    Show {
        song: String,
        /// Print every beat's count instead of one line per segment
        #[arg(long, default_value = "false")]
        beats: bool,
    },

    /// Show beat, count and section at a playback position
    At { song: String, ms: u64 },

    /// Simulate playback and print each beat change
    Timeline {
        song: String,
        #[arg(long, default_value = "0")]
        from: u64,
        /// End position (defaults to the song's duration)
        #[arg(long)]
        to: Option<u64>,
        /// Position tick interval
        #[arg(long, default_value = "100")]
        tick_ms: u64,
    },

    /// Export one song to JSON
    Export {
        song: String,
        /// Output file (defaults to eightcount-<title>.json)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Export every song to one JSON file
    ExportAll {
        /// Output file (defaults to eightcount-export-<date>.json)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Import songs from an export file
    Import { file: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum SongCommand {
    /// Add (or update) a song
    Add(SongAddArgs),
    /// List songs
    List,
    /// Delete a song and its annotations
    Delete { song: String },
}

#[derive(Args, Debug)]
pub struct SongAddArgs {
    /// Spotify URI, open.spotify.com URL, or track id
    #[arg(long)]
    pub track: String,
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub artist: String,
    #[arg(long)]
    pub duration_ms: u64,
    #[arg(long, default_value = "")]
    pub album_art: String,
}

#[derive(Subcommand, Debug)]
pub enum ResetCommand {
    /// Restart the count at a beat (replaces a reset already there)
    Add {
        song: String,
        beat: u64,
        /// Count given to that beat (1-8)
        #[arg(value_parser = clap::value_parser!(u8).range(1..=8))]
        to: u8,
    },
    /// Remove a reset by id
    Remove { song: String, id: String },
}

#[derive(Subcommand, Debug)]
pub enum MarkerCommand {
    /// Add a marker at a beat or at the beat nearest a position
    Add {
        song: String,
        #[arg(long, conflicts_with = "at_ms", required_unless_present = "at_ms")]
        beat: Option<u64>,
        #[arg(long)]
        at_ms: Option<u64>,
        #[arg(long = "type", value_name = "TYPE")]
        #[arg(value_parser = ["section", "break", "accent"])]
        marker_type: String,
        /// Section name (intro, verse, pre-chorus, chorus, mambo, bridge, outro) or free text
        #[arg(long)]
        label: Option<String>,
    },
    /// Remove a marker by id
    Remove { song: String, id: String },
}

impl Cli {
    /// Get the log filter based on verbosity flags
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_marker_add() {
        let cli = Cli::parse_from([
            "eightcount", "marker", "add", "song1", "--beat", "32", "--type", "section", "--label", "verse",
        ]);
        match cli.command {
            Command::Marker(MarkerCommand::Add { beat, marker_type, label, .. }) => {
                assert_eq!(beat, Some(32));
                assert_eq!(marker_type, "section");
                assert_eq!(label.as_deref(), Some("verse"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_reset_to_range_enforced() {
        assert!(Cli::try_parse_from(["eightcount", "reset", "add", "s", "10", "9"]).is_err());
        assert!(Cli::try_parse_from(["eightcount", "reset", "add", "s", "10", "8"]).is_ok());
    }

    #[test]
    fn test_log_filter() {
        let cli = Cli::parse_from(["eightcount", "-vv", "song", "list"]);
        assert_eq!(cli.log_filter(), "debug");
        let cli = Cli::parse_from(["eightcount", "-vv", "-q", "song", "list"]);
        assert_eq!(cli.log_filter(), "error");
    }
}
