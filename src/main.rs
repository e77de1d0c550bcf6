//! eightcount CLI entry point

use clap::Parser;
use eightcount::catalog::{format_time, parse_spotify_track_id};
use eightcount::config::cli::{Command, MarkerCommand, ResetCommand, SongCommand};
use eightcount::config::{Cli, Settings};
use eightcount::export;
use eightcount::session::{BeatMap, PositionTracker, TapTempo};
use eightcount::store::{AnnotationStore, JsonFileStore};
use eightcount::types::{BeatPosition, MarkerType, SectionLabel, Song};
use eightcount::{EightcountError, Result};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

type Store = AnnotationStore<JsonFileStore>;

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(&cli);

    let settings = Settings::from_cli(&cli);

    match run(cli.command, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_user_error() => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Fatal error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command, settings: &Settings) -> Result<()> {
    settings.validate()?;

    let mut store = AnnotationStore::new(JsonFileStore::open(&settings.store_path)?);
    info!("Using store {}", settings.store_path.display());

    if let Some(seed) = &settings.seed_path {
        let entries = export::read_json(seed)?;
        store.seed_if_needed(&entries)?;
    }

    match command {
        Command::Song(cmd) => run_song(&mut store, cmd),
        Command::Tempo { song, bpm } => {
            store.edit_breakdown(&song, |_, bd| bd.set_bpm(bpm))?;
            println!("Tempo set to {} BPM", bpm);
            Ok(())
        }
        Command::Tap { song, taps, first_beat } => {
            let (bpm, first_tap) = TapTempo::from_taps(&taps)
                .and_then(|tapper| Some((tapper.bpm()?, tapper.first_tap_ms())))
                .ok_or_else(|| EightcountError::ConfigError("Taps must be strictly increasing".to_string()))?;

            store.edit_breakdown(&song, |_, bd| {
                bd.set_bpm(bpm)?;
                if let (true, Some(ms)) = (first_beat, first_tap) {
                    bd.set_first_beat_ms(ms);
                }
                Ok(())
            })?;
            println!("Tempo set to {:.2} BPM from {} taps", bpm, taps.len());
            Ok(())
        }
        Command::FirstBeat { song, ms } => {
            store.edit_breakdown(&song, |_, bd| {
                bd.set_first_beat_ms(ms);
                Ok(())
            })?;
            println!("First beat set to {} ({}ms)", format_time(ms), ms);
            Ok(())
        }
        Command::Reset(cmd) => run_reset(&mut store, cmd),
        Command::Marker(cmd) => run_marker(&mut store, cmd),
        Command::Show { song, beats } => show(&store, &song, beats),
        Command::At { song, ms } => {
            let (song, map) = beat_map(&store, &song)?;
            let pos = map.position(ms);
            println!("{} @ {}", song.title, format_time(ms));
            println!("  {}", describe_position(&map, &pos.beat, pos.count, pos.segment));
            Ok(())
        }
        Command::Timeline { song, from, to, tick_ms } => {
            let (song, map) = beat_map(&store, &song)?;
            let end = to.unwrap_or(song.duration_ms);
            let step = tick_ms.max(1);
            let mut tracker = PositionTracker::new(map);

            let mut ms = from;
            while ms <= end {
                if let Some(pos) = tracker.tick(ms) {
                    println!(
                        "{:>7}ms  {}",
                        ms,
                        describe_position(tracker.map(), &pos.beat, pos.count, pos.segment)
                    );
                }
                ms = match ms.checked_add(step) {
                    Some(next) => next,
                    None => break,
                };
            }
            Ok(())
        }
        Command::Export { song, output } => {
            let entry = export::export_song(&store, &song)?;
            let path = output.unwrap_or_else(|| export::song_filename(&entry.song).into());
            export::write_json(&entry, &path)?;
            println!("Exported {} to {}", entry.song.title, path.display());
            Ok(())
        }
        Command::ExportAll { output } => {
            let entries = export::export_all(&store)?;
            let path = output
                .unwrap_or_else(|| export::bulk_filename(chrono::Utc::now().date_naive()).into());
            export::write_json(&entries, &path)?;
            println!("Exported {} songs to {}", entries.len(), path.display());
            Ok(())
        }
        Command::Import { file } => {
            let entries = export::read_json(&file)?;
            let count = store.import(entries)?;
            println!("Imported {} songs", count);
            Ok(())
        }
    }
}

fn run_song(store: &mut Store, cmd: SongCommand) -> Result<()> {
    match cmd {
        SongCommand::Add(args) => {
            let spotify_id = parse_spotify_track_id(&args.track)?;
            let mut song = Song::new(spotify_id, args.title, args.artist, args.duration_ms);
            song.album_art = args.album_art;
            let stored = store.save_song(song)?;
            println!("{}  {} - {}", stored.id, stored.artist, stored.title);
        }
        SongCommand::List => {
            let breakdowns = store.breakdowns()?;
            for song in store.songs()? {
                let (bpm, markers) = breakdowns
                    .get(&song.id)
                    .map(|bd| (bd.bpm, bd.markers.len()))
                    .unwrap_or((0.0, 0));
                let tempo = if bpm > 0.0 { format!("{} BPM", bpm) } else { "no tempo".to_string() };
                println!(
                    "{}  {} - {}  [{} · {} · {} markers]",
                    song.id,
                    song.artist,
                    song.title,
                    format_time(song.duration_ms),
                    tempo,
                    markers
                );
            }
        }
        SongCommand::Delete { song } => {
            if !store.delete_song(&song)? {
                return Err(EightcountError::SongNotFound(song));
            }
            println!("Deleted {}", song);
        }
    }
    Ok(())
}

fn run_reset(store: &mut Store, cmd: ResetCommand) -> Result<()> {
    match cmd {
        ResetCommand::Add { song, beat, to } => {
            let id = store.edit_breakdown(&song, |_, bd| Ok(bd.upsert_count_change(beat, to)?.id.clone()))?;
            println!("{}  beat {} counts as {}", id, beat, to);
        }
        ResetCommand::Remove { song, id } => {
            store.edit_breakdown(&song, |_, bd| bd.remove_count_change(&id))?;
            println!("Removed count reset {}", id);
        }
    }
    Ok(())
}

fn run_marker(store: &mut Store, cmd: MarkerCommand) -> Result<()> {
    match cmd {
        MarkerCommand::Add {
            song,
            beat,
            at_ms,
            marker_type,
            label,
        } => {
            let marker_type = MarkerType::from_name(&marker_type)
                .ok_or_else(|| EightcountError::ConfigError(format!("Unknown marker type '{}'", marker_type)))?;

            let marker = store.edit_breakdown(&song, |_, bd| {
                let beat = match (beat, at_ms) {
                    (Some(beat), _) => beat,
                    (None, Some(ms)) => eightcount::engine::nearest_beat(ms, bd.bpm, bd.first_beat_ms),
                    (None, None) => 0,
                };
                Ok(bd.add_marker(beat, marker_type, label).clone())
            })?;

            println!(
                "{}  {} at beat {}{}",
                marker.id,
                marker.marker_type.config().label,
                marker.beat_index,
                marker.label.map(|l| format!(" ({})", l)).unwrap_or_default()
            );
        }
        MarkerCommand::Remove { song, id } => {
            store.edit_breakdown(&song, |_, bd| bd.remove_marker(&id))?;
            println!("Removed marker {}", id);
        }
    }
    Ok(())
}

fn beat_map(store: &Store, song_ref: &str) -> Result<(Song, BeatMap)> {
    let song = store.require_song(song_ref)?;
    let breakdown = store.breakdown_or_empty(&song.id)?;
    let map = BeatMap::from_breakdown(&breakdown, song.duration_ms);
    Ok((song, map))
}

fn show(store: &Store, song_ref: &str, per_beat: bool) -> Result<()> {
    let song = store.require_song(song_ref)?;
    let breakdown = store.breakdown_or_empty(&song.id)?;
    let map = BeatMap::from_breakdown(&breakdown, song.duration_ms);

    println!("{} - {} ({})", song.artist, song.title, format_time(song.duration_ms));

    if !breakdown.has_tempo() {
        println!("  No tempo set. Use `eightcount tempo {} <BPM>` first.", song.id);
        return Ok(());
    }

    println!(
        "  {} BPM, first beat at {}, {} beats, {} count resets, {} markers",
        breakdown.bpm,
        format_time(breakdown.first_beat_ms),
        map.total_beats(),
        breakdown.count_changes.len(),
        breakdown.markers.len()
    );

    let counts = map.counts();
    for segment in map.segments() {
        let (start_ms, end_ms) = map.segment_span_ms(segment);
        let label = segment.label.as_deref().unwrap_or("·");
        println!(
            "  [{:>4}-{:>4}) {}-{}  {}",
            segment.start_beat,
            segment.end_beat,
            format_time(start_ms as u64),
            format_time(end_ms as u64),
            label
        );

        let seg_counts = &counts[segment.start_beat as usize..segment.end_beat as usize];
        if per_beat {
            for (offset, count) in seg_counts.iter().enumerate() {
                let beat = segment.start_beat + offset as u64;
                let tags: Vec<&str> = breakdown
                    .markers
                    .iter()
                    .filter(|m| m.beat_index == beat)
                    .map(|m| m.marker_type.name())
                    .collect();
                println!("      {:>4}  {}  {}", beat, count, tags.join(" "));
            }
        } else {
            let line: Vec<String> = seg_counts.iter().map(|c| c.to_string()).collect();
            println!("      {}", line.join(" "));
        }
    }

    Ok(())
}

fn describe_position(map: &BeatMap, beat: &BeatPosition, count: Option<u8>, segment: Option<usize>) -> String {
    match (beat, count) {
        (BeatPosition::Beat(index), Some(count)) => {
            let section = segment
                .and_then(|i| map.segments().get(i))
                .map(|s| {
                    let label = s.label.as_deref().unwrap_or("eights");
                    match s.label.as_deref().and_then(SectionLabel::parse) {
                        Some(known) => format!("{} {}", label, known.color()),
                        None => label.to_string(),
                    }
                })
                .unwrap_or_else(|| "past end".to_string());
            format!("beat {:>4}  count {}  {}", index, count, section)
        }
        _ if map.bpm() <= 0.0 => "no tempo set".to_string(),
        _ => format!("before first beat ({})", format_time(map.first_beat_ms())),
    }
}
