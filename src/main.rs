use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use log::info;

use tonearm::{Buffer, Engine, Error, Media};

#[derive(Parser, Debug)]
#[command(name = "tonearm")]
#[command(about = "Play an audio file from the command line", long_about = None)]
struct Args {
    /// Audio file to play
    path: PathBuf,

    /// Maximum playback time in seconds; playback ends earlier if the
    /// track finishes first
    #[arg(long, default_value_t = 10)]
    duration: u64,

    /// Decode straight from the file instead of loading it into memory
    /// first
    #[arg(long)]
    from_file: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if let Err(err) = run(&args) {
        log::error!("{err}");
        process::exit(err.exit_code());
    }
}

fn run(args: &Args) -> Result<(), Error> {
    // Load and probe before touching the audio device, so an unreadable
    // input reports as a load failure.
    let media = open_media(args)?;

    let engine = Engine::new()?;

    // The media handle moves into the player here; the player holds the
    // only remaining reference to it.
    let mut player = engine.player(media)?;

    player.play()?;
    info!("playing {} (up to {}s)", args.path.display(), args.duration);

    let finished = player.wait(Duration::from_secs(args.duration));
    player.stop();

    if let Some(failure) = player.take_failure() {
        return Err(failure.into());
    }

    if finished {
        info!("track finished");
    } else {
        info!("stopped after {}s", args.duration);
    }

    // Drop order releases the player before the engine.
    Ok(())
}

fn open_media(args: &Args) -> Result<Media, Error> {
    if args.from_file {
        return Ok(Media::from_path(&args.path)?);
    }

    let buffer = Buffer::from_file(&args.path)?;
    info!("read {} bytes from {}", buffer.len(), args.path.display());

    let ext = args.path.extension().and_then(|e| e.to_str());
    Ok(Media::from_buffer(buffer.into_bytes(), ext)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_fails_as_a_load_error() {
        let args = Args {
            path: PathBuf::from("/nonexistent/clip.ogg"),
            duration: 1,
            from_file: false,
        };

        // run() opens the media before creating the engine, so this is
        // the failure a device-less host reports too.
        let err = open_media(&args).unwrap_err();
        assert!(matches!(err, Error::Load(_)), "got {err:?}");
        assert_eq!(err.exit_code(), 1);
    }
}
