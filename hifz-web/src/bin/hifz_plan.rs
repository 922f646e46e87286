//! hifz-plan - print a memorization plan without the web UI
//!
//! Generates the cumulative pattern for a verse range and walks it through the
//! same playback state machine the browser uses, printing every step.

use anyhow::{Context, Result};
use clap::Parser;
use hifz_common::{Effect, PlaybackEvent, PlaybackSession, VerseRange};

#[derive(Parser, Debug)]
#[command(name = "hifz-plan")]
#[command(about = "Print the cumulative memorization plan for a verse range")]
#[command(version)]
struct Args {
    /// Chapter number (1-114)
    #[arg(short, long, default_value = "1")]
    chapter: u32,

    /// First verse of the range
    #[arg(short, long)]
    start: u32,

    /// Last verse of the range
    #[arg(short, long)]
    end: u32,

    /// Times each step is recited
    #[arg(short, long, default_value = "3")]
    repeats: u32,

    /// Print every repetition, not just the steps
    #[arg(long)]
    timeline: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.repeats == 0 {
        anyhow::bail!("--repeats must be at least 1");
    }

    let range = VerseRange::new(args.chapter, args.start, args.end)
        .with_context(|| format!("Invalid range {}:{}-{}", args.chapter, args.start, args.end))?;
    let pattern = range.pattern(args.repeats);

    println!("Plan for {} ({} verses, {}x each)", range.label(), range.verse_count(), args.repeats);
    println!();
    for (i, step) in pattern.steps().iter().enumerate() {
        let verses: Vec<String> = step.verse_numbers.iter().map(u32::to_string).collect();
        println!("{:>3}. [{}] x{}", i + 1, verses.join(", "), step.repeat_count);
    }

    let mut session = PlaybackSession::with_all_audio(pattern.clone());
    let (next, mut effects) = session.handle(PlaybackEvent::Start);
    session = next;

    // Each clip ends on its own; repetitions chain without user input
    loop {
        if args.timeline {
            for effect in &effects {
                print_effect(range.chapter(), effect);
            }
        }
        if session.is_complete() {
            break;
        }
        let (next, produced) = session.handle(PlaybackEvent::ClipEnded);
        session = next;
        effects = produced;
    }

    println!();
    println!(
        "{} steps, {} repetitions, {} verse recitations",
        pattern.len(),
        session.completed_repetitions(),
        pattern.total_recitations()
    );
    Ok(())
}

fn print_effect(chapter: u32, effect: &Effect) {
    match effect {
        Effect::RenderStep {
            step_index,
            rep_index,
            verses,
        } => println!("step {} rep {}: {:?}", step_index + 1, rep_index + 1, verses),
        Effect::PlayClip { verse } => println!("    play {}:{}", chapter, verse),
        Effect::ReportAudioFailure { verse } => println!("    no audio for {}:{}", chapter, verse),
        Effect::RenderComplete => println!("complete"),
    }
}
