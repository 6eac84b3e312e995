use anyhow::{anyhow, bail, Context};
use audio_fx_client::{
    Action, BandPatch, ClientSettings, CompressorPatch, FilterType, HttpService, JobState,
    NoticeLevel, OutputFormat, ReverbPatch, Section, SelectedFile, Session, SvgCanvas,
    WaveformView,
};
use clap::{Args, Parser, Subcommand};
use std::{fs, path::PathBuf, process};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "audio-fx")]
#[command(about = "Send audio through a remote effects chain", long_about = None)]
#[command(version)]
struct Cli {
    /// Service base URL (overrides settings file and AUDIO_FX_URL)
    #[arg(long, global = true)]
    server: Option<String>,

    /// Settings file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Whole-request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one file through the configured effects
    Process(ProcessArgs),

    /// Check that the service is reachable
    Ping,

    /// List the built-in EQ bands
    Bands,
}

#[derive(Args)]
struct ProcessArgs {
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the result (defaults to the name the service suggests)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long, default_value = "wav")]
    format: String,

    #[arg(long, default_value_t = 0.5)]
    denoise: f64,

    /// Extra band as FREQ:GAIN[:Q[:TYPE]], repeatable
    #[arg(long = "eq", value_name = "FREQ:GAIN[:Q[:TYPE]]")]
    eq: Vec<String>,

    /// Gain for a built-in band (lowcut, clarity, presence), repeatable
    #[arg(long = "band", value_name = "ID=GAIN")]
    band: Vec<String>,

    #[arg(long)]
    normalize: bool,

    #[arg(long)]
    trim_silence: bool,

    /// Ask the service for waveform envelopes
    #[arg(long)]
    waveform: bool,

    /// Write original.svg and processed.svg into this directory
    #[arg(long)]
    waveform_svg: Option<PathBuf>,

    #[arg(long, value_name = "THRESHOLD,RATIO,ATTACK,RELEASE")]
    compressor: Option<String>,

    #[arg(long, value_name = "ROOM_SIZE,WET_DRY")]
    reverb: Option<String>,

    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = || load_settings(cli.config.as_deref(), cli.server.as_deref(), cli.timeout);
    let result = match cli.command {
        Commands::Ping => settings().and_then(handle_ping),
        Commands::Bands => handle_bands(),
        Commands::Process(args) => settings().and_then(|s| handle_process(s, args)),
    };

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "audio_fx_client=debug,audio_fx=debug,warn"
    } else {
        "audio_fx_client=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(
    config: Option<&std::path::Path>,
    server: Option<&str>,
    timeout: Option<u64>,
) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::load(config)?;
    if let Some(url) = server {
        settings.base_url = url.to_string();
    }
    if let Some(secs) = timeout {
        settings.request_timeout_secs = secs;
    }
    Ok(settings)
}

fn handle_ping(settings: ClientSettings) -> anyhow::Result<()> {
    let service = HttpService::new(settings)?;
    let message = service.ping()?;
    eprintln!("✅ {} is up", service.settings().base_url);
    println!("{message}");
    Ok(())
}

fn handle_bands() -> anyhow::Result<()> {
    let session = Session::new();
    eprintln!("🎚️  Built-in EQ bands");
    eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for b in session.config.eq.bands() {
        eprintln!(
            "  • {:<9} {:<9} {:>6} Hz  q {:<4} {:?}",
            b.id(),
            b.name,
            b.freq,
            b.q,
            b.kind
        );
    }
    eprintln!();
    eprintln!("Use --band <id>=<gain> to adjust one");
    Ok(())
}

fn handle_process(settings: ClientSettings, args: ProcessArgs) -> anyhow::Result<()> {
    let ProcessArgs {
        input,
        output,
        format,
        denoise,
        eq,
        band,
        normalize,
        trim_silence,
        waveform,
        waveform_svg,
        compressor,
        reverb,
        quiet,
    } = args;

    let mut session = Session::new();
    let file = SelectedFile::open(&input)?;
    let format: OutputFormat = format.parse()?;

    let mut actions = vec![
        Action::SelectFile(Some(file)),
        Action::SetFormat(format),
        Action::SetDenoise(denoise),
        Action::SetNormalization(normalize),
        Action::SetTrimSilence(trim_silence),
        Action::SetRequestWaveform(waveform || waveform_svg.is_some()),
    ];
    for arg in &band {
        let (id, gain) = parse_seed_gain(arg)?;
        if session.config.eq.get(&id).is_none() {
            bail!("unknown band `{id}` (see `audio-fx bands`)");
        }
        actions.push(Action::UpdateBand(id, BandPatch::gain(gain)));
    }
    if let Some(c) = compressor.as_deref() {
        let [threshold, ratio, attack, release] = parse_floats::<4>(c, "--compressor")?;
        actions.push(Action::ShowSection(Section::Compressor, true));
        actions.push(Action::PatchCompressor(CompressorPatch {
            threshold_db: Some(threshold),
            ratio: Some(ratio),
            attack_ms: Some(attack),
            release_ms: Some(release),
        }));
    }
    if let Some(r) = reverb.as_deref() {
        let [room_size, wet_dry_mix] = parse_floats::<2>(r, "--reverb")?;
        actions.push(Action::ShowSection(Section::Reverb, true));
        actions.push(Action::PatchReverb(ReverbPatch {
            room_size: Some(room_size),
            wet_dry_mix: Some(wet_dry_mix),
        }));
    }
    actions.push(Action::ShowSection(Section::Eq, !eq.is_empty() || !band.is_empty()));
    for action in actions {
        session.dispatch(action);
    }
    for arg in &eq {
        let patch = parse_band(arg)?;
        session.dispatch(Action::AddBand);
        let id = session
            .config
            .eq
            .bands()
            .last()
            .map(|b| b.id().to_string())
            .ok_or_else(|| anyhow!("band list is empty after adding a band"))?;
        session.dispatch(Action::UpdateBand(id, patch));
    }

    if !quiet {
        eprintln!("🎵 Audio FX");
        eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        eprintln!("Input:   {}", input.display());
        eprintln!("Format:  {}", format);
        eprintln!("Server:  {}", settings.base_url);
        eprintln!("EQ:      {} active band(s)", session.config.eq.active_wire_bands().len());
        eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        eprintln!("⏳ Processing...");
    }

    let service = HttpService::new(settings)?;
    session.submit(&service);

    for notice in session.take_notices() {
        match notice.level {
            NoticeLevel::Info if quiet => {}
            NoticeLevel::Info => eprintln!("ℹ️  {}", notice.message),
            NoticeLevel::Warning => eprintln!("⚠️  {}", notice.message),
            NoticeLevel::Error => {}
        }
    }

    let result = match session.state() {
        JobState::Succeeded(r) => r.clone(),
        JobState::Failed(msg) => bail!("{msg}"),
        JobState::Idle | JobState::Submitting => bail!("job did not run"),
    };

    let out_path = output.unwrap_or_else(|| PathBuf::from(&result.download_name));
    let bytes = session
        .jobs()
        .result_audio()
        .ok_or_else(|| anyhow!("processed audio is no longer available"))?;
    fs::write(&out_path, bytes).with_context(|| format!("writing {}", out_path.display()))?;

    if let Some(dir) = &waveform_svg {
        fs::create_dir_all(dir)?;
        write_svg(&session.original_view, &dir.join("original.svg"))?;
        write_svg(&session.processed_view, &dir.join("processed.svg"))?;
    }

    if quiet {
        println!("{}", out_path.display());
        return Ok(());
    }

    eprintln!();
    eprintln!("✅ Done: {}", out_path.display());
    if let Some(applied) = &result.applied {
        if let Some(n) = applied.normalization {
            eprintln!("  📏 Normalization: {}", if n { "on" } else { "off" });
        }
        if let Some(d) = applied.denoise_strength {
            eprintln!("  🧹 Denoise:       {d}");
        }
        if let Some(eq) = &applied.eq_bands {
            eprintln!("  🎚️  EQ:            {eq}");
        }
        if let Some(c) = &applied.compressor {
            eprintln!("  🗜️  Compressor:    {c}");
        }
        if let Some(r) = &applied.reverb {
            eprintln!("  🌊 Reverb:        {r}");
        }
    }
    if let Some(dir) = &waveform_svg {
        eprintln!("  📈 Waveforms:     {}", dir.display());
    }
    Ok(())
}

fn write_svg(view: &WaveformView, path: &std::path::Path) -> anyhow::Result<()> {
    let mut canvas = SvgCanvas::new(800.0, 160.0);
    view.render(&mut canvas);
    fs::write(path, canvas.finish()).with_context(|| format!("writing {}", path.display()))
}

fn parse_seed_gain(arg: &str) -> anyhow::Result<(String, f64)> {
    let (id, gain) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("--band expects ID=GAIN, got `{arg}`"))?;
    let gain = gain
        .trim()
        .parse()
        .with_context(|| format!("bad gain in `{arg}`"))?;
    Ok((id.trim().to_string(), gain))
}

fn parse_band(arg: &str) -> anyhow::Result<BandPatch> {
    let parts: Vec<&str> = arg.split(':').map(str::trim).collect();
    if !(2..=4).contains(&parts.len()) {
        bail!("--eq expects FREQ:GAIN[:Q[:TYPE]], got `{arg}`");
    }
    let num = |s: &str| -> anyhow::Result<f64> {
        s.parse().with_context(|| format!("bad number `{s}` in `{arg}`"))
    };
    Ok(BandPatch {
        freq: Some(num(parts[0])?),
        gain: Some(num(parts[1])?),
        q: parts.get(2).map(|&q| num(q)).transpose()?,
        kind: parts
            .get(3)
            .map(|t| t.parse::<FilterType>())
            .transpose()?,
        ..BandPatch::default()
    })
}

fn parse_floats<const N: usize>(arg: &str, flag: &str) -> anyhow::Result<[f64; N]> {
    let values = arg
        .split(',')
        .map(|s| s.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("{flag} expects {N} comma-separated numbers"))?;
    values
        .try_into()
        .map_err(|v: Vec<f64>| anyhow!("{flag} expects {N} values, got {}", v.len()))
}
