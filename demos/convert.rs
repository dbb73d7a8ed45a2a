//! # Raw I420 to RGB565 conversion
//!
//! Reads raw I420 frames from a file, pushes them through the colorspace
//! element and writes the packed RGB565 frames to another file.
//!
//! ```text
//! [input.yuv] → [dspcolorspace] → [output.rgb]
//! ```
//!
//! Run: `cargo run --example convert -- input.yuv output.rgb --width 320 --height 240`
//!
//! Set `RUST_LOG=dsp_colorspace=debug` to watch negotiation and session setup.

use anyhow::{Context, bail};
use clap::Parser;
use dsp_colorspace::prelude::*;
use std::fs::File;
use std::io::{BufWriter, ErrorKind, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(about = "Convert raw I420 video to RGB565")]
struct Args {
    /// Raw I420 input file.
    input: PathBuf,

    /// Raw RGB565 output file.
    output: PathBuf,

    /// Frame width in pixels.
    #[arg(long)]
    width: u32,

    /// Frame height in pixels.
    #[arg(long)]
    height: u32,

    /// Accelerator engine to open.
    #[arg(long, default_value = dsp_colorspace::accel::DEFAULT_ENGINE_NAME)]
    engine: String,

    /// Output frames in the pool.
    #[arg(long, default_value_t = 2)]
    num_output_bufs: usize,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<u64>,
}

/// Fill `buf` completely, or report a clean end of stream.
fn read_frame(reader: &mut impl Read, buf: &mut [u8]) -> anyhow::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => bail!("truncated frame: {filled} of {} bytes", buf.len()),
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = ColorspaceConfig::default()
        .with_engine_name(args.engine.as_str())
        .with_num_output_bufs(args.num_output_bufs);
    let mut element = DspColorspace::with_config(config);

    let input_caps = VideoCaps::with_format(PixelFormat::I420).with_size(args.width, args.height);
    let output_caps = element.transform_caps(PadDirection::Sink, &input_caps);
    let output_caps = element.fixate_caps(PadDirection::Sink, &input_caps, &output_caps)?;
    element
        .set_caps(&input_caps, &output_caps)
        .context("caps rejected")?;

    let format = *element
        .negotiated_format()
        .context("element did not record a format")?;
    println!("{input_caps} -> {output_caps}");

    let mut reader = File::open(&args.input)
        .with_context(|| format!("opening {}", args.input.display()))?;
    let mut writer = BufWriter::new(
        File::create(&args.output)
            .with_context(|| format!("creating {}", args.output.display()))?,
    );

    let mut input = vec![0u8; format.input_frame_size()];
    let mut frames = 0u64;

    while args.max_frames.is_none_or(|max| frames < max) && read_frame(&mut reader, &mut input)? {
        let output = element
            .process(InputFrame::from(&input))
            .with_context(|| format!("frame {frames}"))?;

        writer.write_all(&output.data()[..output.info().image_size()])?;
        frames += 1;
    }

    writer.flush()?;
    element.stop();

    let stats = element.stats();
    println!(
        "converted {} frames ({} staged, {} dropped) into {}",
        stats.frames_converted,
        stats.staged_inputs,
        stats.dropped_frames,
        args.output.display()
    );

    Ok(())
}
