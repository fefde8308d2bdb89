//! Play the core through cpal, with the audio callback standing in for the
//! DMA peripheral and a background thread standing in for the control path.
//!
//! Run with: cargo run --example cpal_demo

use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use monovox::engine::context::{AudioContext, SynthContext};
use monovox::engine::scheduler::{BufferId, DmaEvent, BUFFER_SAMPLES};
use monovox::synth::params::Params;
use monovox::CHANNELS;

/// Replays the ping-pong buffers in transmit order (B then A), raising the
/// matching completion event each time a buffer drains, exactly as the
/// hardware transfer would.
struct Playback {
    audio: AudioContext,
    current: BufferId,
    pos: usize,
}

impl Playback {
    fn new(mut audio: AudioContext) -> Self {
        audio.prefill();
        Self {
            audio,
            current: BufferId::B,
            pos: 0,
        }
    }

    fn next_sample(&mut self) -> f32 {
        if self.pos >= BUFFER_SAMPLES {
            match self.current {
                BufferId::B => {
                    self.audio.on_dma_event(DmaEvent::HalfComplete);
                    self.current = BufferId::A;
                }
                BufferId::A => {
                    self.audio.on_dma_event(DmaEvent::FullComplete);
                    self.current = BufferId::B;
                }
            }
            self.pos = 0;
        }

        let sample = self.audio.buffer(self.current)[self.pos];
        self.pos += CHANNELS; // mono signal, take the left of each frame
        sample as f32 / i16::MAX as f32
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow!("no output device"))?;
    let config = device.default_output_config()?;
    let sample_rate = config.sample_rate().0 as f32;
    let device_channels = config.channels() as usize;

    let (audio, mut control) = SynthContext::new(sample_rate, Params::default());
    let mut playback = Playback::new(audio);

    let stream = device.build_output_stream(
        &config.into(),
        move |data: &mut [f32], _| {
            for frame in data.chunks_mut(device_channels) {
                let sample = playback.next_sample();
                for channel in frame.iter_mut() {
                    *channel = sample;
                }
            }
        },
        |err| eprintln!("stream error: {err}"),
        None,
    )?;
    stream.play()?;

    // Toy control path: open the filter over time and walk a little phrase.
    let phrase = [220.0, 277.18, 329.63, 440.0, 329.63, 277.18];
    for (i, freq) in phrase.iter().cycle().take(12).enumerate() {
        let mut params = control.current_params();
        params.waveform = monovox::dsp::Waveform::Saw;
        params.cutoff_hz = 400.0 + 600.0 * i as f32;
        params.resonance = 0.6;
        control.publish(params);

        control.note_on(*freq);
        thread::sleep(Duration::from_millis(350));
        control.note_off();
        thread::sleep(Duration::from_millis(150));
    }

    control.all_off();
    thread::sleep(Duration::from_millis(400));
    println!("underruns observed: {}", control.underrun_count());
    Ok(())
}
