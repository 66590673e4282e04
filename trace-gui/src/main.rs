//! # Tonic Tracer GUI
//!
//! The desktop front end for the tonic-relative pitch tracer. It owns the
//! windowing loop and user settings; all pitch analysis and music theory
//! lives in `trace-core`.
//!
//! ## Architecture
//! - **Main Thread**: Iced GUI application with dark theme
//! - **Audio Thread**: Dedicated thread for microphone capture
//! - **Communication**: Crossbeam channels for thread-safe block exchange
//! - **Updates**: 60 FPS continuous updates via subscription system

mod ui;

use crossbeam_channel::{Receiver, Sender};
use iced::{self, Element, Subscription, Theme};
use serde::{Deserialize, Serialize};
use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};
use trace_core::drone::{self, Drone};
use trace_core::{
    EnharmonicPreference, PlotConfig, RangeAdjustment, SampleBlock, Tonic, TraceEngine, audio,
};
use ui::main_display::create_main_view;

/// Where user settings persist between sessions.
const SETTINGS_PATH: &str = "tonictrace_settings.json";

/// Main entry point for the Tonic Tracer application.
pub fn main() -> iced::Result {
    eprintln!("[MAIN] Starting Tonic Tracer...");
    let result = iced::application("Tonic Tracer", TracerApp::update, TracerApp::view)
        .subscription(TracerApp::subscription)
        .theme(TracerApp::theme)
        // Route window close through Message::Exit so the audio worker and
        // drone shut down before the process does.
        .window(iced::window::Settings {
            exit_on_close_request: false,
            ..Default::default()
        })
        .run();
    eprintln!("[MAIN] Application finished with result: {:?}", result);
    result
}

/// Application message types for the Iced GUI framework.
#[derive(Debug, Clone)]
pub enum Message {
    // Theory controls
    TonicSelected(Tonic),
    DegreeLabelsToggled(bool),    // scale degrees vs note names
    AccidentalsToggled(bool),     // label out-of-scale notes
    PreferenceSelected(EnharmonicPreference),

    // Drone controls
    DroneToggled(bool),
    DroneOctaveSelected(u8),
    DroneVolumeChanged(f32),

    // Plot controls
    RangeAdjusted(RangeAdjustment),
    ClearTrace,

    // Settings persistence
    SaveSettings,
    LoadSettings,

    // Continuous update and shutdown
    Tick,
    Exit,
}

/// The user-adjustable state that survives a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Settings {
    /// Tonic display name, e.g. "G♭"; resolved through `Tonic::from_name`.
    tonic: String,
    use_scale_degrees: bool,
    show_accidentals: bool,
    enharmonic_preference: EnharmonicPreference,
    drone_octave: u8,
    drone_volume: f32,
}

/// Audio worker thread management structure.
#[derive(Debug)]
struct AudioWorker {
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<()>>,
}

/// Main application state for the Tonic Tracer.
struct TracerApp {
    engine: TraceEngine,
    audio_worker: Option<AudioWorker>,
    block_receiver: Option<Receiver<SampleBlock>>,
    audio_active: bool,

    drone: Option<Drone>,
    drone_octave: u8,
    drone_volume: f32,
}

impl Default for TracerApp {
    fn default() -> Self {
        eprintln!("[MAIN] Creating TracerApp...");
        let engine = match TraceEngine::new(PlotConfig::default()) {
            Ok(engine) => engine,
            Err(e) => {
                // Unreachable with the compiled-in default, but keep the
                // startup path panic-free.
                eprintln!("[MAIN] Invalid default configuration: {}", e);
                std::process::exit(1);
            }
        };

        let mut app = Self {
            engine,
            audio_worker: None,
            block_receiver: None,
            audio_active: false,
            drone: None,
            drone_octave: drone::DEFAULT_OCTAVE,
            drone_volume: drone::DEFAULT_VOLUME,
        };

        if let Err(e) = app.apply_settings_from_disk() {
            eprintln!("[MAIN] No saved settings applied: {}", e);
        }

        eprintln!("[MAIN] Starting audio capture thread...");
        app.start_audio_capture();
        app
    }
}

impl TracerApp {
    /// Spawns the dedicated capture thread. Raw sample blocks arrive over an
    /// internal channel, get stamped with the stream's sample rate, and are
    /// forwarded to the GUI thread for per-tick processing.
    fn start_audio_capture(&mut self) {
        let (block_tx, block_rx) = crossbeam_channel::bounded::<SampleBlock>(8);
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);

        let thread_handle = thread::spawn(move || {
            eprintln!("[AUDIO-THREAD] Starting audio thread...");
            let (raw_tx, raw_rx) = crossbeam_channel::unbounded::<Vec<f32>>();

            let (stream, sample_rate) = match audio::start_capture(raw_tx) {
                Ok(tuple) => tuple,
                Err(e) => {
                    eprintln!("[AUDIO-THREAD] Fatal error starting capture: {}", e);
                    return;
                }
            };

            eprintln!("[AUDIO-THREAD] Capture running at {} Hz", sample_rate);
            loop {
                crossbeam_channel::select! {
                    recv(raw_rx) -> msg => match msg {
                        Ok(samples) => {
                            let block = SampleBlock::new(samples, sample_rate);
                            // Drop blocks when the GUI is behind.
                            let _ = block_tx.try_send(block);
                        }
                        Err(_) => {
                            eprintln!("[AUDIO-THREAD] Capture channel closed");
                            break;
                        }
                    },
                    recv(shutdown_rx) -> _ => {
                        eprintln!("[AUDIO-THREAD] Received shutdown signal");
                        break;
                    },
                }
            }

            eprintln!("[AUDIO-THREAD] Stopping stream and exiting...");
            drop(stream);
        });

        self.audio_worker = Some(AudioWorker {
            shutdown_tx,
            thread_handle: Some(thread_handle),
        });
        self.block_receiver = Some(block_rx);
        self.audio_active = true;
    }

    fn update(&mut self, message: Message) {
        match message {
            Message::TonicSelected(tonic) => {
                self.engine.set_tonic(tonic);
                if let Some(drone) = &self.drone {
                    drone.set_frequency(drone::tonic_frequency(tonic, self.drone_octave));
                }
            }
            Message::DegreeLabelsToggled(enabled) => {
                self.engine.theory.use_scale_degrees = enabled;
            }
            Message::AccidentalsToggled(enabled) => {
                self.engine.theory.show_accidentals = enabled;
            }
            Message::PreferenceSelected(preference) => {
                self.engine.theory.enharmonic_preference = preference;
            }
            Message::DroneToggled(enabled) => {
                if enabled {
                    let frequency =
                        drone::tonic_frequency(self.engine.theory.tonic(), self.drone_octave);
                    match Drone::start(frequency, self.drone_volume) {
                        Ok(drone) => self.drone = Some(drone),
                        Err(e) => eprintln!("[MAIN] Could not start drone: {}", e),
                    }
                } else {
                    self.drone = None;
                }
            }
            Message::DroneOctaveSelected(octave) => {
                self.drone_octave = octave;
                if let Some(drone) = &self.drone {
                    drone.set_frequency(drone::tonic_frequency(
                        self.engine.theory.tonic(),
                        octave,
                    ));
                }
            }
            Message::DroneVolumeChanged(volume) => {
                self.drone_volume = volume;
                if let Some(drone) = &self.drone {
                    drone.set_gain(volume);
                }
            }
            Message::RangeAdjusted(adjustment) => {
                self.engine.adjust_range(adjustment);
            }
            Message::ClearTrace => {
                self.engine.reset();
            }
            Message::SaveSettings => match self.save_settings() {
                Ok(_) => eprintln!("[MAIN] Settings saved."),
                Err(e) => eprintln!("[MAIN] Error saving settings: {}", e),
            },
            Message::LoadSettings => match self.apply_settings_from_disk() {
                Ok(_) => eprintln!("[MAIN] Settings loaded."),
                Err(e) => eprintln!("[MAIN] Error loading settings: {}", e),
            },
            Message::Tick => {
                let now = now_ms();
                // Collect first so the receiver borrow ends before processing.
                let blocks: Vec<SampleBlock> = match &self.block_receiver {
                    Some(receiver) => receiver.try_iter().collect(),
                    None => Vec::new(),
                };
                for block in blocks {
                    self.engine.process_block(&block, now);
                }
                self.engine.tick(now);
            }
            Message::Exit => {
                eprintln!("[MAIN] Window close requested - starting cleanup...");
                self.drone = None;
                if let Some(mut worker) = self.audio_worker.take() {
                    let _ = worker.shutdown_tx.send(());
                    if let Some(handle) = worker.thread_handle.take() {
                        let _ = handle.join();
                    }
                }
                self.block_receiver = None;
                self.audio_active = false;
                eprintln!("[MAIN] Cleanup completed");
                std::process::exit(0);
            }
        }
    }

    fn view(&self) -> Element<'_, Message> {
        let frame = self
            .engine
            .render_frame(now_ms(), ui::plot::PLOT_WIDTH, ui::plot::PLOT_HEIGHT);
        create_main_view(
            frame,
            &self.engine.theory,
            self.audio_active,
            self.drone.is_some(),
            self.drone_octave,
            self.drone_volume,
        )
    }

    /// 60 FPS timer driving block processing, eviction and redraws, plus the
    /// close-request listener backing the cleanup path.
    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            iced::time::every(std::time::Duration::from_millis(16)).map(|_| Message::Tick),
            iced::window::close_requests().map(|_| Message::Exit),
        ])
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }

    fn save_settings(&self) -> anyhow::Result<()> {
        let settings = Settings {
            tonic: self.engine.theory.tonic().name().to_string(),
            use_scale_degrees: self.engine.theory.use_scale_degrees,
            show_accidentals: self.engine.theory.show_accidentals,
            enharmonic_preference: self.engine.theory.enharmonic_preference,
            drone_octave: self.drone_octave,
            drone_volume: self.drone_volume,
        };
        let json = serde_json::to_string_pretty(&settings)?;
        std::fs::write(SETTINGS_PATH, json)?;
        Ok(())
    }

    fn apply_settings_from_disk(&mut self) -> anyhow::Result<()> {
        let data = std::fs::read_to_string(SETTINGS_PATH)?;
        let settings: Settings = serde_json::from_str(&data)?;

        if let Some(tonic) = Tonic::from_name(&settings.tonic) {
            self.engine.set_tonic(tonic);
        } else {
            eprintln!("[MAIN] Ignoring unknown tonic {:?}", settings.tonic);
        }
        self.engine.theory.use_scale_degrees = settings.use_scale_degrees;
        self.engine.theory.show_accidentals = settings.show_accidentals;
        self.engine.theory.enharmonic_preference = settings.enharmonic_preference;
        self.drone_octave = settings
            .drone_octave
            .clamp(drone::MIN_OCTAVE, drone::MAX_OCTAVE);
        self.drone_volume = settings.drone_volume.clamp(0.0, 1.0);

        if let Some(drone) = &self.drone {
            drone.set_frequency(drone::tonic_frequency(
                self.engine.theory.tonic(),
                self.drone_octave,
            ));
            drone.set_gain(self.drone_volume);
        }
        Ok(())
    }
}

/// Milliseconds since the Unix epoch, the timestamp domain the engine uses.
fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as i64)
}
