//! Binary entry point — Windows bootstrap and shutdown ordering.

#[cfg(target_os = "windows")]
fn main() {
    use std::sync::Arc;

    use screen_veil::capture::{FrameSource, PrimaryDisplaySource};
    use screen_veil::config::Settings;
    use screen_veil::hotkey::{self, HotkeyChannel, HOTKEY_LABEL};
    use screen_veil::llm::{AnalysisClient, Analyzer};
    use screen_veil::orchestrator::{CaptureOrchestrator, IDLE_MESSAGE};
    use screen_veil::overlay::{ForegroundPoller, Overlay};
    use screen_veil::platform::windows::{warning_box, UiThread, Win32ForegroundInspector};

    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("[MAIN] screen-veil starting");

    let settings = Settings::from_env();
    let (toggle_tx, mut toggle_rx) = hotkey::toggle_channel();

    let ui = match UiThread::spawn(toggle_tx, IDLE_MESSAGE) {
        Ok(ui) => ui,
        Err(e) => {
            log::error!("[MAIN] {}", e);
            std::process::exit(1);
        }
    };

    let mut hotkey_channel = HotkeyChannel::register(Box::new(ui.hotkey_backend()));
    if !hotkey_channel.is_registered() {
        warning_box(
            "Hotkey Registration Error",
            &format!(
                "Failed to register {}. The application keeps running, \
                 but the hotkey will not work.",
                HOTKEY_LABEL
            ),
        );
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("[MAIN] tokio runtime failed to start: {}", e);
            std::process::exit(1);
        }
    };

    let overlay = Arc::new(Overlay::new(ui.overlay_backend()));

    runtime.block_on(async {
        let frames: Arc<dyn FrameSource> = Arc::new(PrimaryDisplaySource);
        let analyzer: Arc<dyn Analyzer> = Arc::new(AnalysisClient::new(&settings));
        let orchestrator = CaptureOrchestrator::new(Arc::clone(&overlay), frames, analyzer);

        let poller =
            ForegroundPoller::spawn(Arc::new(Win32ForegroundInspector), Arc::clone(&overlay));

        let pump = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move {
                while toggle_rx.recv().await.is_some() {
                    orchestrator.toggle();
                }
            })
        };

        log::info!("[MAIN] ready — press {} to analyze the screen", HOTKEY_LABEL);
        tokio::signal::ctrl_c().await.ok();
        log::info!("[MAIN] shutting down");

        // Shutdown order: poller first (bounded wait), then the toggle
        // pump so no new cycles start.
        poller.shutdown().await;
        pump.abort();
    });

    // Hotkey release posts to the still-running message loop, so it must
    // precede the quit request. The runtime (and with it the HTTP client)
    // drops before the window goes away.
    hotkey_channel.release();
    drop(runtime);
    ui.request_quit();
    ui.join();
    log::info!("[MAIN] stopped");
}

#[cfg(not(target_os = "windows"))]
fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();
    eprintln!(
        "screen-veil runs on Windows only: per-window capture exclusion \
         (SetWindowDisplayAffinity) is a Win32 primitive."
    );
    std::process::exit(1);
}
