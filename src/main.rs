use log::info;
use power2mqtt::{JsonFrameDecoder, MqttManager, SmlManager};
use std::time::Duration;
use tokio::task::JoinHandle;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize logging
    let default_filter = std::env::var("P2M_LOG_LEVEL").unwrap_or("info".to_string());
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(default_filter));

    // we need a channel for the metering side to hand readings to the handler
    let (mut mqtt, tx) = MqttManager::new()?;

    let mut threads: Vec<JoinHandle<()>> = Vec::new();

    threads.push(tokio::spawn(async move {
        mqtt.start_thread().await;
    }));

    // Start the SML extraction
    let mut sml = SmlManager::new(tx, JsonFrameDecoder);
    threads.push(tokio::spawn(async move {
        sml.start_thread().await;
    }));

    info!("All modules started, now waiting for a signal to exit");
    loop {
        tokio::time::sleep(Duration::from_secs(10)).await;
        let mut kill_all_tasks = false;
        for task in threads.iter() {
            if task.is_finished() {
                kill_all_tasks = true;
            }
        }

        if kill_all_tasks {
            for task in threads.iter_mut() {
                task.abort();
            }
            break;
        }
    }
    Ok(())
}
