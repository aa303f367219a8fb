use crate::config::CONFIG;
use crate::models::PowerReadings;
use lazy_static::lazy_static;
use log::{debug, error, info};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::collections::HashMap;
use std::io::Error;
use std::time::Duration;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::sync::RwLock;

pub struct SubscribeData {
    pub topic: String,
    pub sender: tokio::sync::mpsc::Sender<String>,
}

/// Everything the metering side can hand to the MQTT thread.
pub enum Transmission {
    Readings(PowerReadings),
    Subscribe(SubscribeData),
}

pub struct Callbacks {
    calls: HashMap<String, Vec<tokio::sync::mpsc::Sender<String>>>,
}

impl Callbacks {
    pub fn new() -> Self {
        Callbacks {
            calls: HashMap::new(),
        }
    }

    pub fn insert(&mut self, topic: String, callback: tokio::sync::mpsc::Sender<String>) {
        debug!("Adding callback for topic {topic}");
        self.calls.entry(topic).or_default().push(callback);
    }

    pub async fn send(&self, topic: &str, payload: String) {
        let callbacks = match self.calls.get(topic) {
            Some(callbacks) => callbacks,
            None => {
                debug!("Send for unknown topic {topic}");
                return;
            }
        };

        for callback in callbacks {
            if callback.send(payload.clone()).await.is_err() {
                error!("Callback receiver for {topic} is gone");
            }
        }
    }

    pub fn get_topics(&self) -> Vec<String> {
        self.calls.keys().cloned().collect()
    }
}

lazy_static! {
    pub static ref CALLBACKS: RwLock<Callbacks> = RwLock::new(Callbacks::new());
}

pub struct MqttManager {
    rx: Receiver<Transmission>,
    client: AsyncClient,
    base_topic: String,
}

impl MqttManager {
    pub fn new() -> Result<(Self, Sender<Transmission>), Error> {
        let (mtx, mrx) = tokio::sync::mpsc::channel(100);

        info!("MQTT connection starting up");
        let config = {
            let holder = CONFIG.read().unwrap();
            holder.config.mqtt.clone()
        };

        let mut mqttoptions =
            MqttOptions::new(config.client_name.clone(), config.host.clone(), config.port);
        mqttoptions.set_keep_alive(Duration::from_secs(5));
        mqttoptions.set_credentials(config.user.clone(), config.pass.clone());

        let (client, mut eventloop) = AsyncClient::new(mqttoptions, 10);

        // Separate task for the event loop so subscriptions keep flowing
        let reconnect_c = client.clone();
        tokio::spawn(async move {
            info!("MQTT Eventloop started");
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::Publish(p))) => {
                        let payload = match String::from_utf8(p.payload.to_vec()) {
                            Ok(payload) => payload,
                            Err(_) => {
                                error!("Dropping non UTF-8 payload on {}", p.topic);
                                continue;
                            }
                        };
                        debug!("Received message on {}", p.topic);

                        let callbacks = CALLBACKS.read().await;
                        callbacks.send(&p.topic, payload).await;
                    }
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("Connected, resubscribing everything");

                        let topics = CALLBACKS.read().await.get_topics();
                        for topic in topics {
                            let client_clone = reconnect_c.clone();
                            tokio::spawn(async move {
                                if let Err(e) =
                                    client_clone.subscribe(topic, QoS::AtLeastOnce).await
                                {
                                    error!("Resubscribe failed: {}", e);
                                }
                            });
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("Error in MQTT {:?}, reconnecting ", e);
                    }
                }
            }
        });

        Ok((
            MqttManager {
                client,
                rx: mrx,
                base_topic: config.base_topic,
            },
            mtx,
        ))
    }

    pub async fn start_thread(&mut self) {
        while let Some(transmission) = self.rx.recv().await {
            match transmission {
                Transmission::Readings(readings) => {
                    self.publish_readings(&readings).await;
                }
                Transmission::Subscribe(subscribe_data) => {
                    let topic = format!("{}/{}", self.base_topic, subscribe_data.topic);
                    if self.client.subscribe(topic.clone(), QoS::AtLeastOnce).await.is_ok() {
                        CALLBACKS.write().await.insert(topic.clone(), subscribe_data.sender);
                        info!("Registered Callback {topic}");
                    }
                }
            }
        }

        info!("Transmission channel closed, MQTT thread exits");
    }

    /// Publish each present reading under its fixed suffix, plus the whole
    /// reading set as one JSON document.
    async fn publish_readings(&self, readings: &PowerReadings) {
        for (suffix, payload) in readings.publications() {
            let topic = format!("{}/{}", self.base_topic, suffix);
            info!("{}: {}", topic, payload);
            if let Err(e) = self
                .client
                .publish(topic, QoS::AtLeastOnce, false, payload)
                .await
            {
                error!("Error sending reading: {}", e);
            }
        }

        match serde_json::to_string(readings) {
            Ok(document) => {
                let topic = format!("{}/readings", self.base_topic);
                if let Err(e) = self
                    .client
                    .publish(topic, QoS::AtLeastOnce, false, document)
                    .await
                {
                    error!("Error sending readings document: {}", e);
                }
            }
            Err(e) => {
                error!("Could not serialize readings: {}", e);
            }
        }
    }
}
