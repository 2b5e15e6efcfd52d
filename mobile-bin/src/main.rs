#![deny(unsafe_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use serde_json::{Map, Value};
use structopt::StructOpt;
use tokio::sync::Notify;

use campaign_classic::constants::event_keys::{TRACK_INFO_KEY_DELIVERY_ID, TRACK_INFO_KEY_MESSAGE_ID};
use campaign_classic::{api, CampaignClassicExtension, CampaignClassicPushPayload};
use mobile_core::conf::{Options, Settings};
use mobile_core::event::{Event, EventSource, EventType};
use mobile_core::extension::Extension;
use mobile_core::hub::EventHub;
use mobile_core::logger::{config_logger, logger_init};
use mobile_core::services::{
    ConnectCallback, HttpNetworkService, MemoryDataStore, NetworkRequest, Networking, Services, StaticDeviceInfo,
};

#[derive(StructOpt, Debug)]
#[structopt(name = "campaign-classic")]
struct Cli {
    #[structopt(flatten)]
    opts: Options,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(StructOpt, Debug)]
enum Command {
    /// Register the device push token with the marketing server
    Register {
        token: String,
        #[structopt(long)]
        user_key: Option<String>,
        /// Additional registration parameter, key=value
        #[structopt(long = "param", parse(try_from_str = parse_key_value))]
        params: Vec<(String, String)>,
    },
    /// Report a notification receive to the tracking server
    TrackReceive { message_id: String, delivery_id: String },
    /// Report a notification click to the tracking server
    TrackClick { message_id: String, delivery_id: String },
    /// Interpret a push message data map and report it as received
    Push {
        /// Message data entry, key=value
        #[structopt(long = "data", parse(try_from_str = parse_key_value))]
        data: Vec<(String, String)>,
        /// Report a click after the receive
        #[structopt(long)]
        click: bool,
    },
}

fn parse_key_value(s: &str) -> anyhow::Result<(String, String)> {
    let (k, v) = s.split_once('=').ok_or_else(|| anyhow!("invalid key=value: no `=` found in `{}`", s))?;
    Ok((k.to_owned(), v.to_owned()))
}

/// Counts requests whose callbacks have not run yet.
struct InFlight {
    inner: Arc<dyn Networking>,
    count: Arc<AtomicUsize>,
    done: Arc<Notify>,
}

impl InFlight {
    fn new(inner: Arc<dyn Networking>) -> Self {
        Self { inner, count: Arc::new(AtomicUsize::new(0)), done: Arc::new(Notify::new()) }
    }

    async fn wait_idle(&self, timeout: Duration) {
        let wait = async {
            loop {
                let notified = self.done.notified();
                if self.count.load(Ordering::SeqCst) == 0 {
                    break;
                }
                notified.await;
            }
        };
        if tokio::time::timeout(timeout, wait).await.is_err() {
            log::warn!("{} request(s) still in flight after {:?}", self.count.load(Ordering::SeqCst), timeout);
        }
    }
}

impl Networking for InFlight {
    fn connect_async(&self, request: NetworkRequest, callback: ConnectCallback) {
        self.count.fetch_add(1, Ordering::SeqCst);
        let count = self.count.clone();
        let done = self.done.clone();
        self.inner.connect_async(
            request,
            Box::new(move |conn| {
                callback(conn);
                count.fetch_sub(1, Ordering::SeqCst);
                done.notify_waiters();
            }),
        );
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::from_args();

    //init config
    let settings = Settings::init(cli.opts.clone()).expect("settings init failed");

    //init log
    let (logger, _guard) = config_logger(&settings.log).expect("logger init failed");
    logger_init(logger, settings.log.level.level_filter()).expect("logger init failed");

    let _ = Settings::logs();

    if let Err(e) = run(settings, cli.cmd).await {
        log::error!("{:?}", e);
    }
}

async fn run(settings: &Settings, cmd: Command) -> mobile_core::Result<()> {
    let http = HttpNetworkService::new(&settings.network)?;
    let networking = Arc::new(InFlight::new(Arc::new(http)));

    let store = match settings.datastore.path.as_ref() {
        Some(path) => MemoryDataStore::open(path)?,
        None => MemoryDataStore::new(),
    };

    let services = Services::default()
        .networking(networking.clone())
        .data_storing(Arc::new(store))
        .device_info(Arc::new(StaticDeviceInfo::new(settings.device.clone())));

    let hub = EventHub::new(services);
    let ext = hub.register_extension(|api| Ok(CampaignClassicExtension::new(api)))?;
    log::info!("registered extension {} {}", ext.name(), api::extension_version());

    hub.register_listener(EventType::Campaign, EventSource::ResponseContent, |event: &Event| {
        log::info!("{} {:?}", event.name(), event.data());
    });

    hub.update_configuration(settings.configuration.load()?);

    match cmd {
        Command::Register { token, user_key, params } => {
            let params = if params.is_empty() {
                None
            } else {
                Some(params.into_iter().map(|(k, v)| (k, Value::String(v))).collect::<Map<_, _>>())
            };
            api::register_device(&hub, &token, user_key.as_deref(), params);
        }
        Command::TrackReceive { message_id, delivery_id } => {
            api::track_notification_receive(&hub, &track_info(message_id, delivery_id));
        }
        Command::TrackClick { message_id, delivery_id } => {
            api::track_notification_click(&hub, &track_info(message_id, delivery_id));
        }
        Command::Push { data, click } => {
            let payload = CampaignClassicPushPayload::new(data.into_iter().collect())?;
            log::info!("push message data: {:?}", payload.message_data());
            api::track_notification_receive(&hub, &payload.track_info());
            if click {
                api::track_notification_click(&hub, &payload.track_info());
            }
        }
    }

    let timeout = settings.network.connect_timeout + settings.network.read_timeout;
    networking.wait_idle(timeout).await;
    Ok(())
}

fn track_info(message_id: String, delivery_id: String) -> HashMap<String, String> {
    let mut info = HashMap::new();
    info.insert(TRACK_INFO_KEY_MESSAGE_ID.to_owned(), message_id);
    info.insert(TRACK_INFO_KEY_DELIVERY_ID.to_owned(), delivery_id);
    info
}
