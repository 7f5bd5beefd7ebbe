use std::sync::Arc;

use tracing::debug;

use crate::adapters::{FfmpegTranscoder, ToolProber, YtDlpFetcher};
use crate::app::confirm::ConfirmationBroker;
use crate::app::orchestrator::Orchestrator;
use crate::config::AppConfig;
use crate::ports::{ConfirmationPort, FetchPort, ProbePort, TranscodePort};

pub trait AppContainer: Send + Sync {
    fn orchestrator(&self) -> Arc<Orchestrator>;
    fn broker(&self) -> Arc<ConfirmationBroker>;
    fn prober(&self) -> Arc<dyn ProbePort>;
}

pub struct DefaultAppContainer {
    fetcher: Arc<YtDlpFetcher>,
    prober: Arc<ToolProber>,
    broker: Arc<ConfirmationBroker>,
    orchestrator: Arc<Orchestrator>,
}

impl DefaultAppContainer {
    pub fn new(config: &AppConfig) -> Self {
        let tools = &config.tools;
        let fetcher = Arc::new(YtDlpFetcher::new(
            tools.ytdlp.clone(),
            Some(tools.ffmpeg.clone()).filter(|p| p.components().count() > 1),
        ));
        let prober = Arc::new(ToolProber::new(tools.ffprobe.clone(), tools.ytdlp.clone()));
        let transcoder = Arc::new(FfmpegTranscoder::new(tools.ffmpeg.clone()));
        let broker = Arc::new(ConfirmationBroker::new());

        let orchestrator = Arc::new(Orchestrator::new(
            config.orchestrator_settings(),
            Arc::clone(&fetcher) as Arc<dyn FetchPort>,
            Arc::clone(&prober) as Arc<dyn ProbePort>,
            transcoder as Arc<dyn TranscodePort>,
            Arc::clone(&broker) as Arc<dyn ConfirmationPort>,
        ));
        debug!(ytdlp = %tools.ytdlp.display(), ffmpeg = %tools.ffmpeg.display(), "Wired adapters");

        Self {
            fetcher,
            prober,
            broker,
            orchestrator,
        }
    }

    /// Concrete fetcher, for title lookup before a run
    pub fn fetcher(&self) -> Arc<YtDlpFetcher> {
        Arc::clone(&self.fetcher)
    }
}

impl AppContainer for DefaultAppContainer {
    fn orchestrator(&self) -> Arc<Orchestrator> {
        Arc::clone(&self.orchestrator)
    }

    fn broker(&self) -> Arc<ConfirmationBroker> {
        Arc::clone(&self.broker)
    }

    fn prober(&self) -> Arc<dyn ProbePort> {
        Arc::clone(&self.prober) as Arc<dyn ProbePort>
    }
}
