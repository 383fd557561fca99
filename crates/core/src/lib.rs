pub mod config;
pub mod identifier;
pub mod metrics;
pub mod searcher;
pub mod session;
pub mod source;
pub mod testing;
pub mod titles;

pub use config::{
    load_config, load_config_from_str, validate_config, AnilistConfig, Config, ConfigError,
    ServerConfig, SessionMessages, TraceMoeConfig,
};
pub use identifier::{distinct_ids, normalize, AnimeId, CanonicalId};
pub use searcher::{
    format_timestamp, ImageUpload, ReverseImageSearch, SearchError, SearchMatch, TraceMoeClient,
    TraceMoeResponse,
};
pub use session::{
    SearchOrchestrator, SearchSession, SearchTrigger, SessionError, SessionId, SessionPhase,
    SessionUpdateCallback, TriggerSummary,
};
pub use source::{FileImageSource, ImageSource, UnreadableInputError, UploadedImage};
pub use titles::{
    placeholder_title, AnilistClient, MediaTitle, TitleFetchError, TitleFetcher, TitleResolver,
};
