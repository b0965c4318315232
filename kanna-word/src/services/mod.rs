//! Services behind the command dispatcher

pub mod background;
pub mod speech;
pub mod word_lookup;
pub mod youdao_client;

pub use background::BackgroundTasks;
pub use speech::{SpeechError, SpeechService};
pub use word_lookup::LookupService;
pub use youdao_client::{ProviderError, TranslationProvider, YoudaoClient};
