pub mod dispatch;
pub mod error;
pub mod events;
pub mod host;
pub mod key;
pub mod memory;
pub mod prefix;
pub mod rules;
pub mod scene_index;

pub use dispatch::{Editor, KeyOutcome, PendingDecision};
pub use error::{HostError, UnknownKey};
pub use host::{ChangeEvent, Command, DocumentHost, Origin, Transaction, TxMeta};
pub use key::Key;
pub use memory::MemoryHost;
pub use prefix::{PrefixRule, PrefixRules, Reclassified};
pub use rules::{Decision, Rule, TransitionTable};
pub use scene_index::{SceneEntry, SceneIndex};
